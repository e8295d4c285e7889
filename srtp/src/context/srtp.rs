use bytes::Bytes;

use super::*;

impl Context {
    /// DecryptRTP decrypts an SRTP packet, authenticating before any state
    /// is advanced: a packet that fails the tag check leaves the rollover
    /// counter and replay window untouched, and a replayed packet is dropped
    /// after authentication without being delivered twice.
    pub fn decrypt_rtp(&mut self, encrypted: &Bytes) -> Result<Bytes> {
        let header = rtp::header::Header::unmarshal(encrypted)?;
        self.decrypt_rtp_with_header(encrypted, &header)
    }

    pub fn decrypt_rtp_with_header(
        &mut self,
        encrypted: &Bytes,
        header: &rtp::header::Header,
    ) -> Result<Bytes> {
        let roc = self
            .get_srtp_ssrc_state(header.ssrc)
            .next_rollover_count(header.sequence_number);

        let dst = self.cipher.decrypt_rtp(encrypted, header, roc)?;

        let state = self.get_srtp_ssrc_state(header.ssrc);
        if !state.replay_detector.check(header.sequence_number as u64) {
            return Err(Error::DuplicatedPacket(
                header.ssrc,
                header.sequence_number as u64,
            ));
        }
        state.update_rollover_count(header.sequence_number);

        Ok(dst)
    }

    /// EncryptRTP marshals and encrypts an RTP packet. Outbound packets must
    /// be submitted in sequence order; the rollover-counter update commits
    /// together with the returned ciphertext.
    pub fn encrypt_rtp(&mut self, plaintext: &Bytes) -> Result<Bytes> {
        let header = rtp::header::Header::unmarshal(plaintext)?;
        self.encrypt_rtp_with_header(plaintext, &header)
    }

    pub fn encrypt_rtp_with_header(
        &mut self,
        plaintext: &Bytes,
        header: &rtp::header::Header,
    ) -> Result<Bytes> {
        let roc = self
            .get_srtp_ssrc_state(header.ssrc)
            .next_rollover_count(header.sequence_number);

        let dst =
            self.cipher
                .encrypt_rtp(&plaintext[header.marshal_size()..], header, roc)?;

        self.get_srtp_ssrc_state(header.ssrc)
            .update_rollover_count(header.sequence_number);

        Ok(dst)
    }
}
