use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use super::*;

impl Context {
    /// DecryptRTCP authenticates and decrypts an SRTCP packet. The index is
    /// read from the packet trailer; the replay window is only advanced once
    /// the tag has verified.
    pub fn decrypt_rtcp(&mut self, encrypted: &Bytes) -> Result<Bytes> {
        let header_len = rtcp::header::HEADER_LENGTH + rtcp::header::SSRC_LENGTH;
        if encrypted.len() < header_len + SRTCP_INDEX_SIZE {
            return Err(Error::SrtcpTooSmall(
                encrypted.len(),
                header_len + SRTCP_INDEX_SIZE,
            ));
        }

        let index = self.cipher.get_rtcp_index(encrypted)?;
        let ssrc = BigEndian::read_u32(&encrypted[rtcp::header::HEADER_LENGTH..header_len]);

        let dst = self.cipher.decrypt_rtcp(encrypted, index, ssrc)?;

        let state = self.get_srtcp_ssrc_state(ssrc);
        if !state.replay_detector.check(index as u64) {
            return Err(Error::DuplicatedPacket(ssrc, index as u64));
        }

        Ok(dst)
    }

    /// EncryptRTCP protects an RTCP packet. Each outbound packet consumes
    /// the stream's current SRTCP index; the index then advances, wrapping
    /// within its 31 bits.
    pub fn encrypt_rtcp(&mut self, decrypted: &Bytes) -> Result<Bytes> {
        let header_len = rtcp::header::HEADER_LENGTH + rtcp::header::SSRC_LENGTH;
        if decrypted.len() < header_len {
            return Err(Error::SrtcpTooSmall(decrypted.len(), header_len));
        }

        let ssrc = BigEndian::read_u32(&decrypted[rtcp::header::HEADER_LENGTH..header_len]);

        let index = {
            let state = self.get_srtcp_ssrc_state(ssrc);
            let index = state.srtcp_index;
            if state.srtcp_index >= MAX_SRTCP_INDEX {
                state.srtcp_index = 0;
            } else {
                state.srtcp_index += 1;
            }
            index
        };

        self.cipher.encrypt_rtcp(decrypted, index, ssrc)
    }
}
