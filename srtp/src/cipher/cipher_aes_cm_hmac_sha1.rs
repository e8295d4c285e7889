use aes::cipher::generic_array::GenericArray;
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use ctr::cipher::{NewCipher, StreamCipher};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use super::Cipher;
use crate::context::SRTCP_INDEX_SIZE;
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::protection_profile::ProtectionProfile;

type HmacSha1 = Hmac<Sha1>;
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// AES-128 counter mode with a truncated HMAC-SHA1 tag, RFC 3711's
/// pre-defined transform pair. The SRTP tag is 10 bytes (4 under the _32
/// profile); the SRTCP tag is always 10.
pub(crate) struct CipherAesCmHmacSha1 {
    profile: ProtectionProfile,

    srtp_session_key: Vec<u8>,
    srtp_session_salt: Vec<u8>,
    srtp_session_auth: HmacSha1,

    srtcp_session_key: Vec<u8>,
    srtcp_session_salt: Vec<u8>,
    srtcp_session_auth: HmacSha1,
}

impl CipherAesCmHmacSha1 {
    pub(crate) fn new(
        profile: ProtectionProfile,
        master_key: &[u8],
        master_salt: &[u8],
    ) -> Result<Self> {
        let srtp_session_key = aes_cm_key_derivation(
            LABEL_SRTP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;
        let srtcp_session_key = aes_cm_key_derivation(
            LABEL_SRTCP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;

        let srtp_session_salt = aes_cm_key_derivation(
            LABEL_SRTP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;
        let srtcp_session_salt = aes_cm_key_derivation(
            LABEL_SRTCP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;

        let auth_key_len = profile.auth_key_len();
        let srtp_session_auth_tag = aes_cm_key_derivation(
            LABEL_SRTP_AUTHENTICATION_TAG,
            master_key,
            master_salt,
            0,
            auth_key_len,
        )?;
        let srtcp_session_auth_tag = aes_cm_key_derivation(
            LABEL_SRTCP_AUTHENTICATION_TAG,
            master_key,
            master_salt,
            0,
            auth_key_len,
        )?;

        let srtp_session_auth = HmacSha1::new_from_slice(&srtp_session_auth_tag)
            .map_err(|e| Error::Other(e.to_string()))?;
        let srtcp_session_auth = HmacSha1::new_from_slice(&srtcp_session_auth_tag)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(CipherAesCmHmacSha1 {
            profile,
            srtp_session_key,
            srtp_session_salt,
            srtp_session_auth,
            srtcp_session_key,
            srtcp_session_salt,
            srtcp_session_auth,
        })
    }

    /// https://tools.ietf.org/html/rfc3711#section-4.2
    ///
    /// For SRTP the authenticated portion is the whole packet before the tag
    /// concatenated with the rollover counter, M = Authenticated Portion ||
    /// ROC. The HMAC output is truncated to the tag length.
    fn generate_srtp_auth_tag(&mut self, buf: &[u8], roc: u32) -> Vec<u8> {
        self.srtp_session_auth.reset();
        self.srtp_session_auth.update(buf);

        let mut roc_buf = [0u8; 4];
        BigEndian::write_u32(&mut roc_buf, roc);
        self.srtp_session_auth.update(&roc_buf);

        let result = self.srtp_session_auth.clone().finalize();
        let code_bytes = result.into_bytes();

        code_bytes[0..self.rtp_auth_tag_len()].to_vec()
    }

    /// For SRTCP the authenticated portion already contains the index word,
    /// so the HMAC covers the buffer as-is.
    fn generate_srtcp_auth_tag(&mut self, buf: &[u8]) -> Vec<u8> {
        self.srtcp_session_auth.reset();
        self.srtcp_session_auth.update(buf);

        let result = self.srtcp_session_auth.clone().finalize();
        let code_bytes = result.into_bytes();

        code_bytes[0..self.rtcp_auth_tag_len()].to_vec()
    }
}

impl Cipher for CipherAesCmHmacSha1 {
    fn rtp_auth_tag_len(&self) -> usize {
        self.profile.rtp_auth_tag_len()
    }

    fn rtcp_auth_tag_len(&self) -> usize {
        self.profile.rtcp_auth_tag_len()
    }

    fn first_rtcp_index(&self) -> u32 {
        // This transform counts SRTCP packets from one.
        1
    }

    fn get_rtcp_index(&self, input: &[u8]) -> Result<u32> {
        let min_len = rtcp::header::HEADER_LENGTH
            + rtcp::header::SSRC_LENGTH
            + SRTCP_INDEX_SIZE
            + self.rtcp_auth_tag_len();
        if input.len() < min_len {
            return Err(Error::SrtcpTooSmall(input.len(), min_len));
        }

        let tail_offset = input.len() - (self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE);
        Ok(BigEndian::read_u32(&input[tail_offset..tail_offset + SRTCP_INDEX_SIZE]) & 0x7FFF_FFFF)
    }

    fn encrypt_rtp(
        &mut self,
        payload: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let mut writer = BytesMut::with_capacity(
            header.marshal_size() + payload.len() + self.rtp_auth_tag_len(),
        );

        // Copy the header unencrypted, then the payload.
        writer.extend(header.marshal()?);
        writer.extend_from_slice(payload);

        // Encrypt the payload in place.
        let counter = generate_counter(
            header.sequence_number,
            roc,
            header.ssrc,
            &self.srtp_session_salt,
        );
        let key = GenericArray::from_slice(&self.srtp_session_key);
        let nonce = GenericArray::from_slice(&counter);
        let mut stream = Aes128Ctr::new(key, nonce);
        let payload_offset = header.marshal_size();
        stream.apply_keystream(&mut writer[payload_offset..]);

        // Generate and attach the auth tag.
        let auth_tag = self.generate_srtp_auth_tag(&writer, roc);
        writer.extend(auth_tag);

        Ok(writer.freeze())
    }

    fn decrypt_rtp(
        &mut self,
        encrypted: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let payload_offset = header.marshal_size();
        if encrypted.len() < payload_offset + self.rtp_auth_tag_len() {
            return Err(Error::SrtpTooSmall(
                encrypted.len(),
                payload_offset + self.rtp_auth_tag_len(),
            ));
        }

        // Split the auth tag and the cipher text into two parts.
        let actual_tag = &encrypted[encrypted.len() - self.rtp_auth_tag_len()..];
        let cipher_text = &encrypted[..encrypted.len() - self.rtp_auth_tag_len()];

        // Generate the auth tag we expect to see from the ciphertext, and
        // compare in constant time to prevent timing attacks.
        let expected_tag = self.generate_srtp_auth_tag(cipher_text, roc);
        if actual_tag.ct_eq(&expected_tag).unwrap_u8() != 1 {
            return Err(Error::RtpFailedToVerifyAuthTag);
        }

        // Decrypt the payload.
        let mut writer = BytesMut::with_capacity(cipher_text.len());
        writer.extend_from_slice(cipher_text);

        let counter = generate_counter(
            header.sequence_number,
            roc,
            header.ssrc,
            &self.srtp_session_salt,
        );
        let key = GenericArray::from_slice(&self.srtp_session_key);
        let nonce = GenericArray::from_slice(&counter);
        let mut stream = Aes128Ctr::new(key, nonce);
        stream.apply_keystream(&mut writer[payload_offset..]);

        Ok(writer.freeze())
    }

    fn encrypt_rtcp(&mut self, decrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes> {
        let header_len = rtcp::header::HEADER_LENGTH + rtcp::header::SSRC_LENGTH;
        if decrypted.len() < header_len {
            return Err(Error::SrtcpTooSmall(decrypted.len(), header_len));
        }

        let mut writer = BytesMut::with_capacity(
            decrypted.len() + SRTCP_INDEX_SIZE + self.rtcp_auth_tag_len(),
        );
        writer.extend_from_slice(decrypted);

        // Encrypt everything after the eight-byte header.
        let counter = generate_counter(
            (srtcp_index & 0xFFFF) as u16,
            srtcp_index >> 16,
            ssrc,
            &self.srtcp_session_salt,
        );
        let key = GenericArray::from_slice(&self.srtcp_session_key);
        let nonce = GenericArray::from_slice(&counter);
        let mut stream = Aes128Ctr::new(key, nonce);
        stream.apply_keystream(&mut writer[header_len..]);

        // Add the SRTCP index with the E-flag set, then the auth tag over
        // the whole packet.
        writer.put_u32(srtcp_index | (1u32 << 31));

        let auth_tag = self.generate_srtcp_auth_tag(&writer);
        writer.extend(auth_tag);

        Ok(writer.freeze())
    }

    fn decrypt_rtcp(&mut self, encrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes> {
        let header_len = rtcp::header::HEADER_LENGTH + rtcp::header::SSRC_LENGTH;
        let min_len = header_len + SRTCP_INDEX_SIZE + self.rtcp_auth_tag_len();
        if encrypted.len() < min_len {
            return Err(Error::SrtcpTooSmall(encrypted.len(), min_len));
        }

        // Verify the tag before touching anything else; it covers the
        // packet whether or not the payload is encrypted.
        let actual_tag = &encrypted[encrypted.len() - self.rtcp_auth_tag_len()..];
        let cipher_text = &encrypted[..encrypted.len() - self.rtcp_auth_tag_len()];

        let expected_tag = self.generate_srtcp_auth_tag(cipher_text);
        if actual_tag.ct_eq(&expected_tag).unwrap_u8() != 1 {
            return Err(Error::RtcpFailedToVerifyAuthTag);
        }

        let tail_offset = encrypted.len() - (self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE);
        let mut writer = BytesMut::with_capacity(tail_offset);
        writer.extend_from_slice(&encrypted[0..tail_offset]);

        // E-flag clear: the payload was transported unencrypted.
        let is_encrypted = encrypted[tail_offset] >> 7;
        if is_encrypted == 0 {
            return Ok(writer.freeze());
        }

        let counter = generate_counter(
            (srtcp_index & 0xFFFF) as u16,
            srtcp_index >> 16,
            ssrc,
            &self.srtcp_session_salt,
        );
        let key = GenericArray::from_slice(&self.srtcp_session_key);
        let nonce = GenericArray::from_slice(&counter);
        let mut stream = Aes128Ctr::new(key, nonce);
        stream.apply_keystream(&mut writer[header_len..]);

        Ok(writer.freeze())
    }
}
