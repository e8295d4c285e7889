use aead::generic_array::GenericArray;
use aead::{Aead, NewAead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use byteorder::{BigEndian, ByteOrder};
use bytes::{Bytes, BytesMut};

use super::Cipher;
use crate::context::SRTCP_INDEX_SIZE;
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::protection_profile::ProtectionProfile;

pub(crate) const CIPHER_AEAD_AES_GCM_AUTH_TAG_LEN: usize = 16;
const RTCP_ENCRYPTION_FLAG: u8 = 0x80;
const RTCP_HEADER_LEN: usize = rtcp::header::HEADER_LENGTH + rtcp::header::SSRC_LENGTH;
const NONCE_LEN: usize = 12;

enum AeadKind {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl AeadKind {
    fn new(session_key: &[u8]) -> Result<Self> {
        match session_key.len() {
            16 => Ok(AeadKind::Aes128(Aes128Gcm::new(GenericArray::from_slice(
                session_key,
            )))),
            32 => Ok(AeadKind::Aes256(Aes256Gcm::new(GenericArray::from_slice(
                session_key,
            )))),
            len => Err(Error::SrtpMasterKeyLength(16, len)),
        }
    }

    fn encrypt(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
        match self {
            AeadKind::Aes128(cipher) => cipher.encrypt(GenericArray::from_slice(nonce), payload),
            AeadKind::Aes256(cipher) => cipher.encrypt(GenericArray::from_slice(nonce), payload),
        }
        .map_err(|_| Error::FailedToEncryptPayload)
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        payload: Payload<'_, '_>,
    ) -> std::result::Result<Vec<u8>, aead::Error> {
        match self {
            AeadKind::Aes128(cipher) => cipher.decrypt(GenericArray::from_slice(nonce), payload),
            AeadKind::Aes256(cipher) => cipher.decrypt(GenericArray::from_slice(nonce), payload),
        }
    }
}

/// AEAD protection per RFC 7714: AES-GCM over the payload with the entire
/// header, CSRCs and extension included, as associated data. The 16-byte tag
/// is part of the AEAD output; no separate HMAC runs.
pub(crate) struct CipherAeadAesGcm {
    srtp_cipher: AeadKind,
    srtcp_cipher: AeadKind,
    srtp_session_salt: Vec<u8>,
    srtcp_session_salt: Vec<u8>,
}

impl CipherAeadAesGcm {
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

        // The derived salts feed straight into the 12-byte GCM nonces.
        let srtp_session_salt = aes_cm_key_derivation(
            LABEL_SRTP_SALT,
            master_key,
            master_salt,
            0,
            profile.salt_len(),
        )?;
        let srtcp_session_salt = aes_cm_key_derivation(
            LABEL_SRTCP_SALT,
            master_key,
            master_salt,
            0,
            profile.salt_len(),
        )?;

        Ok(CipherAeadAesGcm {
            srtp_cipher: AeadKind::new(&srtp_session_key)?,
            srtcp_cipher: AeadKind::new(&srtcp_session_key)?,
            srtp_session_salt,
            srtcp_session_salt,
        })
    }

    /// The 12-octet SRTP IV is two octets of zeroes, the SSRC, the rollover
    /// counter, and the sequence number, xored with the session salt.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-8.1
    fn rtp_initialization_vector(&self, header: &rtp::header::Header, roc: u32) -> [u8; NONCE_LEN] {
        let mut iv = [0u8; NONCE_LEN];
        BigEndian::write_u32(&mut iv[2..], header.ssrc);
        BigEndian::write_u32(&mut iv[6..], roc);
        BigEndian::write_u16(&mut iv[10..], header.sequence_number);

        for (i, v) in iv.iter_mut().enumerate() {
            *v ^= self.srtp_session_salt[i];
        }

        iv
    }

    /// The 12-octet SRTCP IV is two octets of zeroes, the SSRC, two octets
    /// of zeroes, and the 31-bit SRTCP index, xored with the session salt.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-9.1
    fn rtcp_initialization_vector(&self, srtcp_index: u32, ssrc: u32) -> [u8; NONCE_LEN] {
        let mut iv = [0u8; NONCE_LEN];
        BigEndian::write_u32(&mut iv[2..], ssrc);
        BigEndian::write_u32(&mut iv[8..], srtcp_index);

        for (i, v) in iv.iter_mut().enumerate() {
            *v ^= self.srtcp_session_salt[i];
        }

        iv
    }

    /// SRTCP associated data: the eight-byte header followed by the ESRTCP
    /// word, the SRTCP index with the encryption flag set.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-17
    fn rtcp_additional_authenticated_data(
        &self,
        rtcp_packet: &[u8],
        srtcp_index: u32,
    ) -> [u8; RTCP_HEADER_LEN + SRTCP_INDEX_SIZE] {
        let mut aad = [0u8; RTCP_HEADER_LEN + SRTCP_INDEX_SIZE];

        aad[..RTCP_HEADER_LEN].copy_from_slice(&rtcp_packet[..RTCP_HEADER_LEN]);
        BigEndian::write_u32(&mut aad[RTCP_HEADER_LEN..], srtcp_index);
        aad[RTCP_HEADER_LEN] |= RTCP_ENCRYPTION_FLAG;

        aad
    }
}

impl Cipher for CipherAeadAesGcm {
    fn rtp_auth_tag_len(&self) -> usize {
        CIPHER_AEAD_AES_GCM_AUTH_TAG_LEN
    }

    fn rtcp_auth_tag_len(&self) -> usize {
        CIPHER_AEAD_AES_GCM_AUTH_TAG_LEN
    }

    fn first_rtcp_index(&self) -> u32 {
        // The AEAD transform counts SRTCP packets from zero.
        0
    }

    fn get_rtcp_index(&self, input: &[u8]) -> Result<u32> {
        let min_len = RTCP_HEADER_LEN + self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE;
        if input.len() < min_len {
            return Err(Error::SrtcpTooSmall(input.len(), min_len));
        }

        let pos = input.len() - SRTCP_INDEX_SIZE;
        Ok(BigEndian::read_u32(&input[pos..]) & !((RTCP_ENCRYPTION_FLAG as u32) << 24))
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

        // The serialised header, extension block included, doubles as the
        // associated data; any divergence from the receiver's view makes
        // every packet fail authentication.
        writer.extend(header.marshal()?);

        let nonce = self.rtp_initialization_vector(header, roc);
        let encrypted = self.srtp_cipher.encrypt(
            &nonce,
            Payload {
                msg: payload,
                aad: &writer,
            },
        )?;

        writer.extend(encrypted);
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

        let nonce = self.rtp_initialization_vector(header, roc);
        let decrypted = self
            .srtp_cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: &encrypted[payload_offset..],
                    aad: &encrypted[..payload_offset],
                },
            )
            .map_err(|_| Error::RtpFailedToVerifyAuthTag)?;

        let mut writer = BytesMut::with_capacity(payload_offset + decrypted.len());
        writer.extend_from_slice(&encrypted[..payload_offset]);
        writer.extend(decrypted);

        Ok(writer.freeze())
    }

    fn encrypt_rtcp(&mut self, decrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes> {
        if decrypted.len() < RTCP_HEADER_LEN {
            return Err(Error::SrtcpTooSmall(decrypted.len(), RTCP_HEADER_LEN));
        }

        let nonce = self.rtcp_initialization_vector(srtcp_index, ssrc);
        let aad = self.rtcp_additional_authenticated_data(decrypted, srtcp_index);

        let encrypted = self.srtcp_cipher.encrypt(
            &nonce,
            Payload {
                msg: &decrypted[RTCP_HEADER_LEN..],
                aad: &aad,
            },
        )?;

        let mut writer =
            BytesMut::with_capacity(RTCP_HEADER_LEN + encrypted.len() + SRTCP_INDEX_SIZE);
        writer.extend_from_slice(&decrypted[..RTCP_HEADER_LEN]);
        writer.extend(encrypted);
        // The ESRTCP word rides in the clear after the tag.
        writer.extend_from_slice(&aad[RTCP_HEADER_LEN..]);

        Ok(writer.freeze())
    }

    fn decrypt_rtcp(&mut self, encrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes> {
        let min_len = RTCP_HEADER_LEN + self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE;
        if encrypted.len() < min_len {
            return Err(Error::SrtcpTooSmall(encrypted.len(), min_len));
        }

        let nonce = self.rtcp_initialization_vector(srtcp_index, ssrc);
        let aad = self.rtcp_additional_authenticated_data(encrypted, srtcp_index);

        let decrypted = self
            .srtcp_cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: &encrypted[RTCP_HEADER_LEN..encrypted.len() - SRTCP_INDEX_SIZE],
                    aad: &aad,
                },
            )
            .map_err(|_| Error::RtcpFailedToVerifyAuthTag)?;

        let mut writer = BytesMut::with_capacity(RTCP_HEADER_LEN + decrypted.len());
        writer.extend_from_slice(&encrypted[..RTCP_HEADER_LEN]);
        writer.extend(decrypted);

        Ok(writer.freeze())
    }
}
