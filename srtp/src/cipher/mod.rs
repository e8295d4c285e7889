pub(crate) mod cipher_aead_aes_gcm;
pub(crate) mod cipher_aes_cm_hmac_sha1;

use bytes::Bytes;

use crate::error::Result;

/// Cipher is one protection profile's pair of SRTP and SRTCP transforms.
/// Implementations keep their derived session keys and any scratch state;
/// headers pass through in the clear, payloads are protected, and tags and
/// index trailers are attached or verified here.
pub(crate) trait Cipher {
    /// Authentication tag length appended to SRTP packets.
    fn rtp_auth_tag_len(&self) -> usize;

    /// Authentication tag length appended to SRTCP packets.
    fn rtcp_auth_tag_len(&self) -> usize;

    /// Index carried by the first outbound SRTCP packet of a stream.
    fn first_rtcp_index(&self) -> u32;

    /// Extracts the SRTCP index (E-flag masked off) from a protected packet.
    fn get_rtcp_index(&self, input: &[u8]) -> Result<u32>;

    /// Protects an RTP payload, returning the full packet bytes.
    fn encrypt_rtp(
        &mut self,
        payload: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes>;

    /// Verifies and decrypts a full SRTP packet, returning the RTP bytes.
    fn decrypt_rtp(
        &mut self,
        encrypted: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes>;

    /// Protects a full RTCP packet, returning the SRTCP bytes.
    fn encrypt_rtcp(&mut self, decrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes>;

    /// Verifies and decrypts a full SRTCP packet, returning the RTCP bytes.
    fn decrypt_rtcp(&mut self, encrypted: &[u8], srtcp_index: u32, ssrc: u32) -> Result<Bytes>;
}
