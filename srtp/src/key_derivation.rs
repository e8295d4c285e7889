use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, NewBlockCipher};
use aes::{Aes128, Aes256, Block};
use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

pub(crate) const LABEL_SRTP_ENCRYPTION: u8 = 0x00;
pub(crate) const LABEL_SRTP_AUTHENTICATION_TAG: u8 = 0x01;
pub(crate) const LABEL_SRTP_SALT: u8 = 0x02;
pub(crate) const LABEL_SRTCP_ENCRYPTION: u8 = 0x03;
pub(crate) const LABEL_SRTCP_AUTHENTICATION_TAG: u8 = 0x04;
pub(crate) const LABEL_SRTCP_SALT: u8 = 0x05;

const PRF_BLOCK_LEN: usize = 16;

/// AES block cipher keyed by a 16 or 32 byte master key, used in ECB mode
/// as the RFC 3711 key-derivation PRF.
enum KdfPrf {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl KdfPrf {
    fn new(master_key: &[u8]) -> Result<Self> {
        match master_key.len() {
            16 => Ok(KdfPrf::Aes128(Aes128::new(GenericArray::from_slice(
                master_key,
            )))),
            32 => Ok(KdfPrf::Aes256(Aes256::new(GenericArray::from_slice(
                master_key,
            )))),
            len => Err(Error::SrtpMasterKeyLength(16, len)),
        }
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            KdfPrf::Aes128(cipher) => cipher.encrypt_block(block),
            KdfPrf::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }
}

/// Derives `out_len` bytes of session keying material for `label` from the
/// master key and salt, per RFC 3711 §4.3.
///
/// The PRF input block is the master salt copied into the left of a 16-byte
/// block: a 12-byte AEAD master salt is thereby right-padded with zeroes
/// before the label and block counter are folded in. Widely deployed stacks
/// behave this way, so interoperability demands it even though the RFC can
/// be read as asking for left-padding.
pub(crate) fn aes_cm_key_derivation(
    label: u8,
    master_key: &[u8],
    master_salt: &[u8],
    index_over_kdr: usize,
    out_len: usize,
) -> Result<Vec<u8>> {
    if index_over_kdr != 0 {
        // The 24-bit "index DIV kdr" would have to be xored into the prf
        // input; master keys are used once here, so it is always zero.
        return Err(Error::UnsupportedIndexOverKdr);
    }

    if master_salt.len() > PRF_BLOCK_LEN - 2 {
        return Err(Error::SrtpSaltLength(PRF_BLOCK_LEN - 2, master_salt.len()));
    }

    let mut prf_in = [0u8; PRF_BLOCK_LEN];
    prf_in[..master_salt.len()].copy_from_slice(master_salt);
    prf_in[7] ^= label;

    let prf = KdfPrf::new(master_key)?;

    let n_blocks = (out_len + PRF_BLOCK_LEN - 1) / PRF_BLOCK_LEN;
    let mut out = vec![0u8; n_blocks * PRF_BLOCK_LEN];
    for (i, chunk) in out.chunks_exact_mut(PRF_BLOCK_LEN).enumerate() {
        BigEndian::write_u16(&mut prf_in[PRF_BLOCK_LEN - 2..], i as u16);
        chunk.copy_from_slice(&prf_in);
        prf.encrypt_block(Block::from_mut_slice(chunk));
    }

    out.truncate(out_len);
    Ok(out)
}

/// Builds the 16-byte AES-CM counter for a packet, per RFC 3711 §4.1.1:
/// the SSRC, the 48-bit packet index (ROC ∥ SEQ) shifted left 16 bits, all
/// xored with the session salt. The salt is 14 bytes, so the low two counter
/// bytes stay unsalted.
pub(crate) fn generate_counter(
    sequence_number: u16,
    rollover_counter: u32,
    ssrc: u32,
    session_salt: &[u8],
) -> [u8; 16] {
    debug_assert!(session_salt.len() <= 16);

    let mut counter = [0u8; 16];
    BigEndian::write_u32(&mut counter[4..], ssrc);
    BigEndian::write_u32(&mut counter[8..], rollover_counter);
    BigEndian::write_u32(&mut counter[12..], (sequence_number as u32) << 16);

    for (i, salt) in session_salt.iter().enumerate() {
        counter[i] ^= salt;
    }

    counter
}
