use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use super::*;
use crate::option::srtcp_replay_protection;

const MASTER_KEY: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f,
];
const MASTER_SALT: [u8; 14] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,
];
const GCM_MASTER_SALT: [u8; 12] = [
    0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xab,
];

fn ctr_context() -> Result<Context> {
    Context::new(
        &MASTER_KEY,
        &MASTER_SALT,
        ProtectionProfile::Aes128CmHmacSha1_80,
        None,
        None,
    )
}

fn gcm_context() -> Result<Context> {
    Context::new(
        &MASTER_KEY,
        &GCM_MASTER_SALT,
        ProtectionProfile::AeadAes128Gcm,
        None,
        None,
    )
}

fn sample_sender_report() -> Bytes {
    // SR shell: PT=200, RC=1, length=5, SSRC=0xcafebabe, 16 payload bytes.
    let mut data = vec![0x81, 0xc8, 0x00, 0x05, 0xca, 0xfe, 0xba, 0xbe];
    data.extend_from_slice(&[0xab; 16]);
    Bytes::from(data)
}

fn empty_receiver_report() -> Bytes {
    Bytes::from_static(&[0x80, 0xc9, 0x00, 0x01, 0xca, 0xfe, 0xba, 0xbe])
}

#[test]
fn test_rtcp_lifecycle_aes_cm() -> Result<()> {
    let decrypted = sample_sender_report();
    let encrypted = Bytes::from_static(&[
        0x81, 0xc8, 0x00, 0x05, 0xca, 0xfe, 0xba, 0xbe, 0x2d, 0xcb, 0xd1, 0xa0, 0xf7, 0x63,
        0x81, 0x08, 0x79, 0xd3, 0x98, 0xdf, 0x74, 0x3f, 0x4f, 0x7d, 0x80, 0x00, 0x00, 0x01,
        0xdd, 0xc5, 0x7f, 0x60, 0xc3, 0x48, 0x5f, 0x92, 0xe7, 0x61,
    ]);

    // The first outbound SRTCP packet under this transform carries index 1.
    let mut encrypt_context = ctr_context()?;
    assert_eq!(encrypt_context.encrypt_rtcp(&decrypted)?, encrypted);

    let mut decrypt_context = ctr_context()?;
    assert_eq!(decrypt_context.decrypt_rtcp(&encrypted)?, decrypted);

    Ok(())
}

#[test]
fn test_rtcp_lifecycle_gcm() -> Result<()> {
    let decrypted = empty_receiver_report();
    let encrypted = Bytes::from_static(&[
        0x80, 0xc9, 0x00, 0x01, 0xca, 0xfe, 0xba, 0xbe, 0xea, 0xec, 0xc2, 0xc4, 0x38, 0xea,
        0x2e, 0x58, 0x43, 0x9e, 0xa0, 0x84, 0x1a, 0x4a, 0x2e, 0x8d, 0x80, 0x00, 0x00, 0x00,
    ]);

    // The first outbound SRTCP packet under the AEAD transform carries
    // index 0, with the E-flag still set in the trailing word.
    let mut encrypt_context = gcm_context()?;
    assert_eq!(encrypt_context.encrypt_rtcp(&decrypted)?, encrypted);

    let mut decrypt_context = gcm_context()?;
    assert_eq!(decrypt_context.decrypt_rtcp(&encrypted)?, decrypted);

    Ok(())
}

#[test]
fn test_rtcp_index_advances_per_packet() -> Result<()> {
    let decrypted = sample_sender_report();

    let mut ctr = ctr_context()?;
    let first = ctr.encrypt_rtcp(&decrypted)?;
    let second = ctr.encrypt_rtcp(&decrypted)?;
    // Index word sits before the ten-byte tag.
    let index_of = |pkt: &Bytes| BigEndian::read_u32(&pkt[pkt.len() - 14..]) & 0x7FFF_FFFF;
    assert_eq!(index_of(&first), 1);
    assert_eq!(index_of(&second), 2);

    let mut gcm = gcm_context()?;
    let first = gcm.encrypt_rtcp(&empty_receiver_report())?;
    let second = gcm.encrypt_rtcp(&empty_receiver_report())?;
    let index_of = |pkt: &Bytes| BigEndian::read_u32(&pkt[pkt.len() - 4..]) & 0x7FFF_FFFF;
    assert_eq!(index_of(&first), 0);
    assert_eq!(index_of(&second), 1);

    Ok(())
}

#[test]
fn test_rtcp_bit_flip_fails_authentication() -> Result<()> {
    let decrypted = sample_sender_report();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtcp(&decrypted)?;

    // Flips across ciphertext, index word and tag must all be fatal.
    for i in 8..encrypted.len() {
        let mut tampered = encrypted.to_vec();
        tampered[i] ^= 0x01;
        let mut decrypt_context = ctr_context()?;
        assert_eq!(
            decrypt_context.decrypt_rtcp(&Bytes::from(tampered)),
            Err(Error::RtcpFailedToVerifyAuthTag),
            "flip at byte {}",
            i
        );
    }

    Ok(())
}

#[test]
fn test_rtcp_gcm_bit_flip_fails_authentication() -> Result<()> {
    let decrypted = empty_receiver_report();
    let mut encrypt_context = gcm_context()?;
    let encrypted = encrypt_context.encrypt_rtcp(&decrypted)?;

    for i in 0..encrypted.len() {
        let mut tampered = encrypted.to_vec();
        tampered[i] ^= 0x01;
        let mut decrypt_context = gcm_context()?;
        assert!(
            decrypt_context
                .decrypt_rtcp(&Bytes::from(tampered))
                .is_err(),
            "flip at byte {} must not decrypt",
            i
        );
    }

    Ok(())
}

#[test]
fn test_rtcp_replay_rejected() -> Result<()> {
    let decrypted = sample_sender_report();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtcp(&decrypted)?;

    let mut decrypt_context = Context::new(
        &MASTER_KEY,
        &MASTER_SALT,
        ProtectionProfile::Aes128CmHmacSha1_80,
        None,
        Some(srtcp_replay_protection(64)),
    )?;

    assert_eq!(decrypt_context.decrypt_rtcp(&encrypted)?, decrypted);
    assert_eq!(
        decrypt_context.decrypt_rtcp(&encrypted),
        Err(Error::DuplicatedPacket(0xcafebabe, 1)),
    );

    Ok(())
}

#[test]
fn test_rtcp_cleartext_does_not_bypass_authentication() -> Result<()> {
    let decrypted = sample_sender_report();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtcp(&decrypted)?;

    // Clearing the E-flag switches the packet to cleartext transport, but
    // the tag was computed with the flag set, so verification must still
    // fail rather than the payload being accepted as-is.
    let mut tampered = encrypted.to_vec();
    let tail_offset = tampered.len() - 14;
    tampered[tail_offset] &= 0x7F;

    let mut decrypt_context = ctr_context()?;
    assert_eq!(
        decrypt_context.decrypt_rtcp(&Bytes::from(tampered)),
        Err(Error::RtcpFailedToVerifyAuthTag),
    );

    Ok(())
}
