use bytes::Bytes;

use super::*;
use crate::option::srtp_replay_protection;

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

fn sample_rtp_packet() -> Bytes {
    let packet = rtp::packet::Packet {
        header: rtp::header::Header {
            version: 2,
            payload_type: 15,
            sequence_number: 0x1234,
            timestamp: 0xdecafbad,
            ssrc: 0xcafebabe,
            ..Default::default()
        },
        payload: Bytes::from_static(&[0xab; 16]),
        ..Default::default()
    };
    packet.marshal().unwrap()
}

#[test]
fn test_rtp_lifecycle_aes_cm() -> Result<()> {
    let decrypted = sample_rtp_packet();
    let encrypted = Bytes::from_static(&[
        0x80, 0x0f, 0x12, 0x34, 0xde, 0xca, 0xfb, 0xad, 0xca, 0xfe, 0xba, 0xbe, 0xc8, 0xf5,
        0xe0, 0x21, 0x42, 0x36, 0xe5, 0xfd, 0xe9, 0xcb, 0xd6, 0x2d, 0x47, 0xb0, 0xa0, 0x91,
        0x4a, 0xbc, 0x47, 0x86, 0xf3, 0xc5, 0x8a, 0x32, 0x06, 0x0f,
    ]);

    let mut encrypt_context = ctr_context()?;
    assert_eq!(encrypt_context.encrypt_rtp(&decrypted)?, encrypted);

    let mut decrypt_context = ctr_context()?;
    assert_eq!(decrypt_context.decrypt_rtp(&encrypted)?, decrypted);

    Ok(())
}

#[test]
fn test_rtp_lifecycle_gcm() -> Result<()> {
    let decrypted = sample_rtp_packet();

    let mut encrypt_context = gcm_context()?;
    let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;
    assert_eq!(
        encrypted.len(),
        decrypted.len() + 16,
        "GCM appends a 16-byte tag"
    );
    assert_eq!(&encrypted[..12], &decrypted[..12], "header stays clear");

    let mut decrypt_context = gcm_context()?;
    assert_eq!(decrypt_context.decrypt_rtp(&encrypted)?, decrypted);

    Ok(())
}

#[test]
fn test_rtp_bit_flip_fails_authentication() -> Result<()> {
    let decrypted = sample_rtp_packet();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;

    // A flip anywhere the tag covers must be rejected; flips inside the
    // fixed header may also surface as a parse error, never as plaintext.
    for i in 0..encrypted.len() {
        let mut tampered = encrypted.to_vec();
        tampered[i] ^= 0x01;
        let mut decrypt_context = ctr_context()?;
        assert!(
            decrypt_context.decrypt_rtp(&Bytes::from(tampered)).is_err(),
            "flip at byte {} must not decrypt",
            i
        );
    }

    // Payload and tag flips specifically report the tag mismatch.
    for &i in &[12, 20, encrypted.len() - 1] {
        let mut tampered = encrypted.to_vec();
        tampered[i] ^= 0x80;
        let mut decrypt_context = ctr_context()?;
        assert_eq!(
            decrypt_context.decrypt_rtp(&Bytes::from(tampered)),
            Err(Error::RtpFailedToVerifyAuthTag),
            "flip at byte {}",
            i
        );
    }

    Ok(())
}

#[test]
fn test_rtp_extension_is_authenticated_under_gcm() -> Result<()> {
    // Transport-wide CC rides in a one-byte header extension; the extension
    // block is part of the AEAD associated data, so it must round-trip and
    // any tamper must be fatal.
    let packet = rtp::packet::Packet {
        header: rtp::header::Header {
            version: 2,
            extension: true,
            payload_type: 96,
            sequence_number: 0x1234,
            timestamp: 0xdecafbad,
            ssrc: 0xcafebabe,
            csrc: vec![0x11223344],
            extension_profile: rtp::header::EXTENSION_PROFILE_ONE_BYTE,
            extension_payload: Bytes::from_static(&[0x31, 0x00, 0x2a, 0x00]),
            ..Default::default()
        },
        payload: Bytes::from_static(&[0xab; 16]),
        ..Default::default()
    };
    let decrypted = packet.marshal()?;

    let mut encrypt_context = gcm_context()?;
    let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;

    let mut decrypt_context = gcm_context()?;
    assert_eq!(decrypt_context.decrypt_rtp(&encrypted)?, decrypted);

    // Extension block sits after the fixed header and one CSRC.
    let extension_start = 16;
    let extension_end = extension_start + 4 + 4;
    for i in extension_start..extension_end {
        let mut tampered = encrypted.to_vec();
        tampered[i] ^= 0x01;
        let mut decrypt_context = gcm_context()?;
        assert_eq!(
            decrypt_context.decrypt_rtp(&Bytes::from(tampered)),
            Err(Error::RtpFailedToVerifyAuthTag),
            "extension flip at byte {}",
            i
        );
    }

    Ok(())
}

#[test]
fn test_rtp_replay_rejected_after_authentication() -> Result<()> {
    let decrypted = sample_rtp_packet();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;

    let mut decrypt_context = Context::new(
        &MASTER_KEY,
        &MASTER_SALT,
        ProtectionProfile::Aes128CmHmacSha1_80,
        Some(srtp_replay_protection(64)),
        None,
    )?;

    assert_eq!(decrypt_context.decrypt_rtp(&encrypted)?, decrypted);
    assert_eq!(
        decrypt_context.decrypt_rtp(&encrypted),
        Err(Error::DuplicatedPacket(0xcafebabe, 0x1234)),
    );

    Ok(())
}

#[test]
fn test_rtp_sequence_wrap_advances_rollover() -> Result<()> {
    let mut encrypt_context = ctr_context()?;
    let mut decrypt_context = ctr_context()?;

    for seq in [65534u16, 65535, 0, 1] {
        let packet = rtp::packet::Packet {
            header: rtp::header::Header {
                version: 2,
                payload_type: 15,
                sequence_number: seq,
                timestamp: 0xdecafbad,
                ssrc: 0xcafebabe,
                ..Default::default()
            },
            payload: Bytes::from_static(&[0xab; 16]),
            ..Default::default()
        };
        let decrypted = packet.marshal()?;
        let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;
        assert_eq!(
            decrypt_context.decrypt_rtp(&encrypted)?,
            decrypted,
            "seq {}",
            seq
        );
    }

    assert_eq!(encrypt_context.roc(0xcafebabe), Some(1));
    assert_eq!(decrypt_context.roc(0xcafebabe), Some(1));

    Ok(())
}

#[test]
fn test_rtp_failed_auth_does_not_advance_state() -> Result<()> {
    let decrypted = sample_rtp_packet();
    let mut encrypt_context = ctr_context()?;
    let encrypted = encrypt_context.encrypt_rtp(&decrypted)?;

    let mut decrypt_context = Context::new(
        &MASTER_KEY,
        &MASTER_SALT,
        ProtectionProfile::Aes128CmHmacSha1_80,
        Some(srtp_replay_protection(64)),
        None,
    )?;

    let mut forged = encrypted.to_vec();
    let last = forged.len() - 1;
    forged[last] ^= 0xFF;
    assert!(decrypt_context.decrypt_rtp(&Bytes::from(forged)).is_err());

    // The forgery must not have poisoned the replay window.
    assert_eq!(decrypt_context.decrypt_rtp(&encrypted)?, decrypted);

    Ok(())
}
