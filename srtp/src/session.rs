use bytes::Bytes;
use log::debug;
use transport::replay_detector::MAX_WINDOW_SIZE;

use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::option::{srtcp_replay_protection, srtp_replay_protection};

/// Session is the protection façade for one SRTP/SRTCP association. It owns
/// an outbound context keyed with the local master secrets and an inbound
/// context keyed with the remote ones; only the inbound side carries replay
/// protection.
///
/// A session serves one scheduling context: distinct sessions share nothing,
/// and a session multiplexed across threads must be serialised externally.
pub struct Session {
    local_context: Context,
    remote_context: Context,
}

impl Session {
    pub fn new(config: Config) -> Result<Session> {
        if config.replay_window_size == 0 || config.replay_window_size > MAX_WINDOW_SIZE {
            return Err(Error::ReplayWindowSize(MAX_WINDOW_SIZE));
        }

        let local_context = Context::new(
            &config.keys.local_master_key,
            &config.keys.local_master_salt,
            config.profile,
            None,
            None,
        )?;

        let remote_context = Context::new(
            &config.keys.remote_master_key,
            &config.keys.remote_master_salt,
            config.profile,
            Some(srtp_replay_protection(config.replay_window_size)),
            Some(srtcp_replay_protection(config.replay_window_size)),
        )?;

        debug!(
            "SRTP session up: profile {:?}, replay window {}",
            config.profile, config.replay_window_size
        );

        Ok(Session {
            local_context,
            remote_context,
        })
    }

    /// Protects an outbound RTP packet.
    pub fn encrypt_rtp(&mut self, plaintext: &Bytes) -> Result<Bytes> {
        self.local_context.encrypt_rtp(plaintext)
    }

    /// Authenticates and decrypts an inbound SRTP packet.
    pub fn decrypt_rtp(&mut self, encrypted: &Bytes) -> Result<Bytes> {
        self.remote_context.decrypt_rtp(encrypted)
    }

    /// Protects an outbound RTCP packet.
    pub fn encrypt_rtcp(&mut self, plaintext: &Bytes) -> Result<Bytes> {
        self.local_context.encrypt_rtcp(plaintext)
    }

    /// Authenticates and decrypts an inbound SRTCP packet.
    pub fn decrypt_rtcp(&mut self, encrypted: &Bytes) -> Result<Bytes> {
        self.remote_context.decrypt_rtcp(encrypted)
    }

    /// Clears rollover counters, SRTCP indices, replay windows and any other
    /// per-stream state in both directions. Plaintexts already returned stay
    /// valid.
    pub fn reset(&mut self) {
        self.local_context.reset();
        self.remote_context.reset();
    }
}

#[cfg(test)]
mod session_test {
    use super::*;
    use crate::config::SessionKeys;
    use crate::protection_profile::ProtectionProfile;

    fn session_pair(profile: ProtectionProfile) -> Result<(Session, Session)> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();
        let material: Vec<u8> = (0..((key_len + salt_len) * 2) as u8).collect();

        let mut client_config = Config {
            profile,
            ..Default::default()
        };
        client_config.extract_session_keys(&material, true)?;

        let mut server_config = Config {
            profile,
            ..Default::default()
        };
        server_config.extract_session_keys(&material, false)?;

        Ok((Session::new(client_config)?, Session::new(server_config)?))
    }

    fn sample_rtp() -> Bytes {
        let packet = rtp::packet::Packet {
            header: rtp::header::Header {
                version: 2,
                payload_type: 111,
                sequence_number: 5000,
                timestamp: 0xdecafbad,
                ssrc: 0xcafebabe,
                ..Default::default()
            },
            payload: Bytes::from_static(&[0xab; 32]),
            ..Default::default()
        };
        packet.marshal().unwrap()
    }

    fn sample_rtcp() -> Bytes {
        let rr = rtcp::receiver_report::ReceiverReport {
            ssrc: 0xcafebabe,
            ..Default::default()
        };
        rr.marshal().unwrap()
    }

    #[test]
    fn test_rtp_roundtrip_all_profiles() -> Result<()> {
        for profile in [
            ProtectionProfile::Aes128CmHmacSha1_80,
            ProtectionProfile::Aes128CmHmacSha1_32,
            ProtectionProfile::AeadAes128Gcm,
            ProtectionProfile::AeadAes256Gcm,
        ] {
            let (mut client, mut server) = session_pair(profile)?;

            let plaintext = sample_rtp();
            let protected = client.encrypt_rtp(&plaintext)?;
            assert_ne!(protected, plaintext, "{:?}", profile);

            let decrypted = server.decrypt_rtp(&protected)?;
            assert_eq!(decrypted, plaintext, "{:?}", profile);
        }
        Ok(())
    }

    #[test]
    fn test_rtcp_roundtrip_all_profiles() -> Result<()> {
        for profile in [
            ProtectionProfile::Aes128CmHmacSha1_80,
            ProtectionProfile::Aes128CmHmacSha1_32,
            ProtectionProfile::AeadAes128Gcm,
            ProtectionProfile::AeadAes256Gcm,
        ] {
            let (mut client, mut server) = session_pair(profile)?;

            let plaintext = sample_rtcp();
            let protected = client.encrypt_rtcp(&plaintext)?;
            let decrypted = server.decrypt_rtcp(&protected)?;
            assert_eq!(decrypted, plaintext, "{:?}", profile);
        }
        Ok(())
    }

    #[test]
    fn test_replayed_rtp_rejected() -> Result<()> {
        let (mut client, mut server) = session_pair(ProtectionProfile::Aes128CmHmacSha1_80)?;

        let protected = client.encrypt_rtp(&sample_rtp())?;
        server.decrypt_rtp(&protected)?;
        assert!(matches!(
            server.decrypt_rtp(&protected),
            Err(Error::DuplicatedPacket(0xcafebabe, 5000))
        ));

        Ok(())
    }

    #[test]
    fn test_reset_allows_replay_of_cleared_state() -> Result<()> {
        let (mut client, mut server) = session_pair(ProtectionProfile::AeadAes128Gcm)?;

        let protected = client.encrypt_rtp(&sample_rtp())?;
        server.decrypt_rtp(&protected)?;
        server.reset();
        // After an explicit reset the stream starts over.
        assert!(server.decrypt_rtp(&protected).is_ok());

        Ok(())
    }

    #[test]
    fn test_invalid_replay_window_rejected() {
        let config = Config {
            replay_window_size: 65,
            ..Default::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(Error::ReplayWindowSize(_))
        ));
    }

    #[test]
    fn test_short_keying_material_fails_construction() {
        let mut config = Config::default();
        assert!(config.extract_session_keys(&[0u8; 16], true).is_err());
    }
}
