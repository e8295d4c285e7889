use crate::error::{Error, Result};
use crate::protection_profile::ProtectionProfile;

const LABEL_EXTRACTOR_DTLS_SRTP: &str = "EXTRACTOR-dtls_srtp";

/// Replay-protection window installed on the remote context by default.
pub const DEFAULT_REPLAY_WINDOW_SIZE: usize = 64;

/// KeyingMaterialExporter lets the SRTP layer pull keying material out of a
/// completed DTLS handshake, per RFC 5764.
pub trait KeyingMaterialExporter {
    fn export_keying_material(
        &self,
        label: &str,
        context: &[u8],
        length: usize,
    ) -> Result<Vec<u8>>;
}

/// SessionKeys bundles the master secrets required to set up a session.
#[derive(Debug, Default, Clone)]
pub struct SessionKeys {
    pub local_master_key: Vec<u8>,
    pub local_master_salt: Vec<u8>,
    pub remote_master_key: Vec<u8>,
    pub remote_master_salt: Vec<u8>,
}

/// Config is used to configure a session. Provide the keys directly, or let
/// `extract_session_keys*` split them out of DTLS-exported material. After a
/// Config is passed to a session it must not be modified.
pub struct Config {
    pub keys: SessionKeys,
    pub profile: ProtectionProfile,
    /// Replay window applied to inbound traffic.
    pub replay_window_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            keys: SessionKeys::default(),
            profile: ProtectionProfile::default(),
            replay_window_size: DEFAULT_REPLAY_WINDOW_SIZE,
        }
    }
}

impl Config {
    /// Splits an opaque keying-material blob into the four master secrets.
    /// The layout is fixed by RFC 5764:
    /// `client-key ∥ server-key ∥ client-salt ∥ server-salt`, with key and
    /// salt lengths taken from the profile. A client uses the client-side
    /// values as its local secrets; a server the server-side ones.
    pub fn extract_session_keys(&mut self, keying_material: &[u8], is_client: bool) -> Result<()> {
        let key_len = self.profile.key_len();
        let salt_len = self.profile.salt_len();

        let required = (key_len + salt_len) * 2;
        if keying_material.len() < required {
            return Err(Error::KeyingMaterialLength(
                required,
                keying_material.len(),
            ));
        }

        let mut offset = 0;
        let client_write_key = keying_material[offset..offset + key_len].to_vec();
        offset += key_len;

        let server_write_key = keying_material[offset..offset + key_len].to_vec();
        offset += key_len;

        let client_write_salt = keying_material[offset..offset + salt_len].to_vec();
        offset += salt_len;

        let server_write_salt = keying_material[offset..offset + salt_len].to_vec();

        if is_client {
            self.keys.local_master_key = client_write_key;
            self.keys.local_master_salt = client_write_salt;
            self.keys.remote_master_key = server_write_key;
            self.keys.remote_master_salt = server_write_salt;
        } else {
            self.keys.local_master_key = server_write_key;
            self.keys.local_master_salt = server_write_salt;
            self.keys.remote_master_key = client_write_key;
            self.keys.remote_master_salt = client_write_salt;
        }

        Ok(())
    }

    /// Pulls the keying material out of DTLS and splits it. This behavior is
    /// defined in RFC 5764: https://tools.ietf.org/html/rfc5764
    pub fn extract_session_keys_from_dtls(
        &mut self,
        exporter: &impl KeyingMaterialExporter,
        is_client: bool,
    ) -> Result<()> {
        let length = (self.profile.key_len() + self.profile.salt_len()) * 2;
        let keying_material =
            exporter.export_keying_material(LABEL_EXTRACTOR_DTLS_SRTP, &[], length)?;
        self.extract_session_keys(&keying_material, is_client)
    }
}
