use std::collections::HashMap;

use transport::replay_detector::ReplayDetector;

use crate::cipher::cipher_aead_aes_gcm::CipherAeadAesGcm;
use crate::cipher::cipher_aes_cm_hmac_sha1::CipherAesCmHmacSha1;
use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::option::{srtcp_no_replay_protection, srtp_no_replay_protection, ContextOption};
use crate::protection_profile::ProtectionProfile;


#[cfg(test)]
mod srtp_test;

#[cfg(test)]
mod srtcp_test;

pub mod srtcp;
pub mod srtp;

const MAX_ROC_DISORDER: u16 = 100;
pub(crate) const MAX_SEQUENCE_NUMBER: u16 = 65535;
pub(crate) const MAX_SRTCP_INDEX: u32 = 0x7FFF_FFFF;
pub(crate) const SRTCP_INDEX_SIZE: usize = 4;

// Encrypt/decrypt state for a single SRTP SSRC.
struct SrtpSsrcState {
    ssrc: u32,
    rollover_counter: u32,
    rollover_has_processed: bool,
    last_sequence_number: u16,
    replay_detector: Box<dyn ReplayDetector + Send>,
}

// Encrypt/decrypt state for a single SRTCP SSRC.
struct SrtcpSsrcState {
    ssrc: u32,
    srtcp_index: u32,
    replay_detector: Box<dyn ReplayDetector + Send>,
}

impl SrtpSsrcState {
    /// Guesses the rollover counter a packet with `sequence_number` belongs
    /// to, without committing to it. A sequence far below the last one seen
    /// means the 16-bit counter wrapped; one far above, right after a wrap,
    /// means the packet is a straggler from before it.
    fn next_rollover_count(&self, sequence_number: u16) -> u32 {
        let mut roc = self.rollover_counter;

        if !self.rollover_has_processed {
        } else if sequence_number == 0 {
            // Exactly on the rollover boundary. Only increment if the last
            // sequence number was high; otherwise disorder handling below
            // already accounted for it.
            if self.last_sequence_number > MAX_ROC_DISORDER {
                roc += 1;
            }
        } else if self.last_sequence_number < MAX_ROC_DISORDER
            && sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            // Straggler from before the wrap.
            roc -= 1;
        } else if sequence_number < MAX_ROC_DISORDER
            && self.last_sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            // The counter wrapped between the last packet and this one.
            roc += 1;
        }

        roc
    }

    /// Commits the rollover-counter update for an accepted packet.
    /// https://tools.ietf.org/html/rfc3550#appendix-A.1
    fn update_rollover_count(&mut self, sequence_number: u16) {
        if !self.rollover_has_processed {
            self.rollover_has_processed = true;
        } else if sequence_number == 0 {
            if self.last_sequence_number > MAX_ROC_DISORDER {
                self.rollover_counter += 1;
            }
        } else if self.last_sequence_number < MAX_ROC_DISORDER
            && sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            self.rollover_counter -= 1;
        } else if sequence_number < MAX_ROC_DISORDER
            && self.last_sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            self.rollover_counter += 1;
        }
        self.last_sequence_number = sequence_number;
    }
}

/// Context represents one direction of an SRTP cryptographic session. A
/// context must be used only for encryption or only for decryption: the
/// rollover counters, SRTCP indices and replay windows it tracks per SSRC
/// are one-directional.
pub struct Context {
    cipher: Box<dyn Cipher + Send>,

    srtp_ssrc_states: HashMap<u32, SrtpSsrcState>,
    srtcp_ssrc_states: HashMap<u32, SrtcpSsrcState>,

    new_srtp_replay_detector: ContextOption,
    new_srtcp_replay_detector: ContextOption,
}

impl Context {
    /// Creates a context from a master key and salt. Replay protection is
    /// off unless options are supplied; decrypting contexts should always
    /// supply them.
    pub fn new(
        master_key: &[u8],
        master_salt: &[u8],
        profile: ProtectionProfile,
        srtp_ctx_opt: Option<ContextOption>,
        srtcp_ctx_opt: Option<ContextOption>,
    ) -> Result<Context> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();

        if master_key.len() != key_len {
            return Err(Error::SrtpMasterKeyLength(key_len, master_key.len()));
        } else if master_salt.len() != salt_len {
            return Err(Error::SrtpSaltLength(salt_len, master_salt.len()));
        }

        let cipher: Box<dyn Cipher + Send> = match profile {
            ProtectionProfile::Aes128CmHmacSha1_80 | ProtectionProfile::Aes128CmHmacSha1_32 => {
                Box::new(CipherAesCmHmacSha1::new(profile, master_key, master_salt)?)
            }
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => {
                Box::new(CipherAeadAesGcm::new(profile, master_key, master_salt)?)
            }
        };

        Ok(Context {
            cipher,
            srtp_ssrc_states: HashMap::new(),
            srtcp_ssrc_states: HashMap::new(),
            new_srtp_replay_detector: srtp_ctx_opt.unwrap_or_else(srtp_no_replay_protection),
            new_srtcp_replay_detector: srtcp_ctx_opt.unwrap_or_else(srtcp_no_replay_protection),
        })
    }

    fn get_srtp_ssrc_state(&mut self, ssrc: u32) -> &mut SrtpSsrcState {
        let new_detector = &self.new_srtp_replay_detector;
        self.srtp_ssrc_states
            .entry(ssrc)
            .or_insert_with(|| SrtpSsrcState {
                ssrc,
                rollover_counter: 0,
                rollover_has_processed: false,
                last_sequence_number: 0,
                replay_detector: new_detector(),
            })
    }

    fn get_srtcp_ssrc_state(&mut self, ssrc: u32) -> &mut SrtcpSsrcState {
        let first_index = self.cipher.first_rtcp_index();
        let new_detector = &self.new_srtcp_replay_detector;
        self.srtcp_ssrc_states
            .entry(ssrc)
            .or_insert_with(|| SrtcpSsrcState {
                ssrc,
                srtcp_index: first_index,
                replay_detector: new_detector(),
            })
    }

    /// roc returns the SRTP rollover counter of the given SSRC, if the
    /// stream has been seen.
    pub fn roc(&self, ssrc: u32) -> Option<u32> {
        self.srtp_ssrc_states.get(&ssrc).map(|s| s.rollover_counter)
    }

    /// set_roc forces the SRTP rollover counter of the given SSRC.
    pub fn set_roc(&mut self, ssrc: u32, roc: u32) {
        let state = self.get_srtp_ssrc_state(ssrc);
        state.rollover_counter = roc;
        state.rollover_has_processed = false;
    }

    /// index returns the SRTCP index of the given SSRC, if the stream has
    /// been seen.
    pub fn index(&self, ssrc: u32) -> Option<u32> {
        self.srtcp_ssrc_states.get(&ssrc).map(|s| s.srtcp_index)
    }

    /// set_index forces the SRTCP index of the given SSRC.
    pub fn set_index(&mut self, ssrc: u32, index: u32) {
        self.get_srtcp_ssrc_state(ssrc).srtcp_index = index & MAX_SRTCP_INDEX;
    }

    /// reset drops all per-SSRC state: rollover counters, SRTCP indices and
    /// replay windows. Streams restart as if never seen.
    pub fn reset(&mut self) {
        self.srtp_ssrc_states.clear();
        self.srtcp_ssrc_states.clear();
    }
}
