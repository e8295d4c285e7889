use transport::replay_detector::*;

use crate::context::{MAX_SEQUENCE_NUMBER, MAX_SRTCP_INDEX};

/// ContextOption builds the replay detector a context installs for each new
/// SSRC it encounters.
pub type ContextOption = Box<dyn Fn() -> Box<dyn ReplayDetector + Send> + Send + Sync>;

/// srtp_replay_protection returns a ContextOption enabling SRTP replay
/// protection with the given window size.
pub fn srtp_replay_protection(window_size: usize) -> ContextOption {
    Box::new(move || -> Box<dyn ReplayDetector + Send> {
        Box::new(SlidingWindowDetector::new(
            window_size,
            MAX_SEQUENCE_NUMBER as u64,
        ))
    })
}

/// srtcp_replay_protection returns a ContextOption enabling SRTCP replay
/// protection with the given window size.
pub fn srtcp_replay_protection(window_size: usize) -> ContextOption {
    Box::new(move || -> Box<dyn ReplayDetector + Send> {
        Box::new(SlidingWindowDetector::new(
            window_size,
            MAX_SRTCP_INDEX as u64,
        ))
    })
}

/// srtp_no_replay_protection disables SRTP replay protection.
pub fn srtp_no_replay_protection() -> ContextOption {
    Box::new(|| -> Box<dyn ReplayDetector + Send> { Box::<NoOpReplayDetector>::default() })
}

/// srtcp_no_replay_protection disables SRTCP replay protection.
pub fn srtcp_no_replay_protection() -> ContextOption {
    Box::new(|| -> Box<dyn ReplayDetector + Send> { Box::<NoOpReplayDetector>::default() })
}
