use std::sync::{Arc, Mutex};

/// Sequencer hands out RTP sequence numbers, wrapping at 0xFFFF and counting
/// rollovers. Retransmission streams draw from their own sequencer, never from
/// the media stream's.
#[derive(Debug, Clone)]
pub struct Sequencer(Arc<Mutex<SequencerInternal>>);

#[derive(Debug)]
struct SequencerInternal {
    sequence_number: u16,
    roll_over_count: u64,
}

impl Sequencer {
    /// Creates a sequencer whose first emitted number is `start`.
    pub fn new(start: u16) -> Self {
        Sequencer(Arc::new(Mutex::new(SequencerInternal {
            sequence_number: start.wrapping_sub(1),
            roll_over_count: 0,
        })))
    }

    /// Creates a sequencer starting at a random sequence number.
    pub fn new_random() -> Self {
        Self::new(rand::random::<u16>())
    }

    pub fn next_sequence_number(&self) -> u16 {
        let mut internal = self.0.lock().unwrap();
        internal.sequence_number = internal.sequence_number.wrapping_add(1);
        if internal.sequence_number == 0 {
            internal.roll_over_count += 1;
        }
        internal.sequence_number
    }

    pub fn roll_over_count(&self) -> u64 {
        let internal = self.0.lock().unwrap();
        internal.roll_over_count
    }
}
