use crate::error::{Error, Result};

/// Packets a send buffer holds by default; roughly half a second of typical
/// audio or video.
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 128;

/// SendBuffer is a circular cache of recently sent RTP packets, keyed by
/// sequence number. Slots are overwritten as the sequence space advances;
/// there is no notion of time.
pub struct SendBuffer {
    packets: Vec<Option<rtp::packet::Packet>>,
}

impl SendBuffer {
    pub fn new(size: usize) -> Result<SendBuffer> {
        if size == 0 || size > u16::MAX as usize + 1 {
            return Err(Error::ErrInvalidSize);
        }
        Ok(SendBuffer {
            packets: vec![None; size],
        })
    }

    /// Remembers a sent packet, evicting whatever shared its slot.
    pub fn store(&mut self, packet: rtp::packet::Packet) {
        let slot = packet.header.sequence_number as usize % self.packets.len();
        self.packets[slot] = Some(packet);
    }

    /// Returns the packet with the given sequence number if it is still
    /// cached. A slot reused by a later packet misses rather than serving
    /// the stale occupant.
    pub fn retrieve(&self, seq: u16) -> Option<&rtp::packet::Packet> {
        let slot = seq as usize % self.packets.len();
        match &self.packets[slot] {
            Some(packet) if packet.header.sequence_number == seq => Some(packet),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.packets.fill(None);
    }
}
