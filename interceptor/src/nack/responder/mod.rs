pub mod send_buffer;

use log::trace;
use rtcp::transport_layer_nack::TransportLayerNack;

use crate::error::Result;
use crate::rtx::RtxEncoder;
use send_buffer::{SendBuffer, DEFAULT_SEND_BUFFER_SIZE};

/// Responder answers a peer's generic NACKs out of a circular cache of
/// recently sent packets. With an RtxEncoder attached, resends go out as an
/// RFC 4588 retransmission stream; without one they are sent verbatim.
pub struct Responder {
    buffer: SendBuffer,
    rtx_encoder: Option<RtxEncoder>,
}

impl Responder {
    pub fn new(buffer_size: usize) -> Result<Responder> {
        Ok(Responder {
            buffer: SendBuffer::new(buffer_size)?,
            rtx_encoder: None,
        })
    }

    pub fn with_default_size() -> Result<Responder> {
        Responder::new(DEFAULT_SEND_BUFFER_SIZE)
    }

    /// Enables RTX wrapping for resends.
    pub fn with_rtx(mut self, rtx_ssrc: u32, rtx_payload_type: u8) -> Responder {
        self.rtx_encoder = Some(RtxEncoder::new(rtx_ssrc, rtx_payload_type));
        self
    }

    /// Remembers an outbound packet so it can be resent on request.
    pub fn on_send(&mut self, packet: &rtp::packet::Packet) {
        self.buffer.store(packet.clone());
    }

    /// Answers a NACK: every requested sequence number still cached comes
    /// back as a packet ready to retransmit. Requests that already left the
    /// cache are dropped silently; the generator on the far side retries.
    pub fn on_nack(&mut self, nack: &TransportLayerNack) -> Vec<rtp::packet::Packet> {
        let mut resends = vec![];

        for pair in &nack.nacks {
            for seq in pair.packet_list() {
                let packet = match self.buffer.retrieve(seq) {
                    Some(packet) => packet,
                    None => {
                        trace!("NACKed packet {} no longer cached", seq);
                        continue;
                    }
                };
                let resend = match &self.rtx_encoder {
                    Some(encoder) => encoder.wrap(packet),
                    None => packet.clone(),
                };
                resends.push(resend);
            }
        }

        resends
    }

    /// Drops every cached packet.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
