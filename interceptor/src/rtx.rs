use std::collections::HashMap;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// RtxEncoder rewrites a media packet into its RFC 4588 retransmission
/// form: the RTX stream's own SSRC and payload type, a sequence number
/// drawn from the RTX stream's independent space, and the original sequence
/// number (OSN) prepended to the payload.
pub struct RtxEncoder {
    ssrc: u32,
    payload_type: u8,
    sequencer: rtp::sequence::Sequencer,
}

impl RtxEncoder {
    pub fn new(ssrc: u32, payload_type: u8) -> Self {
        RtxEncoder {
            ssrc,
            payload_type,
            sequencer: rtp::sequence::Sequencer::new_random(),
        }
    }

    /// Wraps a media packet for retransmission. Every call consumes a fresh
    /// RTX sequence number, repeated NACKs for the same packet included.
    pub fn wrap(&self, packet: &rtp::packet::Packet) -> rtp::packet::Packet {
        let mut payload = BytesMut::with_capacity(2 + packet.payload.len());
        payload.put_u16(packet.header.sequence_number);
        payload.extend_from_slice(&packet.payload);

        rtp::packet::Packet {
            header: rtp::header::Header {
                ssrc: self.ssrc,
                payload_type: self.payload_type,
                sequence_number: self.sequencer.next_sequence_number(),
                ..packet.header.clone()
            },
            payload: payload.freeze(),
            padding_size: packet.padding_size,
        }
    }
}

/// Identifies the media stream an RTX stream repairs.
#[derive(Debug, Clone, Copy)]
struct RtxMapping {
    media_ssrc: u32,
    media_payload_type: u8,
}

/// RtxDecoder restores original packets from registered RTX streams on the
/// receive side.
#[derive(Default)]
pub struct RtxDecoder {
    mappings: HashMap<(u32, u8), RtxMapping>,
}

impl RtxDecoder {
    pub fn new() -> Self {
        RtxDecoder::default()
    }

    /// Registers an RTX stream and the media stream it repairs.
    pub fn add_mapping(
        &mut self,
        rtx_ssrc: u32,
        rtx_payload_type: u8,
        media_ssrc: u32,
        media_payload_type: u8,
    ) {
        self.mappings.insert(
            (rtx_ssrc, rtx_payload_type),
            RtxMapping {
                media_ssrc,
                media_payload_type,
            },
        );
    }

    /// Unwraps a packet from a registered RTX stream, restoring the
    /// original SSRC, payload type and sequence number. Returns `Ok(None)`
    /// when the packet does not belong to any registered RTX stream.
    pub fn unwrap(&self, packet: &rtp::packet::Packet) -> Result<Option<rtp::packet::Packet>> {
        let mapping = match self
            .mappings
            .get(&(packet.header.ssrc, packet.header.payload_type))
        {
            Some(mapping) => mapping,
            None => return Ok(None),
        };

        if packet.payload.len() < 2 {
            return Err(Error::ErrShortRtxPayload);
        }

        let mut payload = packet.payload.clone();
        let original_sequence_number = payload.get_u16();

        Ok(Some(rtp::packet::Packet {
            header: rtp::header::Header {
                ssrc: mapping.media_ssrc,
                payload_type: mapping.media_payload_type,
                sequence_number: original_sequence_number,
                ..packet.header.clone()
            },
            payload,
            padding_size: packet.padding_size,
        }))
    }
}
