use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, FORMAT_TLN, HEADER_LENGTH};
use crate::raw_packet::RawPacket;
use crate::receiver_report::ReceiverReport;
use crate::transport_layer_nack::TransportLayerNack;

/// Packet represents a single parsed RTCP packet. Types the stack does not
/// act on are preserved as RawPacket so compound traffic survives a
/// parse/serialise round trip.
#[derive(Debug, PartialEq, Clone)]
pub enum Packet {
    ReceiverReport(ReceiverReport),
    TransportLayerNack(TransportLayerNack),
    Raw(RawPacket),
}

impl Packet {
    pub fn marshal_size(&self) -> usize {
        match self {
            Packet::ReceiverReport(p) => p.marshal_size(),
            Packet::TransportLayerNack(p) => p.marshal_size(),
            Packet::Raw(p) => p.marshal_size(),
        }
    }

    pub fn marshal(&self) -> Result<Bytes> {
        match self {
            Packet::ReceiverReport(p) => p.marshal(),
            Packet::TransportLayerNack(p) => p.marshal(),
            Packet::Raw(p) => p.marshal(),
        }
    }
}

/// Marshal serializes a compound packet: the packets back to back, no gaps.
pub fn marshal(packets: &[Packet]) -> Result<Bytes> {
    let mut writer = BytesMut::new();
    for packet in packets {
        writer.extend(packet.marshal()?);
    }
    Ok(writer.freeze())
}

/// Unmarshal parses a whole datagram, which may hold several RTCP packets.
///
/// Parsing advances by the bytes actually consumed rather than the declared
/// length: a packet whose length field overruns the buffer is truncated to
/// the available span and kept as a RawPacket (undersized length fields do
/// occur in the wild), and unknown packet types become RawPacket
/// placeholders of their declared size so framing is never lost.
pub fn unmarshal(raw_data: &Bytes) -> Result<Vec<Packet>> {
    let mut packets = vec![];

    let mut offset = 0;
    while offset < raw_data.len() {
        let remaining = raw_data.slice(offset..);
        if remaining.len() < HEADER_LENGTH {
            // A runt tail cannot hold another header; stop cleanly.
            break;
        }

        let header = Header::unmarshal(&remaining)?;
        let declared = (header.length as usize + 1) * 4;
        let span = declared.min(remaining.len());
        let body = remaining.slice(..span);

        let packet = if span < declared {
            Packet::Raw(RawPacket(body))
        } else {
            match header.packet_type {
                PacketType::ReceiverReport => Packet::ReceiverReport(ReceiverReport::unmarshal(&body)?),
                PacketType::TransportSpecificFeedback if header.count == FORMAT_TLN => {
                    Packet::TransportLayerNack(TransportLayerNack::unmarshal(&body)?)
                }
                _ => Packet::Raw(RawPacket(body)),
            }
        };

        packets.push(packet);
        offset += span;
    }

    if packets.is_empty() {
        return Err(Error::ErrInvalidHeader);
    }

    Ok(packets)
}
