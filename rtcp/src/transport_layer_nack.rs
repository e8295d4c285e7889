use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, FORMAT_TLN, HEADER_LENGTH, SSRC_LENGTH};

const NACK_OFFSET: usize = HEADER_LENGTH + 2 * SSRC_LENGTH;

/// NackPair is a generic-NACK item: a packet id and a bitmask of the 16
/// sequence numbers that follow it.
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub struct NackPair {
    /// ID of the first lost packet.
    pub packet_id: u16,
    /// Bitmask of following lost packets (BLP): bit i set means
    /// `packet_id + i + 1` was also lost.
    pub lost_packets: u16,
}

impl NackPair {
    /// Returns every sequence number this pair reports lost.
    pub fn packet_list(&self) -> Vec<u16> {
        let mut seqs = vec![self.packet_id];
        for i in 0..16u16 {
            if self.lost_packets & (1 << i) != 0 {
                seqs.push(self.packet_id.wrapping_add(i + 1));
            }
        }
        seqs
    }
}

/// Packs sorted lost sequence numbers into the smallest run of NackPairs.
/// Consecutive numbers within 16 of a pair's packet id fold into its bitmask.
pub fn nack_pairs_from_sequence_numbers(seqs: &[u16]) -> Vec<NackPair> {
    if seqs.is_empty() {
        return vec![];
    }

    let mut pairs = vec![];
    let mut pair = NackPair {
        packet_id: seqs[0],
        lost_packets: 0,
    };

    for &seq in &seqs[1..] {
        let diff = seq.wrapping_sub(pair.packet_id);
        if diff == 0 {
            continue;
        }
        if diff > 16 {
            pairs.push(pair);
            pair = NackPair {
                packet_id: seq,
                lost_packets: 0,
            };
        } else {
            pair.lost_packets |= 1 << (diff - 1);
        }
    }

    pairs.push(pair);
    pairs
}

/// TransportLayerNack is the generic NACK feedback message of RFC 4585.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|  FMT=1  |     PT=205    |             length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  SSRC of packet sender                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  SSRC of media source                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            PID                |             BLP               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct TransportLayerNack {
    /// SSRC of the sender of this packet.
    pub sender_ssrc: u32,
    /// SSRC of the media source the NACKs below refer to.
    pub media_ssrc: u32,
    pub nacks: Vec<NackPair>,
}

impl fmt::Display for TransportLayerNack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("TransportLayerNack from {:x}\n", self.sender_ssrc);
        out += format!("\tMedia Ssrc {:x}\n", self.media_ssrc).as_str();
        out += "\tID\tLostPackets\n";
        for nack in &self.nacks {
            out += format!("\t{}\t{:b}\n", nack.packet_id, nack.lost_packets).as_str();
        }
        write!(f, "{}", out)
    }
}

impl TransportLayerNack {
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: FORMAT_TLN,
            packet_type: PacketType::TransportSpecificFeedback,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    pub fn marshal_size(&self) -> usize {
        NACK_OFFSET + self.nacks.len() * 4
    }

    pub fn marshal(&self) -> Result<Bytes> {
        if self.nacks.len() + NACK_OFFSET / 4 > u16::MAX as usize {
            return Err(Error::ErrTooManyReports);
        }

        let mut writer = BytesMut::with_capacity(self.marshal_size());

        writer.extend(self.header().marshal()?);
        writer.put_u32(self.sender_ssrc);
        writer.put_u32(self.media_ssrc);
        for nack in &self.nacks {
            writer.put_u16(nack.packet_id);
            writer.put_u16(nack.lost_packets);
        }

        Ok(writer.freeze())
    }

    pub fn unmarshal(raw_packet: &Bytes) -> Result<TransportLayerNack> {
        if raw_packet.len() < NACK_OFFSET + 4 {
            return Err(Error::ErrPacketTooShort);
        }

        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::TransportSpecificFeedback
            || header.count != FORMAT_TLN
        {
            return Err(Error::ErrWrongType);
        }

        let declared = (header.length as usize + 1) * 4;
        if declared > raw_packet.len() {
            return Err(Error::ErrPacketTooShort);
        }

        let reader = &mut raw_packet.slice(HEADER_LENGTH..declared);
        let sender_ssrc = reader.get_u32();
        let media_ssrc = reader.get_u32();

        let mut nacks = Vec::with_capacity(reader.remaining() / 4);
        while reader.remaining() >= 4 {
            nacks.push(NackPair {
                packet_id: reader.get_u16(),
                lost_packets: reader.get_u16(),
            });
        }

        Ok(TransportLayerNack {
            sender_ssrc,
            media_ssrc,
            nacks,
        })
    }
}
