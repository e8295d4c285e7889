use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

pub const HEADER_LENGTH: usize = 4;
pub const SSRC_LENGTH: usize = 4;
pub const VERSION: u8 = 2;
pub const VERSION_SHIFT: u8 = 6;
pub const VERSION_MASK: u8 = 0x3;
pub const PADDING_SHIFT: u8 = 5;
pub const PADDING_MASK: u8 = 0x1;
pub const COUNT_SHIFT: u8 = 0;
pub const COUNT_MASK: u8 = 0x1F;
pub const COUNT_MAX: usize = (1 << 5) - 1;

/// Transport-layer feedback format: generic NACK (RFC 4585 §6.2.1).
pub const FORMAT_TLN: u8 = 1;
/// Transport-layer feedback format: rapid resynchronization request.
pub const FORMAT_RRR: u8 = 5;
/// Payload-specific feedback format: picture loss indication.
pub const FORMAT_PLI: u8 = 1;

/// PacketType specifies the type of an RTCP packet.
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub enum PacketType {
    #[default]
    Unsupported = 0,
    SenderReport = 200,
    ReceiverReport = 201,
    SourceDescription = 202,
    Goodbye = 203,
    ApplicationDefined = 204,
    TransportSpecificFeedback = 205,
    PayloadSpecificFeedback = 206,
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketType::Unsupported => "Unsupported",
            PacketType::SenderReport => "SR",
            PacketType::ReceiverReport => "RR",
            PacketType::SourceDescription => "SDES",
            PacketType::Goodbye => "BYE",
            PacketType::ApplicationDefined => "APP",
            PacketType::TransportSpecificFeedback => "TSFB",
            PacketType::PayloadSpecificFeedback => "PSFB",
        };
        write!(f, "{}", s)
    }
}

impl From<u8> for PacketType {
    fn from(b: u8) -> Self {
        match b {
            200 => PacketType::SenderReport,
            201 => PacketType::ReceiverReport,
            202 => PacketType::SourceDescription,
            203 => PacketType::Goodbye,
            204 => PacketType::ApplicationDefined,
            205 => PacketType::TransportSpecificFeedback,
            206 => PacketType::PayloadSpecificFeedback,
            _ => PacketType::Unsupported,
        }
    }
}

/// Header is the common four-byte prefix of every RTCP packet. The 32-bit
/// SSRC that follows in report packets is not part of it.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|    RC   |   packet type |             length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Header {
    /// When set, this packet ends with padding whose last byte is its length.
    pub padding: bool,
    /// Report count or, for feedback packets, the feedback message type.
    pub count: u8,
    pub packet_type: PacketType,
    /// Packet length in 32-bit words, minus one (the header word).
    pub length: u16,
}

impl Header {
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Header> {
        if raw_packet.len() < HEADER_LENGTH {
            return Err(Error::ErrPacketTooShort);
        }

        let reader = &mut raw_packet.clone();

        let b0 = reader.get_u8();
        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        if version != VERSION {
            return Err(Error::ErrBadVersion);
        }
        let padding = ((b0 >> PADDING_SHIFT) & PADDING_MASK) > 0;
        let count = b0 & COUNT_MASK;
        let packet_type = PacketType::from(reader.get_u8());
        let length = reader.get_u16();

        Ok(Header {
            padding,
            count,
            packet_type,
            length,
        })
    }

    pub fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }

    pub fn marshal(&self) -> Result<Bytes> {
        if self.count > COUNT_MASK {
            return Err(Error::ErrInvalidHeader);
        }

        let mut writer = BytesMut::with_capacity(HEADER_LENGTH);

        let mut b0 = VERSION << VERSION_SHIFT;
        if self.padding {
            b0 |= 1 << PADDING_SHIFT;
        }
        b0 |= self.count;
        writer.put_u8(b0);
        writer.put_u8(self.packet_type as u8);
        writer.put_u16(self.length);

        Ok(writer.freeze())
    }
}
