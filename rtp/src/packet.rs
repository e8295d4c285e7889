use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::Header;

/// Packet represents an RTP packet: a header, an opaque payload, and an
/// optional trailing padding block whose last byte carries its own length.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
    /// Total number of padding bytes, counting the length byte itself.
    /// Zero when the header's padding flag is clear.
    pub padding_size: u8,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "RTP PACKET:\n".to_string();

        out += format!("\tVersion: {}\n", self.header.version).as_str();
        out += format!("\tMarker: {}\n", self.header.marker).as_str();
        out += format!("\tPayload Type: {}\n", self.header.payload_type).as_str();
        out += format!("\tSequence Number: {}\n", self.header.sequence_number).as_str();
        out += format!("\tTimestamp: {}\n", self.header.timestamp).as_str();
        out += format!("\tSSRC: {} ({:x})\n", self.header.ssrc, self.header.ssrc).as_str();
        out += format!("\tPayload Length: {}\n", self.payload.len()).as_str();

        write!(f, "{}", out)
    }
}

impl Packet {
    /// Unmarshal parses the passed byte slice and stores the result in the Packet.
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Packet> {
        let header = Header::unmarshal(raw_packet)?;
        let payload_offset = header.marshal_size();
        let rest = raw_packet.slice(payload_offset..);

        let (payload, padding_size) = if header.padding {
            if rest.is_empty() {
                return Err(Error::ErrBadPadding);
            }
            let padding_size = rest[rest.len() - 1];
            if padding_size == 0 || padding_size as usize > rest.len() {
                return Err(Error::ErrBadPadding);
            }
            (rest.slice(..rest.len() - padding_size as usize), padding_size)
        } else {
            (rest, 0)
        };

        Ok(Packet {
            header,
            payload,
            padding_size,
        })
    }

    /// MarshalSize returns the size of the packet once marshaled.
    pub fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len() + self.padding_size as usize
    }

    /// Marshal serializes the packet.
    pub fn marshal(&self) -> Result<Bytes> {
        if self.header.padding != (self.padding_size > 0) {
            return Err(Error::ErrBadPadding);
        }

        let mut writer = BytesMut::with_capacity(self.marshal_size());
        self.header.marshal_to(&mut writer)?;
        writer.put_slice(&self.payload);
        if self.padding_size > 0 {
            writer.put_bytes(0, self.padding_size as usize - 1);
            writer.put_u8(self.padding_size);
        }
        Ok(writer.freeze())
    }
}
