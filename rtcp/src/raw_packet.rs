use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::header::{Header, HEADER_LENGTH};

/// RawPacket carries an RTCP packet the parser does not understand, or one
/// whose declared length overran the buffer. The bytes are kept verbatim so
/// that compound framing survives.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct RawPacket(pub Bytes);

impl fmt::Display for RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPacket: {:?}", self.0)
    }
}

impl RawPacket {
    pub fn unmarshal(raw_packet: &Bytes) -> Result<RawPacket> {
        if raw_packet.len() < HEADER_LENGTH {
            return Err(Error::ErrPacketTooShort);
        }
        // Validate the header so garbage does not round-trip unnoticed.
        Header::unmarshal(raw_packet)?;
        Ok(RawPacket(raw_packet.clone()))
    }

    pub fn marshal_size(&self) -> usize {
        self.0.len()
    }

    pub fn marshal(&self) -> Result<Bytes> {
        Ok(self.0.clone())
    }

    pub fn header(&self) -> Result<Header> {
        Header::unmarshal(&self.0)
    }
}
