use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

pub const FIXED_HEADER_SIZE: usize = 12;
pub const EXTENSION_HEADER_SIZE: usize = 4;
pub const VERSION: u8 = 2;

pub const VERSION_SHIFT: u8 = 6;
pub const VERSION_MASK: u8 = 0x3;
pub const PADDING_SHIFT: u8 = 5;
pub const PADDING_MASK: u8 = 0x1;
pub const EXTENSION_SHIFT: u8 = 4;
pub const EXTENSION_MASK: u8 = 0x1;
pub const CC_MASK: u8 = 0xF;
pub const MARKER_SHIFT: u8 = 7;
pub const MARKER_MASK: u8 = 0x1;
pub const PT_MASK: u8 = 0x7F;
pub const CSRC_LENGTH: usize = 4;

/// Profile identifying RFC 8285 one-byte extension elements.
pub const EXTENSION_PROFILE_ONE_BYTE: u16 = 0xBEDE;
/// Profile identifying RFC 8285 two-byte extension elements.
pub const EXTENSION_PROFILE_TWO_BYTE: u16 = 0x1000;

/// Header represents an RTP packet header.
///
/// The extension block is carried opaquely: `extension_profile` plus the raw
/// extension words. Serialising a header must reproduce the extension block
/// byte for byte, since AEAD protection authenticates the entire header.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      defined by profile       |           length              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        header extension                       |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub extension_profile: u16,
    pub extension_payload: Bytes,
}

impl Header {
    /// Unmarshal parses the passed byte slice and stores the result in the Header.
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Header> {
        if raw_packet.len() < FIXED_HEADER_SIZE {
            return Err(Error::ErrHeaderSizeInsufficient);
        }

        let reader = &mut raw_packet.clone();

        let b0 = reader.get_u8();
        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        if version != VERSION {
            return Err(Error::ErrBadVersion);
        }
        let padding = ((b0 >> PADDING_SHIFT) & PADDING_MASK) > 0;
        let extension = ((b0 >> EXTENSION_SHIFT) & EXTENSION_MASK) > 0;
        let cc = (b0 & CC_MASK) as usize;

        let b1 = reader.get_u8();
        let marker = ((b1 >> MARKER_SHIFT) & MARKER_MASK) > 0;
        let payload_type = b1 & PT_MASK;

        let sequence_number = reader.get_u16();
        let timestamp = reader.get_u32();
        let ssrc = reader.get_u32();

        if reader.remaining() < cc * CSRC_LENGTH {
            return Err(Error::ErrHeaderSizeInsufficient);
        }
        let mut csrc = Vec::with_capacity(cc);
        for _ in 0..cc {
            csrc.push(reader.get_u32());
        }

        let (extension_profile, extension_payload) = if extension {
            if reader.remaining() < EXTENSION_HEADER_SIZE {
                return Err(Error::ErrHeaderSizeInsufficientForExtension);
            }
            let extension_profile = reader.get_u16();
            let extension_length = reader.get_u16() as usize * 4;
            if reader.remaining() < extension_length {
                return Err(Error::ErrHeaderSizeInsufficientForExtension);
            }
            (extension_profile, reader.copy_to_bytes(extension_length))
        } else {
            (0, Bytes::new())
        };

        Ok(Header {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_profile,
            extension_payload,
        })
    }

    /// MarshalSize returns the size of the header once marshaled.
    pub fn marshal_size(&self) -> usize {
        let mut size = FIXED_HEADER_SIZE + self.csrc.len() * CSRC_LENGTH;
        if self.extension {
            size += EXTENSION_HEADER_SIZE + self.extension_payload.len();
        }
        size
    }

    /// Marshal serializes the header. The extension block, when present, is
    /// always included so that the output can serve as AEAD associated data.
    pub fn marshal(&self) -> Result<Bytes> {
        let mut writer = BytesMut::with_capacity(self.marshal_size());
        self.marshal_to(&mut writer)?;
        Ok(writer.freeze())
    }

    pub(crate) fn marshal_to(&self, writer: &mut BytesMut) -> Result<usize> {
        if self.csrc.len() > CC_MASK as usize {
            return Err(Error::ErrTooManyCsrc);
        }

        let mut b0 = (VERSION << VERSION_SHIFT) | self.csrc.len() as u8;
        if self.padding {
            b0 |= 1 << PADDING_SHIFT;
        }
        if self.extension {
            b0 |= 1 << EXTENSION_SHIFT;
        }
        writer.put_u8(b0);

        let mut b1 = self.payload_type & PT_MASK;
        if self.marker {
            b1 |= 1 << MARKER_SHIFT;
        }
        writer.put_u8(b1);

        writer.put_u16(self.sequence_number);
        writer.put_u32(self.timestamp);
        writer.put_u32(self.ssrc);

        for csrc in &self.csrc {
            writer.put_u32(*csrc);
        }

        if self.extension {
            if self.extension_payload.len() % 4 != 0 {
                return Err(Error::ErrExtensionPayloadNotAligned);
            }
            writer.put_u16(self.extension_profile);
            writer.put_u16((self.extension_payload.len() / 4) as u16);
            writer.put_slice(&self.extension_payload);
        }

        Ok(self.marshal_size())
    }
}

#[cfg(test)]
mod header_test {
    use super::*;

    #[test]
    fn test_unmarshal_with_extension() -> Result<()> {
        let raw_pkt = Bytes::from_static(&[
            0x90, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82, 0x00, 0x01,
            0x00, 0x01, 0x98, 0x36, 0xbe, 0x88, 0x9e,
        ]);

        let header = Header::unmarshal(&raw_pkt)?;
        assert_eq!(
            header,
            Header {
                version: 2,
                padding: false,
                extension: true,
                marker: true,
                payload_type: 96,
                sequence_number: 27023,
                timestamp: 3653407706,
                ssrc: 476325762,
                csrc: vec![],
                extension_profile: 1,
                extension_payload: Bytes::from_static(&[0x98, 0x36, 0xbe, 0x88]),
            }
        );
        assert_eq!(header.marshal_size(), raw_pkt.len() - 1);

        Ok(())
    }

    #[test]
    fn test_roundtrip() -> Result<()> {
        let header = Header {
            version: 2,
            marker: true,
            payload_type: 111,
            sequence_number: 0x1234,
            timestamp: 0xdecafbad,
            ssrc: 0xcafebabe,
            csrc: vec![0x11223344, 0x55667788],
            ..Default::default()
        };

        let raw = header.marshal()?;
        assert_eq!(raw.len(), header.marshal_size());
        let parsed = Header::unmarshal(&raw)?;
        assert_eq!(parsed, header);

        Ok(())
    }

    #[test]
    fn test_one_byte_extension_roundtrip() -> Result<()> {
        // Transport-wide CC element under the one-byte extension profile,
        // padded out to a full word.
        let header = Header {
            version: 2,
            extension: true,
            payload_type: 96,
            sequence_number: 5000,
            timestamp: 10000,
            ssrc: 0x1c642782,
            extension_profile: EXTENSION_PROFILE_ONE_BYTE,
            extension_payload: Bytes::from_static(&[0x31, 0x00, 0x2a, 0x00]),
            ..Default::default()
        };

        let raw = header.marshal()?;
        let parsed = Header::unmarshal(&raw)?;
        assert_eq!(parsed, header);

        Ok(())
    }

    #[test]
    fn test_bad_version() {
        let raw_pkt = Bytes::from_static(&[
            0x40, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82,
        ]);
        assert_eq!(Header::unmarshal(&raw_pkt), Err(Error::ErrBadVersion));
    }

    #[test]
    fn test_truncated_csrc_list() {
        // CC says 2 but only one CSRC is present.
        let raw_pkt = Bytes::from_static(&[
            0x82, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82, 0x11, 0x22,
            0x33, 0x44,
        ]);
        assert_eq!(
            Header::unmarshal(&raw_pkt),
            Err(Error::ErrHeaderSizeInsufficient)
        );
    }

    #[test]
    fn test_extension_overruns_buffer() {
        // Extension declares 2 words but only 1 follows.
        let raw_pkt = Bytes::from_static(&[
            0x90, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82, 0xbe, 0xde,
            0x00, 0x02, 0x01, 0x02, 0x03, 0x04,
        ]);
        assert_eq!(
            Header::unmarshal(&raw_pkt),
            Err(Error::ErrHeaderSizeInsufficientForExtension)
        );
    }

    #[test]
    fn test_unaligned_extension_payload_rejected() {
        let header = Header {
            version: 2,
            extension: true,
            extension_profile: EXTENSION_PROFILE_ONE_BYTE,
            extension_payload: Bytes::from_static(&[0x31, 0x00, 0x2a]),
            ..Default::default()
        };
        assert_eq!(header.marshal(), Err(Error::ErrExtensionPayloadNotAligned));
    }
}
