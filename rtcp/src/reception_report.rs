use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

pub const RECEPTION_REPORT_LENGTH: usize = 24;

/// ReceptionReport is a block inside a SenderReport or ReceiverReport that
/// conveys reception statistics for a single SSRC.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ReceptionReport {
    /// The SSRC this report block is about.
    pub ssrc: u32,
    /// Fraction of packets lost since the previous report, as a fixed-point
    /// number with the binary point at the left edge.
    pub fraction_lost: u8,
    /// Cumulative number of packets lost, a 24-bit signed quantity.
    pub total_lost: u32,
    /// Extended highest sequence number received.
    pub last_sequence_number: u32,
    /// Interarrival jitter in timestamp units.
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp in the last SR.
    pub last_sender_report: u32,
    /// Delay since the last SR, in units of 1/65536 seconds.
    pub delay: u32,
}

impl ReceptionReport {
    pub fn unmarshal(raw_packet: &Bytes) -> Result<ReceptionReport> {
        if raw_packet.len() < RECEPTION_REPORT_LENGTH {
            return Err(Error::ErrPacketTooShort);
        }

        let reader = &mut raw_packet.clone();

        let ssrc = reader.get_u32();
        let fraction_lost = reader.get_u8();

        let t0 = reader.get_u8() as u32;
        let t1 = reader.get_u8() as u32;
        let t2 = reader.get_u8() as u32;
        let total_lost = (t0 << 16) | (t1 << 8) | t2;

        let last_sequence_number = reader.get_u32();
        let jitter = reader.get_u32();
        let last_sender_report = reader.get_u32();
        let delay = reader.get_u32();

        Ok(ReceptionReport {
            ssrc,
            fraction_lost,
            total_lost,
            last_sequence_number,
            jitter,
            last_sender_report,
            delay,
        })
    }

    pub fn marshal_size(&self) -> usize {
        RECEPTION_REPORT_LENGTH
    }

    pub fn marshal(&self) -> Result<Bytes> {
        if self.total_lost >= (1 << 25) {
            return Err(Error::ErrInvalidHeader);
        }

        let mut writer = BytesMut::with_capacity(RECEPTION_REPORT_LENGTH);

        writer.put_u32(self.ssrc);
        writer.put_u8(self.fraction_lost);
        writer.put_u8(((self.total_lost >> 16) & 0xFF) as u8);
        writer.put_u8(((self.total_lost >> 8) & 0xFF) as u8);
        writer.put_u8((self.total_lost & 0xFF) as u8);
        writer.put_u32(self.last_sequence_number);
        writer.put_u32(self.jitter);
        writer.put_u32(self.last_sender_report);
        writer.put_u32(self.delay);

        Ok(writer.freeze())
    }
}

#[cfg(test)]
mod reception_report_test {
    use super::*;

    #[test]
    fn test_reception_report_roundtrip() -> Result<()> {
        let report = ReceptionReport {
            ssrc: 0x902f9e2e,
            fraction_lost: 3,
            total_lost: 1_000_000,
            last_sequence_number: 0x46e1,
            jitter: 273,
            last_sender_report: 0x9f36432,
            delay: 150137,
        };

        let raw = report.marshal()?;
        assert_eq!(raw.len(), RECEPTION_REPORT_LENGTH);
        let parsed = ReceptionReport::unmarshal(&raw)?;
        assert_eq!(parsed, report);

        Ok(())
    }

    #[test]
    fn test_total_lost_out_of_range() {
        let report = ReceptionReport {
            total_lost: 1 << 25,
            ..Default::default()
        };
        assert!(report.marshal().is_err());
    }
}
