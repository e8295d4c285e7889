use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, COUNT_MAX, HEADER_LENGTH, SSRC_LENGTH};
use crate::reception_report::{ReceptionReport, RECEPTION_REPORT_LENGTH};

pub(crate) const RR_SSRC_OFFSET: usize = HEADER_LENGTH;
pub(crate) const RR_REPORT_OFFSET: usize = RR_SSRC_OFFSET + SSRC_LENGTH;

/// A ReceiverReport (RR) packet provides reception quality feedback for an RTP stream.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ReceiverReport {
    /// The synchronization source identifier for the originator of this RR packet.
    pub ssrc: u32,
    /// Zero or more reception report blocks, one per source heard from since
    /// the last report.
    pub reports: Vec<ReceptionReport>,
    /// Profile-specific extension data appended after the report blocks.
    pub profile_extensions: Bytes,
}

impl fmt::Display for ReceiverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("ReceiverReport from {:x}\n", self.ssrc);
        out += "\tSSRC    \tLost\tLastSequence\n";
        for rep in &self.reports {
            out += format!(
                "\t{:x}\t{}/{}\t{}\n",
                rep.ssrc, rep.fraction_lost, rep.total_lost, rep.last_sequence_number
            )
            .as_str();
        }
        write!(f, "{}", out)
    }
}

impl ReceiverReport {
    /// Header returns the Header associated with this packet.
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type: PacketType::ReceiverReport,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    pub fn marshal_size(&self) -> usize {
        HEADER_LENGTH
            + SSRC_LENGTH
            + self.reports.len() * RECEPTION_REPORT_LENGTH
            + self.profile_extensions.len()
    }

    pub fn marshal(&self) -> Result<Bytes> {
        if self.reports.len() > COUNT_MAX {
            return Err(Error::ErrTooManyReports);
        }
        // The length field counts 32-bit words, so the extension data has to
        // come in whole words.
        if self.profile_extensions.len() % 4 != 0 {
            return Err(Error::ErrInvalidHeader);
        }

        let mut writer = BytesMut::with_capacity(self.marshal_size());

        writer.extend(self.header().marshal()?);
        writer.put_u32(self.ssrc);
        for report in &self.reports {
            writer.extend(report.marshal()?);
        }
        writer.extend_from_slice(&self.profile_extensions);

        Ok(writer.freeze())
    }

    pub fn unmarshal(raw_packet: &Bytes) -> Result<ReceiverReport> {
        if raw_packet.len() < RR_REPORT_OFFSET {
            return Err(Error::ErrPacketTooShort);
        }

        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::ReceiverReport {
            return Err(Error::ErrWrongType);
        }

        let reader = &mut raw_packet.slice(RR_SSRC_OFFSET..);
        let ssrc = reader.get_u32();

        let mut offset = RR_REPORT_OFFSET;
        let mut reports = Vec::with_capacity(header.count as usize);
        while reports.len() < header.count as usize {
            if offset + RECEPTION_REPORT_LENGTH > raw_packet.len() {
                return Err(Error::ErrPacketTooShort);
            }
            reports.push(ReceptionReport::unmarshal(&raw_packet.slice(offset..))?);
            offset += RECEPTION_REPORT_LENGTH;
        }
        let profile_extensions = raw_packet.slice(offset..);

        Ok(ReceiverReport {
            ssrc,
            reports,
            profile_extensions,
        })
    }
}
