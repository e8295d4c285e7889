use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("packet too short to be a valid RTCP packet")]
    ErrPacketTooShort,
    #[error("RTCP version must be 2")]
    ErrBadVersion,
    #[error("packet type does not match the parsed structure")]
    ErrWrongType,
    #[error("invalid RTCP header")]
    ErrInvalidHeader,
    #[error("an RTCP packet carries at most 31 reports")]
    ErrTooManyReports,
}
