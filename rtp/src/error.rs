use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("RTP header size insufficient")]
    ErrHeaderSizeInsufficient,
    #[error("RTP header size insufficient for extension")]
    ErrHeaderSizeInsufficientForExtension,
    #[error("RTP version must be 2")]
    ErrBadVersion,
    #[error("RTP padding flag set with invalid padding length")]
    ErrBadPadding,
    #[error("RTP header extension payload must be a whole number of 32-bit words")]
    ErrExtensionPayloadNotAligned,
    #[error("RTP header supports at most 15 CSRC entries")]
    ErrTooManyCsrc,
    #[error("buffer too small")]
    ErrBufferTooSmall,
}
