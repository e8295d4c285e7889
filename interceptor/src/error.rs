use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("buffer size must be greater than zero")]
    ErrInvalidSize,
    #[error("RTX payload too short to carry the original sequence number")]
    ErrShortRtxPayload,
}
