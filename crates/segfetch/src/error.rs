//! Error types for segfetch.

use std::io;
use thiserror::Error;

/// Failures of the capability probe. All of them are fatal and happen before
/// the sink is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe expected HTTP 200, got {actual}")]
    StatusMismatch { actual: u16 },

    #[error("server did not report a Content-Length")]
    MissingLength,

    #[error("server does not advertise 'bytes' in Accept-Ranges")]
    RangeUnsupported,

    #[error("probe request failed: {0}")]
    Request(String),
}

/// Fatal failures of a single segment worker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("segment {segment}: expected HTTP 206, got {actual}")]
    StatusMismatch { segment: u32, actual: u16 },

    #[error("segment {segment}: connection failed {attempts} times in a row: {last_error}")]
    ConnectionExhausted {
        segment:    u32,
        attempts:   u32,
        last_error: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("output sink error: {0}")]
    Sink(#[source] io::Error),

    #[error("segment count must be greater than 0")]
    InvalidSegmentCount,

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("download timed out")]
    Timeout,

    #[error("segment worker failed: {0}")]
    Worker(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self { Error::Sink(e) }
}

pub type Result<T> = std::result::Result<T, Error>;
