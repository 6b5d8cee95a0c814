//! Segmented HTTP downloading.
//!
//! A resource is probed once for its size and range support, split into
//! contiguous byte ranges, and every range is fetched by its own task that
//! writes straight into its position of a preallocated sink.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Example
//!
//! ```no_run
//! use segfetch::{DownloadSession, FetchOptions, FileSink, NoopProgress, ReqwestClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReqwestClient::new()?;
//! let sink = FileSink::create("archive.tar.gz")?;
//! let report = DownloadSession::run(
//!     client,
//!     "https://example.com/archive.tar.gz",
//!     sink,
//!     FetchOptions::default().segments(8),
//!     NoopProgress,
//! )
//! .await?;
//! println!("{} bytes", report.downloaded_total);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod headers;

pub use data::{
    ByteRange, DownloadReport, FetchOptions, NoopProgress, ProgressEvent, ProgressSink, Segment,
    SegmentPlan, SegmentReport,
};
pub use effects::{
    BoxStream, DownloadSession, FileSink, HttpClient, MemorySink, OutputSink, ProbeResponse,
    RangeResponse, SessionState,
};
#[cfg(feature = "reqwest")]
pub use effects::{ClientSetting, ReqwestClient, Url};

pub use error::{Error, FetchError, ProbeError, Result};
