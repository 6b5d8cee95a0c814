//! Immutable data types for segmented downloads.
//!
//! Configuration, segment boundaries and progress snapshots. Nothing in here
//! performs I/O.

pub mod options;
pub mod progress;
pub mod report;
pub mod segment;

pub use options::{DEFAULT_CHUNK_SIZE, DEFAULT_SEGMENTS, FetchOptions};
pub use progress::{NoopProgress, ProgressEvent, ProgressSink};
pub use report::{DownloadReport, SegmentReport};
pub use segment::{ByteRange, Segment, SegmentPlan};
