//! I/O side of segmented fetching.
//!
//! The HTTP client abstraction, output sinks, the per-segment worker and the
//! session that drives them.

mod http;
mod session;
mod sink;
mod worker;

pub use http::{BoxStream, HttpClient, ProbeResponse, RangeResponse};
pub use session::{DownloadSession, SessionState};
pub use sink::{FileSink, MemorySink, OutputSink};
#[cfg(feature = "reqwest")]
pub use http::{ClientSetting, ReqwestClient, Url};
