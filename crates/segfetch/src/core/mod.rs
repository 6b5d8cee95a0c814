//! Pure transformations for segmented fetching.
//!
//! Range planning, probe evaluation and retry arithmetic. Nothing in here
//! touches the network or the sink.

mod retry;
mod segment;
mod validation;

pub use retry::{RetryBudget, retry_delay};
pub use segment::plan_segments;
pub use validation::{
    PARTIAL_CONTENT, PROBE_STATUS, accepts_byte_ranges, check_probe, parse_content_length,
};
