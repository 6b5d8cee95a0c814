use std::time::Duration;

/// Outcome of one finished segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentReport {
    pub id:               u32,
    pub bytes_downloaded: u64,
    /// Transient failures absorbed by this segment.
    pub retries:          u32,
}

/// Outcome of a successful `download` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub total_size:       u64,
    pub downloaded_total: u64,
    /// Ordered by segment id.
    pub segments:         Vec<SegmentReport>,
    pub elapsed:          Duration,
}

impl DownloadReport {
    pub fn retries(&self) -> u32 { self.segments.iter().map(|s| s.retries).sum() }

    /// Average throughput in bytes per second.
    pub fn average_rate_bps(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.downloaded_total as f64 / secs)
    }
}
