use std::sync::Arc;

/// Snapshot handed to a [`ProgressSink`] after every chunk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based segment id.
    pub segment_id: u32,

    /// Bytes of this segment written so far.
    pub segment_bytes_downloaded: u64,

    /// Bytes written by all segments of the download so far.
    pub total_bytes_downloaded: u64,
}

/// Receiver of per-chunk progress.
///
/// `report` is invoked synchronously from the worker that wrote the chunk,
/// so implementations should return quickly.
///
/// Any `Fn(&ProgressEvent) + Send + Sync` closure is a `ProgressSink`:
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use segfetch::{ProgressEvent, ProgressSink};
///
/// let seen = AtomicU64::new(0);
/// let sink = |event: &ProgressEvent| {
///     seen.store(event.total_bytes_downloaded, Ordering::Relaxed);
/// };
/// sink.report(&ProgressEvent {
///     segment_id: 1,
///     segment_bytes_downloaded: 10,
///     total_bytes_downloaded: 10,
/// });
/// assert_eq!(seen.load(Ordering::Relaxed), 10);
/// ```
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Progress sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _: &ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) { self(event) }
}

impl<P: ProgressSink + ?Sized> ProgressSink for Arc<P> {
    fn report(&self, event: &ProgressEvent) { (**self).report(event) }
}
