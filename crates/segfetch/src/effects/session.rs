use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::core::{check_probe, plan_segments};
use crate::data::{DownloadReport, FetchOptions, ProgressSink, SegmentPlan, SegmentReport};
use crate::effects::http::HttpClient;
use crate::effects::sink::{OutputSink, blocking};
use crate::effects::worker::{SegmentWorker, WorkerContext};
use crate::error::{Error, ProbeError, Result};

/// Lifecycle of a [`DownloadSession`].
///
/// `Uninitialized → Probing → Ready → Downloading → {Completed | Failed} → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Probing,
    Ready,
    Downloading,
    Completed,
    Failed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Probing => "Probing",
            SessionState::Ready => "Ready",
            SessionState::Downloading => "Downloading",
            SessionState::Completed => "Completed",
            SessionState::Failed => "Failed",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// A probed, preallocated download of one resource.
///
/// The session owns the HTTP client and the sink. Both are released when the
/// session is closed or dropped, on every path: success, error, or the
/// owning future being cancelled.
pub struct DownloadSession<C: HttpClient, S: OutputSink> {
    client:     Arc<C>,
    sink:       Arc<S>,
    url:        Arc<str>,
    headers:    Arc<[(String, String)]>,
    options:    FetchOptions,
    total_size: u64,
    downloaded: Arc<AtomicU64>,
    cancel:     CancellationToken,
    state:      SessionState,
}

impl<C, S> DownloadSession<C, S>
where
    C: HttpClient + 'static,
    S: OutputSink + 'static,
{
    /// Probe `url` and preallocate `sink` to the reported size.
    ///
    /// On failure the client is dropped before the error is returned and the
    /// sink is left untouched.
    pub async fn open(
        client: C,
        url: impl Into<String>,
        sink: S,
        options: FetchOptions,
    ) -> Result<Self> {
        if options.segments == 0 {
            return Err(Error::InvalidSegmentCount);
        }

        let url: String = url.into();
        let mut session = Self {
            client: Arc::new(client),
            sink: Arc::new(sink),
            url: Arc::from(url),
            headers: Arc::from(options.effective_headers()),
            options,
            total_size: 0,
            downloaded: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
            state: SessionState::Uninitialized,
        };

        match session.probe().await {
            Ok(()) => Ok(session),
            Err(e) => {
                warn!(url = %session.url, error = %e, "probe failed");
                session.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Open, download and close in one call. The session is closed on every
    /// path before this returns.
    pub async fn run<P>(
        client: C,
        url: impl Into<String>,
        sink: S,
        options: FetchOptions,
        progress: P,
    ) -> Result<DownloadReport>
    where
        P: ProgressSink + 'static,
    {
        let mut session = Self::open(client, url, sink, options).await?;
        let result = session.download(progress).await;
        let closed = session.close().await;
        let report = result?;
        closed?;
        Ok(report)
    }

    /// Flush the sink and release the client.
    pub async fn close(mut self) -> Result<()> {
        let flushed = blocking(&self.sink, |sink| sink.flush()).await;
        self.transition(SessionState::Closed);
        flushed
    }

    async fn probe(&mut self) -> Result<()> {
        self.transition(SessionState::Probing);

        let response = self
            .client
            .head(&self.url, &self.headers)
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        self.total_size = check_probe(&response)?;

        let total_size = self.total_size;
        blocking(&self.sink, move |sink| sink.preallocate(total_size)).await?;
        info!(url = %self.url, total_size = self.total_size, "session ready");
        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Fetch every segment concurrently.
    ///
    /// The first fatal error cancels and drains all sibling workers before it
    /// is returned. Bytes already written stay in the sink.
    pub async fn download<P>(&mut self, progress: P) -> Result<DownloadReport>
    where
        P: ProgressSink + 'static,
    {
        if self.state != SessionState::Ready {
            return Err(Error::InvalidState(format!("cannot download while {}", self.state)));
        }

        let plan = self.plan()?;
        self.transition(SessionState::Downloading);
        let started = Instant::now();

        match self.run_workers(&plan, Arc::new(progress)).await {
            Ok(mut segments) => {
                segments.sort_by_key(|s| s.id);
                let report = DownloadReport {
                    total_size: self.total_size,
                    downloaded_total: self.downloaded_total(),
                    segments,
                    elapsed: started.elapsed(),
                };
                info!(
                    total_size = report.total_size,
                    retries = report.retries(),
                    elapsed = ?report.elapsed,
                    "download complete"
                );
                self.transition(SessionState::Completed);
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, downloaded = self.downloaded_total(), "download failed");
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn run_workers(
        &self,
        plan: &SegmentPlan,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Vec<SegmentReport>> {
        let ctx = WorkerContext {
            client: Arc::clone(&self.client),
            sink: Arc::clone(&self.sink),
            progress,
            url: Arc::clone(&self.url),
            headers: Arc::clone(&self.headers),
            downloaded: Arc::clone(&self.downloaded),
            cancel: self.cancel.clone(),
            max_retries: self.options.max_retries,
            retry_backoff: self.options.retry_backoff,
            chunk_size: self.options.chunk_size.max(1),
        };

        let mut workers = JoinSet::new();
        for segment in plan.iter() {
            let span = info_span!("segment", id = segment.id);
            let worker = SegmentWorker::new(*segment, ctx.clone());
            workers.spawn(worker.run().instrument(span));
        }
        debug!(segments = workers.len(), "workers spawned");

        let deadline = self.options.total_timeout.map(|limit| Instant::now() + limit);
        let timeout = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);

        let mut reports = Vec::with_capacity(workers.len());
        let outcome = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Err(Error::Cancelled),
                _ = &mut timeout => break Err(Error::Timeout),
                joined = workers.join_next() => match joined {
                    None => break Ok(()),
                    Some(Ok(Ok(report))) => reports.push(report),
                    Some(Ok(Err(e))) => break Err(e),
                    Some(Err(e)) => break Err(Error::Worker(e.to_string())),
                },
            }
        };

        if let Err(e) = outcome {
            self.cancel.cancel();
            workers.shutdown().await;
            return Err(e);
        }
        Ok(reports)
    }
}

impl<C: HttpClient, S: OutputSink> DownloadSession<C, S> {
    /// Segment boundaries for the probed size.
    pub fn plan(&self) -> Result<SegmentPlan> { plan_segments(self.total_size, self.options.segments) }

    /// Token that stops the running download with [`Error::Cancelled`].
    pub fn cancel_token(&self) -> CancellationToken { self.cancel.clone() }

    pub fn state(&self) -> SessionState { self.state }

    pub fn url(&self) -> &str { &self.url }

    pub fn total_size(&self) -> u64 { self.total_size }

    pub fn bytes_per_segment(&self) -> u64 { self.total_size.div_ceil(u64::from(self.options.segments)) }

    pub fn downloaded_total(&self) -> u64 { self.downloaded.load(Ordering::Acquire) }

    pub fn options(&self) -> &FetchOptions { &self.options }

    pub fn sink(&self) -> &S { &self.sink }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state");
        self.state = next;
    }
}

impl<C: HttpClient, S: OutputSink> Drop for DownloadSession<C, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.state != SessionState::Closed {
            self.transition(SessionState::Closed);
        }
    }
}

impl<C: HttpClient, S: OutputSink> fmt::Debug for DownloadSession<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadSession")
            .field("url", &self.url)
            .field("total_size", &self.total_size)
            .field("segments", &self.options.segments)
            .field("downloaded", &self.downloaded_total())
            .field("state", &self.state)
            .finish()
    }
}
