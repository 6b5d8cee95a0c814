use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::{PARTIAL_CONTENT, RetryBudget, retry_delay};
use crate::data::{ByteRange, ProgressEvent, ProgressSink, Segment, SegmentReport};
use crate::effects::http::HttpClient;
use crate::effects::sink::{OutputSink, blocking};
use crate::error::{Error, FetchError, Result};

/// Everything a worker shares with its siblings.
pub(crate) struct WorkerContext<C, S> {
    pub client:        Arc<C>,
    pub sink:          Arc<S>,
    pub progress:      Arc<dyn ProgressSink>,
    pub url:           Arc<str>,
    pub headers:       Arc<[(String, String)]>,
    pub downloaded:    Arc<AtomicU64>,
    pub cancel:        CancellationToken,
    pub max_retries:   u32,
    pub retry_backoff: Duration,
    pub chunk_size:    usize,
}

impl<C, S> Clone for WorkerContext<C, S> {
    fn clone(&self) -> Self {
        Self {
            client:        Arc::clone(&self.client),
            sink:          Arc::clone(&self.sink),
            progress:      Arc::clone(&self.progress),
            url:           Arc::clone(&self.url),
            headers:       Arc::clone(&self.headers),
            downloaded:    Arc::clone(&self.downloaded),
            cancel:        self.cancel.clone(),
            max_retries:   self.max_retries,
            retry_backoff: self.retry_backoff,
            chunk_size:    self.chunk_size,
        }
    }
}

enum AttemptError {
    Transient(String),
    Fatal(Error),
}

/// Fetches one segment into the sink, re-requesting the remainder of the
/// range after transient failures.
pub(crate) struct SegmentWorker<C, S> {
    segment: Segment,
    ctx:     WorkerContext<C, S>,
    cursor:  u64,
    retries: u32,
}

impl<C: HttpClient, S: OutputSink + 'static> SegmentWorker<C, S> {
    pub fn new(segment: Segment, ctx: WorkerContext<C, S>) -> Self {
        Self {
            segment,
            cursor: segment.start,
            ctx,
            retries: 0,
        }
    }

    pub async fn run(mut self) -> Result<SegmentReport> {
        let cancel = self.ctx.cancel.clone();
        let mut budget = RetryBudget::new(self.ctx.max_retries);
        debug!(start = self.segment.start, end = self.segment.end, "segment started");

        while self.cursor <= self.segment.end {
            let before = self.cursor;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.attempt() => outcome,
            };

            let reason = match outcome {
                Ok(()) if self.cursor > self.segment.end => break,
                Ok(()) => format!(
                    "body ended after {} of {} bytes",
                    self.cursor - self.segment.start,
                    self.segment.len()
                ),
                Err(AttemptError::Transient(reason)) => reason,
                Err(AttemptError::Fatal(e)) => return Err(e),
            };

            if self.cursor > before {
                budget.reset();
            }
            let Some(backoff) = budget.fail() else {
                warn!(attempts = budget.attempts(), error = %reason, "segment gave up");
                return Err(FetchError::ConnectionExhausted {
                    segment:    self.segment.id,
                    attempts:   budget.attempts(),
                    last_error: reason,
                }
                .into());
            };

            self.retries += 1;
            let delay = retry_delay(backoff, self.ctx.retry_backoff);
            warn!(
                cursor = self.cursor,
                attempt = budget.attempts(),
                ?delay,
                error = %reason,
                "transient failure, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        debug!(retries = self.retries, "segment complete");
        Ok(SegmentReport {
            id:               self.segment.id,
            bytes_downloaded: self.cursor - self.segment.start,
            retries:          self.retries,
        })
    }

    /// One request for `[cursor, end]`. Returns `Ok` when the body ends,
    /// whether or not the range is complete.
    async fn attempt(&mut self) -> std::result::Result<(), AttemptError> {
        let range = ByteRange {
            start: self.cursor,
            end:   self.segment.end,
        };
        let response = self
            .ctx
            .client
            .fetch_range(&self.ctx.url, &self.ctx.headers, range)
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        if response.status != PARTIAL_CONTENT {
            return Err(AttemptError::Fatal(
                FetchError::StatusMismatch {
                    segment: self.segment.id,
                    actual:  response.status,
                }
                .into(),
            ));
        }

        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AttemptError::Transient(e.to_string()))?;
            let mut offset = 0;
            while offset < chunk.len() {
                // never spill into the next segment
                let remaining = self.segment.end - self.cursor + 1;
                let take = remaining
                    .min(self.ctx.chunk_size as u64)
                    .min((chunk.len() - offset) as u64) as usize;
                self.write(chunk.slice(offset..offset + take))
                    .await
                    .map_err(AttemptError::Fatal)?;
                offset += take;
                if self.cursor > self.segment.end {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn write(&mut self, piece: Bytes) -> Result<()> {
        let len = piece.len() as u64;
        let offset = self.cursor;
        blocking(&self.ctx.sink, move |sink| sink.write_at(offset, &piece)).await?;

        self.cursor += len;
        let total = self.ctx.downloaded.fetch_add(len, Ordering::AcqRel) + len;

        self.ctx.progress.report(&ProgressEvent {
            segment_id:               self.segment.id,
            segment_bytes_downloaded: self.cursor - self.segment.start,
            total_bytes_downloaded:   total,
        });
        Ok(())
    }
}
