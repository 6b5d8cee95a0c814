use std::sync::Arc;
use std::time::Duration;

/// Segment count used when the caller does not pick one.
pub const DEFAULT_SEGMENTS: u32 = 10;

/// Upper bound on the size of a single write and progress report.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Configuration for a segmented download.
///
/// # Examples
///
/// ```
/// use segfetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .segments(4)
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(200))
///     .header("Authorization", "Bearer token");
/// assert_eq!(options.segments, 4);
/// ```
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Number of byte ranges requested from the planner.
    ///
    /// Default: 10
    pub segments: u32,

    /// Consecutive transient failures a segment may absorb before the
    /// download fails with `ConnectionExhausted`.
    ///
    /// - The counter resets whenever an attempt writes at least one byte
    /// - Total attempts without progress = 1 (initial) + max_retries
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries.
    ///
    /// Retry N waits `retry_backoff * 2^(N-1)`.
    ///
    /// Default: 100ms
    pub retry_backoff: Duration,

    /// Maximum bytes handed to the sink and progress sink per step.
    ///
    /// Default: 8 KiB
    pub chunk_size: usize,

    /// Wall-clock limit for the whole `download` call.
    ///
    /// Default: None
    pub total_timeout: Option<Duration>,

    /// Custom HTTP headers, merged over the presets when
    /// `use_default_headers` is set.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Whether [`crate::headers::default_headers`] is sent underneath
    /// `headers`.
    ///
    /// Default: true
    pub use_default_headers: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            segments:            DEFAULT_SEGMENTS,
            max_retries:         3,
            retry_backoff:       Duration::from_millis(100),
            chunk_size:          DEFAULT_CHUNK_SIZE,
            total_timeout:       None,
            headers:             Arc::new([]),
            use_default_headers: true,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn segments(mut self, segments: u32) -> Self {
        self.segments = segments;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Set the chunk size. Zero is bumped to one byte.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn total_timeout(mut self, total_timeout: Option<Duration>) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    /// Add a single custom HTTP header.
    ///
    /// # Examples
    ///
    /// ```
    /// use segfetch::FetchOptions;
    ///
    /// let options = FetchOptions::default()
    ///     .header("Referer", "https://example.com/")
    ///     .header("User-Agent", "segfetch/0.1");
    /// assert_eq!(options.headers.len(), 2);
    /// ```
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom headers at once.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn use_default_headers(mut self, enabled: bool) -> Self {
        self.use_default_headers = enabled;
        self
    }

    /// Headers actually sent with every request.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        if self.use_default_headers {
            crate::headers::merge(&crate::headers::default_headers(), &self.headers)
        } else {
            self.headers.to_vec()
        }
    }
}
