use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::data::ByteRange;

/// A boxed stream type for HTTP response bodies.
///
/// The stream yields `Result<Bytes, E>` where E is the error type from the HTTP client.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status:         u16,
    /// Parsed `Content-Length`, `None` when absent or unparsable.
    pub content_length: Option<u64>,
    /// Raw `Accept-Ranges` value.
    pub accept_ranges:  Option<String>,
}

/// Response to a ranged GET: status plus the streaming body.
pub struct RangeResponse<E> {
    pub status: u16,
    pub body:   BoxStream<'static, Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// The client is the network session of a download: it is owned by the
/// session for its whole lifetime and dropped when the session closes.
/// Every error it returns is treated as a transient connection failure by
/// the segment workers.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a HEAD request and report status, length and range support.
    ///
    /// Must not fail on a non-success status; the status is returned for the
    /// caller to judge.
    fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<ProbeResponse, Self::Error>> + Send;

    /// Issue a GET restricted to `range` and return the body as a stream.
    fn fetch_range(
        &self,
        url: &str,
        headers: &[(String, String)],
        range: ByteRange,
    ) -> impl Future<Output = Result<RangeResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderName, RANGE};
    use reqwest::{Client, Proxy, RequestBuilder, Url};

    use super::*;
    use crate::core::parse_content_length;

    /// Settings for building the underlying `reqwest::Client`.
    ///
    /// `read_timeout` bounds the silence between two reads of a body. A stalled
    /// range then surfaces as a transport error, which the segment worker
    /// retries, instead of hanging forever.
    #[derive(Debug, Clone, Default)]
    pub struct ClientSetting {
        pub proxies:         Option<Vec<Url>>,
        pub connect_timeout: Option<Duration>,
        pub read_timeout:    Option<Duration>,
    }

    impl ClientSetting {
        pub fn build(self) -> reqwest::Result<Client> {
            let mut cb = Client::builder();

            if let Some(proxies) = self.proxies {
                let (secure, insecure): (Vec<Url>, Vec<Url>) =
                    proxies.into_iter().partition(|u| u.scheme() == "https");

                for u in secure {
                    cb = cb.proxy(Proxy::https(u)?);
                }

                for u in insecure {
                    cb = cb.proxy(Proxy::http(u)?);
                }
            }

            if let Some(timeout) = self.connect_timeout {
                cb = cb.connect_timeout(timeout);
            }
            if let Some(timeout) = self.read_timeout {
                cb = cb.read_timeout(timeout);
            }

            cb.build()
        }
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> reqwest::Result<Self> { Self::with_setting(ClientSetting::default()) }

        pub fn with_setting(setting: ClientSetting) -> reqwest::Result<Self> {
            Ok(Self {
                client: setting.build()?,
            })
        }

        fn apply(mut request: RequestBuilder, headers: &[(String, String)]) -> RequestBuilder {
            for (key, value) in headers {
                request = request.header(key, value);
            }
            request
        }
    }

    impl From<Client> for ReqwestClient {
        fn from(client: Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn head(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<ProbeResponse, Self::Error> {
            let response = Self::apply(self.client.head(url), headers).send().await?;
            let header = |name: HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };

            // `Response::content_length` reports the body size hint, which is
            // zero for HEAD, so the header is read directly.
            Ok(ProbeResponse {
                status:         response.status().as_u16(),
                content_length: header(CONTENT_LENGTH).as_deref().and_then(parse_content_length),
                accept_ranges:  header(ACCEPT_RANGES),
            })
        }

        async fn fetch_range(
            &self,
            url: &str,
            headers: &[(String, String)],
            range: ByteRange,
        ) -> Result<RangeResponse<Self::Error>, Self::Error> {
            let response = Self::apply(self.client.get(url), headers)
                .header(RANGE, range.header_value())
                .send()
                .await?;

            Ok(RangeResponse {
                status: response.status().as_u16(),
                body:   response.bytes_stream().boxed(),
            })
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest::Url;
#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSetting, ReqwestClient};
