use crate::metrics::Metrics;
use crate::models::{AppConfig, LoadedImage};
use futures_core::Stream;
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;

/// Everything that can end a fetch without a payload
///
/// The variants exist for logs and diagnostics. Callers that publish to the
/// state holder treat them all the same way: as one failure with a message.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Payload from {url} is not a decodable image: {reason}")]
    Decode { url: String, reason: String },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// One unit of work for the loader: the resource to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse a request from text; only well-formedness is checked.
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        Url::parse(url)
            .map(Self::new)
            .map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Accept a response only if the status is 2xx and the body decodes as an image.
pub fn handle_response(
    url: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<LoadedImage, FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let format = image::guess_format(body).ok();
    let pixels = image::load_from_memory(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(LoadedImage::new(url, format, body.len(), pixels))
}

/// Fetches and decodes one image per call
///
/// [`fetch()`](Self::fetch) is the only implementation; the callback and stream
/// forms wrap it, so all three produce identical outcomes.
///
/// There is no cancellation: once started, a fetch always runs to one terminal
/// result. An optional timeout turns a stalled request into a failure.
#[derive(Clone)]
pub struct ImageLoader {
    client: Client,
    request_timeout: Option<Duration>,
    metrics: Arc<Metrics>,
}

impl ImageLoader {
    pub fn new(config: &AppConfig, metrics: Arc<Metrics>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout(),
            metrics,
        })
    }

    /// Fetch and decode one image.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<LoadedImage, FetchError> {
        self.metrics.record_fetch_started();
        let start = Instant::now();
        let url = request.url().as_str();

        tracing::debug!(url, "Fetch started");

        let result = match self.request_timeout {
            Some(limit) => timeout(limit, self.do_fetch(request))
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Timeout {
                        url: url.to_string(),
                        timeout: limit,
                    })
                }),
            None => self.do_fetch(request).await,
        };

        let elapsed = start.elapsed();
        self.metrics.record_fetch_finished(result.is_ok(), elapsed);

        match &result {
            Ok(image) => tracing::info!(
                url,
                elapsed_ms = elapsed.as_millis() as u64,
                "Fetched {}",
                image.describe()
            ),
            Err(e) => tracing::warn!(url, elapsed_ms = elapsed.as_millis() as u64, "Fetch failed: {}", e),
        }

        result
    }

    async fn do_fetch(&self, request: &FetchRequest) -> Result<LoadedImage, FetchError> {
        let url = request.url().as_str();
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(request.url().clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;
        handle_response(url, status, &body)
    }

    /// Run the fetch on `runtime` and hand the result to `callback` exactly once.
    ///
    /// The callback runs on a runtime worker, not on the main context.
    pub fn fetch_with_callback<F>(
        &self,
        request: FetchRequest,
        runtime: &tokio::runtime::Handle,
        callback: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(Result<LoadedImage, FetchError>) + Send + 'static,
    {
        let loader = self.clone();
        runtime.spawn(async move {
            let result = loader.fetch(&request).await;
            callback(result);
        })
    }

    /// A stream that yields the fetch result once and then ends.
    ///
    /// Nothing happens until the stream is polled.
    pub fn fetch_stream(&self, request: FetchRequest) -> FetchStream {
        let loader = self.clone();
        FetchStream {
            pending: Some(Box::pin(async move { loader.fetch(&request).await })),
        }
    }
}

type PendingFetch = Pin<Box<dyn Future<Output = Result<LoadedImage, FetchError>> + Send>>;

/// Single-item stream over one fetch
pub struct FetchStream {
    pending: Option<PendingFetch>,
}

impl FetchStream {
    /// Await the next item without pulling in a stream combinator crate.
    pub async fn next(&mut self) -> Option<Result<LoadedImage, FetchError>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    pub fn is_terminated(&self) -> bool {
        self.pending.is_none()
    }
}

impl Stream for FetchStream {
    type Item = Result<LoadedImage, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(pending) = self.pending.as_mut() else {
            return Poll::Ready(None);
        };

        match pending.as_mut().poll(cx) {
            Poll::Ready(result) => {
                self.pending = None;
                Poll::Ready(Some(result))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.pending.is_some() {
            (1, Some(1))
        } else {
            (0, Some(0))
        }
    }
}
