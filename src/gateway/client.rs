use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
}

/// Raw upstream answer before any status or caching policy is applied.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn ok(content_type: Option<&str>, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(|s| s.to_string()),
            body: Bytes::copy_from_slice(body),
        }
    }

    pub fn with_status(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::copy_from_slice(body),
        }
    }
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<GatewayResponse, TransportError>;
}

/// reqwest-backed transport with a uniform per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<GatewayResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(GatewayResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Scripted transport for tests: outcomes are queued per gateway base URL and
/// every fetch is logged. The last queued outcome for a base is sticky.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<GatewayResponse, TransportError>>>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, base: &str, outcome: Result<GatewayResponse, TransportError>) {
        let mut responses = self.responses.lock().await;
        responses
            .entry(base.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub async fn enqueue_ok(&self, base: &str, content_type: Option<&str>, body: &[u8]) {
        self.enqueue(base, Ok(GatewayResponse::ok(content_type, body)))
            .await;
    }

    pub async fn enqueue_status(&self, base: &str, status: u16) {
        self.enqueue(base, Ok(GatewayResponse::with_status(status, b"")))
            .await;
    }

    pub async fn enqueue_error(&self, base: &str, error: TransportError) {
        self.enqueue(base, Err(error)).await;
    }

    /// Artificial latency applied to every fetch, for in-flight overlap tests.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl GatewayTransport for MockTransport {
    async fn fetch(&self, url: &str) -> Result<GatewayResponse, TransportError> {
        self.calls.lock().await.push(url.to_string());

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().await;
        for (base, queue) in responses.iter_mut() {
            if url.starts_with(base.as_str()) {
                if queue.len() > 1 {
                    return queue.pop_front().expect("queue checked non-empty");
                }
                if let Some(outcome) = queue.front() {
                    return outcome.clone();
                }
            }
        }

        Err(TransportError::Network(format!(
            "no scripted response for {}",
            url
        )))
    }
}
