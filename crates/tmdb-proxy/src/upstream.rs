use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

/// One GET against the TMDB v3 API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// TMDB answered with a non-success status.
    #[error("TMDB API error: {0}")]
    Status(u16),

    #[error("TMDB request failed: {0}")]
    Transport(String),

    /// The body was not JSON, or not in the shape the action expects.
    #[error("unexpected TMDB response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Source of raw TMDB JSON. The proxy holds it as a trait object so tests can
/// count and script upstream calls.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, UpstreamError>;
}

/// Bearer-token TMDB client over `reqwest`.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl Upstream for TmdbClient {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint.path);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .query(&endpoint.query)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
