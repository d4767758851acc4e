//! Pass-through client for the Jaeger query API.
//!
//! One outbound request per inbound request. No retries and no timeout
//! beyond reqwest's defaults.
use axum::body::Bytes;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TraceBackend {
    client: reqwest::Client,
    base_url: String,
}

/// An upstream response body with its content type.
#[derive(Debug)]
pub struct Upstream {
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug)]
pub enum ProxyError {
    Client(reqwest::Error),
    Transport { url: String, source: reqwest::Error },
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::Client(e) => write!(f, "http client error: {e}"),
            ProxyError::Transport { source, .. } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Client(e) => Some(e),
            ProxyError::Transport { source, .. } => Some(source),
        }
    }
}

impl TraceBackend {
    pub fn new(base_url: &str) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upstream URL for `path`, with `query` appended verbatim when non-empty.
    pub fn url(&self, path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}{path}?{q}", self.base_url),
            None => format!("{}{path}", self.base_url),
        }
    }

    pub async fn get(&self, path: &str, query: Option<&str>) -> Result<Upstream, ProxyError> {
        let url = self.url(path, query);
        debug!(%url, "fetching from trace backend");

        let transport = |source: reqwest::Error| ProxyError::Transport {
            url: url.clone(),
            source,
        };
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await.map_err(transport)?;
        Ok(Upstream { content_type, body })
    }
}
