//! HTTP transport seam between engines and the network

use super::engine::{BackendError, BackendResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    /// Newline-delimited JSON, already serialized
    NdJson(String),
}

/// A request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
    /// Overrides the transport's default timeout
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn queries<'a>(mut self, params: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        self.query.extend(params.into_iter().cloned());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn ndjson(mut self, body: String) -> Self {
        self.body = Some(Body::NdJson(body));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail on non-2xx, otherwise hand the response back
    pub fn ok(self) -> BackendResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BackendError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json(&self) -> BackendResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends requests to one backend host.
///
/// Non-2xx statuses are returned as responses, not errors; engines decide
/// which statuses are meaningful (e.g. 404 from an existence check).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> BackendResult<HttpResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> BackendResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let url = self.url(&request.path);
        debug!(method = ?request.method, url = %url, "backend request");

        let mut builder = self
            .client
            .request(method, &url)
            .query(&request.query)
            .timeout(request.timeout.unwrap_or(self.timeout));
        builder = match request.body {
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::NdJson(text)) => builder.header(reqwest::header::CONTENT_TYPE, "application/x-ndjson").body(text),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| classify(&url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(&url, e))?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(url: &str, error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout(url.to_string())
    } else {
        BackendError::Transport(error.to_string())
    }
}
