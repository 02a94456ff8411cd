//! Minimal JSON REST client shared by the storage backends.
//!
//! Builds a request from a method, relative path, headers, query parameters
//! and an optional JSON body, then decodes the JSON response into a
//! caller-supplied type. Any non-2xx status is a terminal error carrying the
//! response body verbatim.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Per-call deadline on every backend request; expiry cancels the I/O.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Error)]
pub enum RestError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Timeout
        } else {
            RestError::Transport(err)
        }
    }
}

/// One outbound request; the REST equivalent of a prepared statement.
pub struct RestRequest<'a> {
    method: Method,
    path: &'a str,
    headers: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    timeout: Duration,
}

impl<'a> RestRequest<'a> {
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Decoded body plus the response headers, which some endpoints use as an
/// out-of-band channel (e.g. login tokens).
#[derive(Debug)]
pub struct RestResponse<T> {
    pub body: T,
    pub headers: HeaderMap,
}

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(base_url: &str) -> Result<Self, RestError> {
        let parsed = Url::parse(base_url).map_err(|e| RestError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: parsed,
        })
    }

    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RestRequest<'_>,
    ) -> Result<RestResponse<T>, RestError> {
        let url = self
            .base_url
            .join(request.path)
            .map_err(|e| RestError::InvalidUrl {
                url: request.path.to_string(),
                reason: e.to_string(),
            })?;

        let mut builder = self
            .http
            .request(request.method, url)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(RestError::Api { status, body: text });
        }

        let body = serde_json::from_str(&text).map_err(RestError::Decode)?;
        Ok(RestResponse { body, headers })
    }
}
