// # reqwest HTTP Transport
//
// This crate provides the production `HttpClient` implementation for skycache.
//
// ## Contract
//
// - Exactly one request per `get()` call
// - Transport failures (DNS, connect, timeout, body read) are `Err`
// - Every status code, 2xx or not, is handed back as `Ok(HttpResponse)`
// - No retries, no caching: the refresh orchestrator owns both decisions
//
// ## Body Handling
//
// Bodies served as `application/json` are decoded here and returned as
// `ResponseBody::Json`. Anything else, including JSON content types whose
// body does not parse, is returned as `ResponseBody::Text` so the caller
// can decide what it means.
//
// ## Security Requirements
//
// - Request URLs may carry credentials in the query string and are NEVER logged
//   in full; only the host is

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use skycache_core::traits::{HttpClient, HttpResponse, ResponseBody};
use skycache_core::{Error, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("skycache/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed HTTP transport
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let host = host_of(url);
        tracing::trace!("GET {}", host);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", host, describe(&e))))?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let text = response.text().await.map_err(|e| {
            Error::http(format!("Failed to read response from {}: {}", host, describe(&e)))
        })?;

        tracing::debug!("{} answered {} ({} bytes)", host, status, text.len());

        Ok(HttpResponse {
            status,
            body: decode_body(text, is_json),
        })
    }

    fn client_name(&self) -> &'static str {
        "reqwest"
    }
}

fn decode_body(text: String, is_json: bool) -> ResponseBody {
    if text.is_empty() {
        return ResponseBody::Empty;
    }
    if is_json {
        match serde_json::from_str(&text) {
            Ok(value) => return ResponseBody::Json(value),
            Err(e) => tracing::debug!("JSON content type but body did not parse: {}", e),
        }
    }
    ResponseBody::Text(text)
}

/// Scheme and host of `url`, without path or query
fn host_of(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    let end = url[after_scheme..]
        .find(['/', '?'])
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    &url[..end]
}

// reqwest errors print the full URL; strip it so query credentials stay out of logs
fn describe(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "body error"
    } else {
        "request error"
    };
    match std::error::Error::source(err) {
        Some(source) => format!("{}: {}", kind, source),
        None => kind.to_string(),
    }
}
