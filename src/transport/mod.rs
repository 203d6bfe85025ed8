//! HTTP transport seam
//!
//! The feed only needs to issue GET/PUT/DELETE requests and read the status,
//! body and `Link` header of the reply. [`Transport`] exposes exactly that so
//! the controller can run against `reqwest` in production and a scripted
//! transport in tests.

mod reqwest_client;

pub use reqwest_client::ReqwestTransport;

use crate::error::{FeedError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// A minimal HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Response headers (lowercase keys)
    pub headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// 200 response with a JSON body
    pub fn json_body(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            body: value.to_string().into_bytes(),
            headers: Vec::new(),
        }
    }

    /// Add a header, builder style
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_lowercase(), value.into()));
        self
    }

    /// Look up a response header by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k == &lower)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated header, joined with `", "` as if folded
    /// into one field
    pub fn joined_header(&self, name: &str) -> Option<String> {
        let lower = name.to_lowercase();
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(k, _)| k == &lower)
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for an empty or whitespace-only body
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Fail with [`FeedError::Server`] unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(FeedError::Server {
            status: self.status,
            message: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Issues HTTP requests for the feed and session controllers
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a body-less request to an absolute URL
    async fn send(&self, method: Method, url: &str) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::default().with_header("Link", "<https://x/p2>; rel=next");
        assert_eq!(response.header("link"), Some("<https://x/p2>; rel=next"));
        assert_eq!(response.header("LINK"), Some("<https://x/p2>; rel=next"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let response = HttpResponse::default()
            .with_header("Link", "<https://x/p1>; rel=prev")
            .with_header("link", "<https://x/p3>; rel=next");
        assert_eq!(
            response.joined_header("Link").as_deref(),
            Some("<https://x/p1>; rel=prev, <https://x/p3>; rel=next")
        );
        assert_eq!(response.joined_header("etag"), None);
    }

    #[test]
    fn test_error_for_status_keeps_body() {
        let response = HttpResponse {
            status: 503,
            body: b"down for maintenance".to_vec(),
            headers: Vec::new(),
        };
        match response.error_for_status() {
            Err(FeedError::Server { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "down for maintenance");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body() {
        assert!(HttpResponse::default().is_empty());
        assert!(HttpResponse { body: b" \n".to_vec(), ..Default::default() }.is_empty());
        assert!(!HttpResponse::json_body(&serde_json::json!({})).is_empty());
    }
}
