//! Request representation handed to the decision engine.
//!
//! # Responsibilities
//! - Carry method, path, headers, query and route parameters
//! - Hold the raw body so it can be consumed exactly once
//! - Adapt axum requests (enforcing the configured body limit)
//!
//! # Design Decisions
//! - Header lookups are case-insensitive (HeaderMap)
//! - The body is buffered by the adapter; the engine decides if and how it is parsed
//! - A second read of the body is an error, never an empty body

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::header::{self, AsHeaderName, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method};
use thiserror::Error;

/// Errors raised while obtaining the request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    #[error("request body has already been consumed")]
    Consumed,

    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("request body could not be read: {0}")]
    Unreadable(String),
}

/// Raw request body that can be taken once.
#[derive(Debug, Default)]
pub struct RequestBody {
    bytes: Option<Bytes>,
}

impl RequestBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }

    /// Length of the unread body, `None` once consumed.
    pub fn len(&self) -> Option<usize> {
        self.bytes.as_ref().map(Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len().is_some_and(|len| len == 0)
    }

    /// Take the body bytes, failing if they were taken before.
    pub fn take(&mut self) -> Result<Bytes, BodyError> {
        self.bytes.take().ok_or(BodyError::Consumed)
    }
}

/// Everything about a request except its body.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    /// Parameters extracted by the router (e.g. `id`).
    pub params: HashMap<String, String>,
}

impl RequestHead {
    /// Header value as text; non-visible-ASCII values are treated as absent.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A parsed request: head plus a once-readable body.
#[derive(Debug)]
pub struct Request {
    pub head: RequestHead,
    pub body: RequestBody,
}

impl Request {
    /// Request with no headers and an empty body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            head: RequestHead {
                method,
                path: path.into(),
                headers: HeaderMap::new(),
                query: HashMap::new(),
                params: HashMap::new(),
            },
            body: RequestBody::empty(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.head.headers.insert(name, value);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.head.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = RequestBody::new(bytes);
        self
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn into_parts(self) -> (RequestHead, RequestBody) {
        (self.head, self.body)
    }

    /// Adapt an axum request, buffering at most `limit` body bytes.
    pub async fn from_http(
        request: axum::extract::Request,
        params: HashMap<String, String>,
        query: HashMap<String, String>,
        limit: usize,
    ) -> Result<Self, BodyError> {
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(BodyError::TooLarge { limit });
        }

        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| BodyError::Unreadable(e.to_string()))?;

        Ok(Self {
            head: RequestHead {
                method: parts.method,
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                query,
                params,
            },
            body: RequestBody::new(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_body_is_read_once() {
        let mut body = RequestBody::new("payload");
        assert_eq!(body.len(), Some(7));

        assert_eq!(body.take().unwrap(), Bytes::from("payload"));
        assert_eq!(body.take(), Err(BodyError::Consumed));
        assert_eq!(body.len(), None);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = Request::new(Method::GET, "/x")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/plain"));
        assert_eq!(request.head.header("ACCEPT"), Some("text/plain"));
        assert_eq!(request.head.header("accept"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_from_http() {
        let http = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/entries?verbose=1")
            .header("content-type", "application/json")
            .body(Body::from("{\"a\":1}"))
            .unwrap();

        let query = HashMap::from([("verbose".to_string(), "1".to_string())]);
        let request = Request::from_http(http, HashMap::new(), query, 1024)
            .await
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.head.path, "/entries");
        assert_eq!(request.head.query("verbose"), Some("1"));
        assert_eq!(request.body.len(), Some(7));
    }

    #[tokio::test]
    async fn test_from_http_rejects_declared_oversize() {
        let http = axum::http::Request::builder()
            .method(Method::PUT)
            .uri("/entries/1")
            .header("content-length", "4096")
            .body(Body::from(vec![0u8; 4096]))
            .unwrap();

        let result = Request::from_http(http, HashMap::new(), HashMap::new(), 16).await;
        assert_eq!(result.unwrap_err(), BodyError::TooLarge { limit: 16 });
    }
}
