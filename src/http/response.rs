//! Outcome of a decision-graph walk.
//!
//! # Responsibilities
//! - Carry status, headers and the rendered body
//! - Convert into an axum response for the wire
//!
//! # Design Decisions
//! - Bodies are rendered by the engine before the outcome is built
//! - 204, 304 and HEAD outcomes never carry a body

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// Structured response produced by the decision engine.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Outcome {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Plain-text outcome used when no representation could be rendered.
    pub fn plain(status: StatusCode, message: &'static str) -> Self {
        Self::new(status)
            .with_header(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain;charset=utf-8"),
            )
            .with_body(Bytes::from_static(message.as_bytes()))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as UTF-8 text, if any.
    pub fn text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
