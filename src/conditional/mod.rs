//! Conditional request subsystem.
//!
//! # Data Flow
//! ```text
//! Entry (or resource-defined functions)
//!     → Validators { etag, last_modified }
//!     → ConditionalEvaluator::check(method, headers)
//!         If-Match / If-Unmodified-Since   → 412 (unsafe methods)
//!         If-None-Match                    → 304 (safe) / 412 (unsafe)
//!         If-Modified-Since                → 304 (safe, only without If-None-Match)
//!     → Precondition
//! ```
//!
//! # Design Decisions
//! - Entity-tag checks always take precedence over date checks
//! - If-Match uses strong comparison, If-None-Match weak comparison
//! - Last-Modified is compared at whole-second granularity

pub mod date;
pub mod etag;

use axum::http::{header, HeaderMap, Method};
use chrono::{DateTime, Utc};

pub use date::{format_http_date, parse_http_date, quantize};
pub use etag::{ETag, TagList};

/// Verdict of the precondition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Proceed,
    NotModified,
    PreconditionFailed,
}

/// Current validators of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<ETag>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Evaluates `If-*` request headers against a resource's validators.
pub struct ConditionalEvaluator;

impl ConditionalEvaluator {
    /// Check the preconditions of a request against an existing resource.
    pub fn check(method: &Method, headers: &HeaderMap, validators: &Validators) -> Precondition {
        let safe = is_safe(method);
        let etag = validators.etag.as_ref();

        if let Some(if_match) = header_str(headers, header::IF_MATCH) {
            if !safe && !TagList::parse(if_match).matches_strong(etag) {
                return Precondition::PreconditionFailed;
            }
        } else if let Some(since) = header_str(headers, header::IF_UNMODIFIED_SINCE) {
            if let (false, Some(since), Some(modified)) =
                (safe, parse_http_date(since), validators.last_modified)
            {
                if modified > since {
                    return Precondition::PreconditionFailed;
                }
            }
        }

        if let Some(if_none_match) = header_str(headers, header::IF_NONE_MATCH) {
            if TagList::parse(if_none_match).matches_weak(etag) {
                return if safe {
                    Precondition::NotModified
                } else {
                    Precondition::PreconditionFailed
                };
            }
            return Precondition::Proceed;
        }

        if let Some(since) = header_str(headers, header::IF_MODIFIED_SINCE) {
            if let (true, Some(since), Some(modified)) =
                (safe, parse_http_date(since), validators.last_modified)
            {
                if since <= Utc::now() && modified <= since {
                    return Precondition::NotModified;
                }
            }
        }

        Precondition::Proceed
    }

    /// Whether the write preconditions name one exact representation.
    ///
    /// `If-Match: *` accepts any current representation and pins nothing.
    pub fn pins_version(headers: &HeaderMap) -> bool {
        match header_str(headers, header::IF_MATCH).map(TagList::parse) {
            Some(TagList::Any) => false,
            Some(_) => true,
            None => headers.contains_key(header::IF_UNMODIFIED_SINCE),
        }
    }

    /// Check the preconditions of a request against a missing resource.
    ///
    /// `If-Match: *` requires a current representation to exist.
    pub fn check_missing(headers: &HeaderMap) -> Precondition {
        match header_str(headers, header::IF_MATCH).map(TagList::parse) {
            Some(TagList::Any) => Precondition::PreconditionFailed,
            _ => Precondition::Proceed,
        }
    }
}

/// GET and HEAD.
pub fn is_safe(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
