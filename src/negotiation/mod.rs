//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Accept header
//!     → accept.rs (split into ranges with quality values)
//!     → quality of each available type (most specific matching range)
//!     → first available type, in declaration order, with quality > 0
//!     → MediaType or None (406)
//!
//! Content-Type header (PUT/POST/PATCH)
//!     → media_type.rs (parse)
//!     → checked against the resource's accepted ranges (415)
//! ```
//!
//! # Design Decisions
//! - Absent or blank Accept selects the first available type
//! - `q=0` is an explicit rejection, even under a wildcard
//! - Negotiation is pure and allocation-light; no state is kept

pub mod accept;
pub mod media_type;

pub use accept::{parse_accept, quality_of, MediaRange, Quality};
pub use media_type::{MediaType, MediaTypeError};

/// Selects representations and validates request content types.
pub struct ContentNegotiator;

impl ContentNegotiator {
    /// Pick the response media type for an `Accept` header.
    ///
    /// The resource's declaration order is its preference: the first available
    /// type the client accepts at all wins, whatever its q-value. Returns
    /// `None` when the client accepts none of them.
    pub fn negotiate(accept: Option<&str>, available: &[MediaType]) -> Option<MediaType> {
        let Some(header) = accept.map(str::trim).filter(|h| !h.is_empty()) else {
            return available.first().cloned();
        };

        let ranges = parse_accept(header);
        available
            .iter()
            .find(|media_type| quality_of(&ranges, media_type) > 0)
            .cloned()
    }

    /// Whether a request `Content-Type` falls inside one of the accepted ranges.
    ///
    /// Parameters on the request type (such as `charset`) are ignored unless a
    /// range names them.
    pub fn is_known_content_type(content_type: &str, accepted: &[MediaType]) -> bool {
        match MediaType::parse(content_type) {
            Ok(media_type) => accepted.iter().any(|range| range.covers(&media_type)),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<MediaType> {
        vec![
            MediaType::json(),
            MediaType::text_plain(),
            MediaType::text_html(),
        ]
    }

    #[test]
    fn test_missing_accept_picks_first() {
        assert_eq!(
            ContentNegotiator::negotiate(None, &available()),
            Some(MediaType::json())
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("   "), &available()),
            Some(MediaType::json())
        );
        assert_eq!(ContentNegotiator::negotiate(None, &[]), None);
    }

    #[test]
    fn test_exact_and_wildcards() {
        let types = available();
        assert_eq!(
            ContentNegotiator::negotiate(Some("text/html"), &types),
            Some(MediaType::text_html())
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("text/*"), &types),
            Some(MediaType::text_plain())
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("*/*"), &types),
            Some(MediaType::json())
        );
    }

    #[test]
    fn test_declaration_order_beats_quality() {
        let types = available();
        assert_eq!(
            ContentNegotiator::negotiate(Some("application/json;q=0.4, text/*;q=0.9"), &types),
            Some(MediaType::json())
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("text/html;q=1, text/plain;q=0.1"), &types),
            Some(MediaType::text_plain())
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("text/html, text/plain"), &types),
            Some(MediaType::text_plain())
        );
    }

    #[test]
    fn test_rejections_and_no_match() {
        let types = available();
        assert_eq!(
            ContentNegotiator::negotiate(Some("image/png"), &types),
            None
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("*/*;q=0"), &types),
            None
        );
        assert_eq!(
            ContentNegotiator::negotiate(Some("*/*, application/json;q=0"), &types),
            Some(MediaType::text_plain())
        );
    }

    #[test]
    fn test_result_is_always_from_available() {
        let types = available();
        let headers = [
            "text/html;level=1",
            "application/*;q=0.2, */*;q=0.1",
            "x/y, a/b",
            "text/plain;q=0, text/html;q=0",
            "*/*",
            ",,,",
        ];
        for header in headers {
            if let Some(chosen) = ContentNegotiator::negotiate(Some(header), &types) {
                assert!(types.contains(&chosen), "{header} produced {chosen}");
            }
        }
    }

    #[test]
    fn test_known_content_type() {
        let accepted = vec![MediaType::json()];
        assert!(ContentNegotiator::is_known_content_type(
            "application/json; charset=utf-8",
            &accepted
        ));
        assert!(!ContentNegotiator::is_known_content_type("text/plain", &accepted));
        assert!(!ContentNegotiator::is_known_content_type("nonsense", &accepted));
        assert!(ContentNegotiator::is_known_content_type(
            "image/png",
            &[MediaType::any()]
        ));
    }
}
