//! Resource model: descriptors, request context and extension points.
//!
//! # Data Flow
//! ```text
//! ResourceDescriptor (immutable, built once at startup)
//!     → DecisionEngine reads allowed methods, media types, overrides
//!     → predicates return DecisionResult, merged into Context
//!     → actions mutate Context (and the store)
//!     → the terminal Handler's render function produces Rendered
//!     → Rendered::encode for the negotiated MediaType
//! ```
//!
//! # Design Decisions
//! - Extension points are keyed by closed enums, never by strings
//! - Every slot has a default so a minimal resource needs one media type
//! - Error handlers default to a short message, JSON-shaped for JSON types

pub mod context;
pub mod decision;
pub mod descriptor;
pub mod representation;

pub use context::Context;
pub use decision::{Action, DecisionPoint, DecisionResult, Handler};
pub use descriptor::{
    Act, BodyFormat, Decide, DescriptorError, Lookup, Render, ResourceDescriptor,
    ResourceDescriptorBuilder,
};
pub use representation::Rendered;

use serde_json::json;

/// Rendering used when a descriptor has no function for `handler`.
///
/// Messages are JSON objects for JSON media types and plain text otherwise.
/// A malformed request includes the parse detail stored under `error`.
pub fn default_rendering(handler: Handler, ctx: &Context) -> Rendered {
    let Some(message) = handler.default_message() else {
        return Rendered::Empty;
    };

    let detail = match handler {
        Handler::MalformedRequest => ctx.get_str(context::ERROR),
        _ => None,
    };

    if ctx.media_type().is_some_and(|m| m.is_json()) {
        let mut body = json!({
            "status": handler.status().as_u16(),
            "message": message,
        });
        if let Some(detail) = detail {
            body["detail"] = detail.into();
        }
        Rendered::Value(body)
    } else {
        match detail {
            Some(detail) => Rendered::Text(format!("{message} {detail}")),
            None => Rendered::Text(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use crate::negotiation::MediaType;
    use axum::http::Method;

    fn ctx(media_type: Option<MediaType>) -> Context {
        let (head, _) = Request::new(Method::POST, "/entries").into_parts();
        let mut ctx = Context::new(head);
        if let Some(media_type) = media_type {
            ctx.set_media_type(media_type);
        }
        ctx
    }

    #[test]
    fn test_default_error_is_json_for_json_types() {
        let rendered = default_rendering(Handler::NotFound, &ctx(Some(MediaType::json())));
        assert_eq!(
            rendered,
            Rendered::Value(json!({"status": 404, "message": "Resource not found."}))
        );
    }

    #[test]
    fn test_default_error_is_text_otherwise() {
        let rendered = default_rendering(Handler::NotAcceptable, &ctx(None));
        assert_eq!(
            rendered,
            Rendered::Text("No acceptable resource available.".into())
        );
    }

    #[test]
    fn test_malformed_includes_detail() {
        let mut c = ctx(Some(MediaType::json()));
        c.insert(context::ERROR, "expected value at line 1 column 1");
        let rendered = default_rendering(Handler::MalformedRequest, &c);
        let Rendered::Value(body) = rendered else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["status"], 400);
        assert_eq!(body["detail"], "expected value at line 1 column 1");
    }

    #[test]
    fn test_success_states_default_to_empty() {
        assert!(default_rendering(Handler::Created, &ctx(None)).is_empty());
    }
}
