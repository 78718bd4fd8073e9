//! Named extension points of the decision graph.

use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Answer of a decision predicate plus values to merge into the context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionResult {
    pub answer: bool,
    pub updates: Map<String, Value>,
}

impl DecisionResult {
    pub fn yes() -> Self {
        Self {
            answer: true,
            updates: Map::new(),
        }
    }

    pub fn no() -> Self {
        Self::default()
    }

    /// Attach a context update to this answer.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.updates.insert(key.into(), value.into());
        self
    }
}

impl From<bool> for DecisionResult {
    fn from(answer: bool) -> Self {
        Self {
            answer,
            updates: Map::new(),
        }
    }
}

/// Overridable predicates, in graph order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionPoint {
    ServiceAvailable,
    Authorized,
    Allowed,
    KnownContentType,
    ValidEntityLength,
    Malformed,
    Processable,
    Exists,
    Existed,
    CanPutToMissing,
    CanPostToMissing,
    CanPostToGone,
    MovedPermanently,
    MovedTemporarily,
    Conflict,
    New,
    PostRedirect,
    RespondWithEntity,
    DeleteEnacted,
    MultipleRepresentations,
}

impl DecisionPoint {
    pub fn name(self) -> &'static str {
        match self {
            DecisionPoint::ServiceAvailable => "service-available?",
            DecisionPoint::Authorized => "authorized?",
            DecisionPoint::Allowed => "allowed?",
            DecisionPoint::KnownContentType => "known-content-type?",
            DecisionPoint::ValidEntityLength => "valid-entity-length?",
            DecisionPoint::Malformed => "malformed?",
            DecisionPoint::Processable => "processable?",
            DecisionPoint::Exists => "exists?",
            DecisionPoint::Existed => "existed?",
            DecisionPoint::CanPutToMissing => "can-put-to-missing?",
            DecisionPoint::CanPostToMissing => "can-post-to-missing?",
            DecisionPoint::CanPostToGone => "can-post-to-gone?",
            DecisionPoint::MovedPermanently => "moved-permanently?",
            DecisionPoint::MovedTemporarily => "moved-temporarily?",
            DecisionPoint::Conflict => "conflict?",
            DecisionPoint::New => "new?",
            DecisionPoint::PostRedirect => "post-redirect?",
            DecisionPoint::RespondWithEntity => "respond-with-entity?",
            DecisionPoint::DeleteEnacted => "delete-enacted?",
            DecisionPoint::MultipleRepresentations => "multiple-representations?",
        }
    }
}

/// Side-effecting functions invoked by method dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Post,
    Put,
    Patch,
    Delete,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Post => "post!",
            Action::Put => "put!",
            Action::Patch => "patch!",
            Action::Delete => "delete!",
        }
    }
}

/// Terminal states of the graph, each with its own render slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Ok,
    Options,
    Created,
    Accepted,
    NoContent,
    MultipleRepresentations,
    MovedPermanently,
    SeeOther,
    NotModified,
    MovedTemporarily,
    MalformedRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    Gone,
    PreconditionFailed,
    RequestEntityTooLarge,
    UnsupportedMediaType,
    UnprocessableEntity,
    InternalFailure,
    NotImplemented,
    ServiceUnavailable,
}

impl Handler {
    pub fn status(self) -> StatusCode {
        match self {
            Handler::Ok | Handler::Options => StatusCode::OK,
            Handler::Created => StatusCode::CREATED,
            Handler::Accepted => StatusCode::ACCEPTED,
            Handler::NoContent => StatusCode::NO_CONTENT,
            Handler::MultipleRepresentations => StatusCode::MULTIPLE_CHOICES,
            Handler::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
            Handler::SeeOther => StatusCode::SEE_OTHER,
            Handler::NotModified => StatusCode::NOT_MODIFIED,
            Handler::MovedTemporarily => StatusCode::TEMPORARY_REDIRECT,
            Handler::MalformedRequest => StatusCode::BAD_REQUEST,
            Handler::Unauthorized => StatusCode::UNAUTHORIZED,
            Handler::Forbidden => StatusCode::FORBIDDEN,
            Handler::NotFound => StatusCode::NOT_FOUND,
            Handler::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Handler::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Handler::Conflict => StatusCode::CONFLICT,
            Handler::Gone => StatusCode::GONE,
            Handler::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Handler::RequestEntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Handler::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Handler::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Handler::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            Handler::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Handler::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handler::Ok => "handle-ok",
            Handler::Options => "handle-options",
            Handler::Created => "handle-created",
            Handler::Accepted => "handle-accepted",
            Handler::NoContent => "handle-no-content",
            Handler::MultipleRepresentations => "handle-multiple-representations",
            Handler::MovedPermanently => "handle-moved-permanently",
            Handler::SeeOther => "handle-see-other",
            Handler::NotModified => "handle-not-modified",
            Handler::MovedTemporarily => "handle-moved-temporarily",
            Handler::MalformedRequest => "handle-malformed",
            Handler::Unauthorized => "handle-unauthorized",
            Handler::Forbidden => "handle-forbidden",
            Handler::NotFound => "handle-not-found",
            Handler::MethodNotAllowed => "handle-method-not-allowed",
            Handler::NotAcceptable => "handle-not-acceptable",
            Handler::Conflict => "handle-conflict",
            Handler::Gone => "handle-gone",
            Handler::PreconditionFailed => "handle-precondition-failed",
            Handler::RequestEntityTooLarge => "handle-request-entity-too-large",
            Handler::UnsupportedMediaType => "handle-unsupported-media-type",
            Handler::UnprocessableEntity => "handle-unprocessable-entity",
            Handler::InternalFailure => "handle-exception",
            Handler::NotImplemented => "handle-not-implemented",
            Handler::ServiceUnavailable => "handle-service-not-available",
        }
    }

    /// Message rendered when the descriptor supplies no handler.
    pub fn default_message(self) -> Option<&'static str> {
        match self {
            Handler::Ok => Some("OK"),
            Handler::MalformedRequest => Some("Bad request."),
            Handler::Unauthorized => Some("Not authorized."),
            Handler::Forbidden => Some("Forbidden."),
            Handler::NotFound => Some("Resource not found."),
            Handler::MethodNotAllowed => Some("Method not allowed."),
            Handler::NotAcceptable => Some("No acceptable resource available."),
            Handler::Conflict => Some("Conflict."),
            Handler::Gone => Some("Resource is gone."),
            Handler::PreconditionFailed => Some("Precondition failed."),
            Handler::RequestEntityTooLarge => Some("Request entity too large."),
            Handler::UnsupportedMediaType => Some("Unsupported media type."),
            Handler::UnprocessableEntity => Some("Unprocessable entity."),
            Handler::InternalFailure => Some("Internal server error."),
            Handler::NotImplemented => Some("Not implemented."),
            Handler::ServiceUnavailable => Some("Service not available."),
            _ => None,
        }
    }

    /// Statuses that never carry a body.
    pub fn is_bodiless(self) -> bool {
        matches!(self, Handler::NoContent | Handler::NotModified)
    }

    /// Statuses whose response advertises a `Location`.
    pub fn has_location(self) -> bool {
        matches!(
            self,
            Handler::Created
                | Handler::SeeOther
                | Handler::MovedPermanently
                | Handler::MovedTemporarily
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_result_builders() {
        let result = DecisionResult::yes().with("entry", json!({"id": "1"}));
        assert!(result.answer);
        assert_eq!(result.updates["entry"]["id"], "1");

        assert!(!DecisionResult::no().answer);
        assert!(DecisionResult::from(true).answer);
    }

    #[test]
    fn test_handler_statuses() {
        assert_eq!(Handler::Gone.status(), StatusCode::GONE);
        assert_eq!(Handler::MovedTemporarily.status().as_u16(), 307);
        assert_eq!(Handler::InternalFailure.name(), "handle-exception");
        assert!(Handler::NotModified.is_bodiless());
        assert!(Handler::Created.has_location());
        assert_eq!(Handler::Created.default_message(), None);
    }
}
