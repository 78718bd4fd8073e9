//! Walk of the decision graph for one request.

use axum::http::{header, Method};
use serde_json::Value;

use crate::conditional::{quantize, ConditionalEvaluator, ETag, Precondition, Validators};
use crate::error::{ResourceError, ResourceResult};
use crate::http::request::RequestBody;
use crate::negotiation::ContentNegotiator;
use crate::resource::context::{BODY, ERROR, NEW};
use crate::resource::{Action, BodyFormat, Context, DecisionPoint, Handler, ResourceDescriptor};
use crate::store::StoreError;

const KNOWN_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Visited node and its answer.
pub type TraceStep = (&'static str, bool);

/// State of one evaluation: the context plus the visited path.
pub struct Walk<'a> {
    pub descriptor: &'a ResourceDescriptor,
    pub ctx: Context,
    pub trace: Vec<TraceStep>,
    body: RequestBody,
}

impl<'a> Walk<'a> {
    pub fn new(descriptor: &'a ResourceDescriptor, ctx: Context, body: RequestBody) -> Self {
        Self {
            descriptor,
            ctx,
            trace: Vec::new(),
            body,
        }
    }

    /// Walk the graph until a terminal state is reached.
    pub fn run(&mut self) -> ResourceResult<Handler> {
        let method = self.ctx.method().clone();

        if !self.decide(DecisionPoint::ServiceAvailable)? {
            return Ok(Handler::ServiceUnavailable);
        }
        if !self.check("known-method?", KNOWN_METHODS.contains(&method)) {
            return Ok(Handler::NotImplemented);
        }
        let allowed = self.descriptor.allows(&method);
        if !self.check("method-allowed?", allowed) {
            return Ok(Handler::MethodNotAllowed);
        }
        if !self.decide(DecisionPoint::Authorized)? {
            return Ok(Handler::Unauthorized);
        }
        if !self.decide(DecisionPoint::Allowed)? {
            return Ok(Handler::Forbidden);
        }

        if carries_body(&method) {
            if !self.decide(DecisionPoint::KnownContentType)? {
                return Ok(Handler::UnsupportedMediaType);
            }
            if !self.decide(DecisionPoint::ValidEntityLength)? {
                return Ok(Handler::RequestEntityTooLarge);
            }
            let parsed = self.parse_body()?;
            if !self.check("body-parsed?", parsed) {
                return Ok(Handler::MalformedRequest);
            }
        }

        if self.decide(DecisionPoint::Malformed)? {
            return Ok(Handler::MalformedRequest);
        }
        if !self.decide(DecisionPoint::Processable)? {
            return Ok(Handler::UnprocessableEntity);
        }
        if self.check("is-options?", method == Method::OPTIONS) {
            return Ok(Handler::Options);
        }

        let accept = self.ctx.request().header(header::ACCEPT);
        match ContentNegotiator::negotiate(accept, self.descriptor.available_media_types()) {
            Some(media_type) => {
                self.check("media-type-available?", true);
                self.ctx.set_media_type(media_type);
            }
            None => {
                self.check("media-type-available?", false);
                return Ok(Handler::NotAcceptable);
            }
        }

        if self.decide(DecisionPoint::Exists)? {
            self.existing(&method)
        } else {
            self.missing(&method)
        }
    }

    fn existing(&mut self, method: &Method) -> ResourceResult<Handler> {
        let validators = validators(self.descriptor, &self.ctx)?;
        match ConditionalEvaluator::check(method, &self.ctx.request().headers, &validators) {
            Precondition::NotModified => {
                self.check("preconditions?", false);
                return Ok(Handler::NotModified);
            }
            Precondition::PreconditionFailed => {
                self.check("preconditions?", false);
                return Ok(Handler::PreconditionFailed);
            }
            Precondition::Proceed => {
                self.check("preconditions?", true);
            }
        }

        if *method == Method::GET || *method == Method::HEAD {
            if self.decide(DecisionPoint::MultipleRepresentations)? {
                return Ok(Handler::MultipleRepresentations);
            }
            Ok(Handler::Ok)
        } else if *method == Method::DELETE {
            if let Some(handler) = self.act(Action::Delete)? {
                return Ok(handler);
            }
            if !self.decide(DecisionPoint::DeleteEnacted)? {
                return Ok(Handler::Accepted);
            }
            self.entity_or_no_content()
        } else if *method == Method::PUT {
            self.put()
        } else if *method == Method::POST {
            self.post()
        } else if *method == Method::PATCH {
            if self.decide(DecisionPoint::Conflict)? {
                return Ok(Handler::Conflict);
            }
            if let Some(handler) = self.act(Action::Patch)? {
                return Ok(handler);
            }
            Ok(Handler::Ok)
        } else {
            Ok(Handler::NotImplemented)
        }
    }

    fn missing(&mut self, method: &Method) -> ResourceResult<Handler> {
        if ConditionalEvaluator::check_missing(&self.ctx.request().headers)
            == Precondition::PreconditionFailed
        {
            self.check("preconditions?", false);
            return Ok(Handler::PreconditionFailed);
        }

        if *method == Method::PUT && self.decide(DecisionPoint::CanPutToMissing)? {
            self.ctx.insert(NEW, true);
            return self.put();
        }

        if self.decide(DecisionPoint::Existed)? {
            if self.decide(DecisionPoint::MovedPermanently)? {
                return Ok(Handler::MovedPermanently);
            }
            if self.decide(DecisionPoint::MovedTemporarily)? {
                return Ok(Handler::MovedTemporarily);
            }
            if *method == Method::POST && self.decide(DecisionPoint::CanPostToGone)? {
                return self.post();
            }
            return Ok(Handler::Gone);
        }

        if *method == Method::POST && self.decide(DecisionPoint::CanPostToMissing)? {
            return self.post();
        }
        Ok(Handler::NotFound)
    }

    fn put(&mut self) -> ResourceResult<Handler> {
        if self.decide(DecisionPoint::Conflict)? {
            return Ok(Handler::Conflict);
        }
        if let Some(handler) = self.act(Action::Put)? {
            return Ok(handler);
        }
        if self.decide(DecisionPoint::New)? {
            return Ok(Handler::Created);
        }
        self.entity_or_no_content()
    }

    fn post(&mut self) -> ResourceResult<Handler> {
        if let Some(handler) = self.act(Action::Post)? {
            return Ok(handler);
        }
        if self.decide(DecisionPoint::PostRedirect)? {
            return Ok(Handler::SeeOther);
        }
        if self.decide(DecisionPoint::New)? {
            return Ok(Handler::Created);
        }
        self.entity_or_no_content()
    }

    fn entity_or_no_content(&mut self) -> ResourceResult<Handler> {
        if self.decide(DecisionPoint::RespondWithEntity)? {
            Ok(Handler::Ok)
        } else {
            Ok(Handler::NoContent)
        }
    }

    /// Evaluate a decision point, merging the predicate's updates.
    fn decide(&mut self, point: DecisionPoint) -> ResourceResult<bool> {
        let descriptor = self.descriptor;
        let answer = match descriptor.decision(point) {
            Some(predicate) => {
                let result = predicate(&self.ctx)?;
                self.ctx.merge(result.updates);
                result.answer
            }
            None => self.default_answer(point),
        };
        Ok(self.check(point.name(), answer))
    }

    fn default_answer(&self, point: DecisionPoint) -> bool {
        match point {
            DecisionPoint::ServiceAvailable
            | DecisionPoint::Authorized
            | DecisionPoint::Allowed
            | DecisionPoint::Processable
            | DecisionPoint::Exists
            | DecisionPoint::CanPutToMissing
            | DecisionPoint::CanPostToMissing
            | DecisionPoint::DeleteEnacted => true,
            DecisionPoint::KnownContentType => self.known_content_type(),
            DecisionPoint::ValidEntityLength => {
                match (self.descriptor.max_entity_length(), self.body.len()) {
                    (Some(limit), Some(len)) => len <= limit,
                    _ => true,
                }
            }
            DecisionPoint::New => self
                .ctx
                .get_bool(NEW)
                .unwrap_or(*self.ctx.method() == Method::POST),
            DecisionPoint::Malformed
            | DecisionPoint::Existed
            | DecisionPoint::CanPostToGone
            | DecisionPoint::MovedPermanently
            | DecisionPoint::MovedTemporarily
            | DecisionPoint::Conflict
            | DecisionPoint::PostRedirect
            | DecisionPoint::RespondWithEntity
            | DecisionPoint::MultipleRepresentations => false,
        }
    }

    fn known_content_type(&self) -> bool {
        let accepted = self.descriptor.accepted_content_types(self.ctx.method());
        match self.ctx.request().header(header::CONTENT_TYPE) {
            Some(content_type) => ContentNegotiator::is_known_content_type(content_type, accepted),
            None => self.body.is_empty(),
        }
    }

    /// Parse the body into the context; `false` when it is malformed.
    fn parse_body(&mut self) -> ResourceResult<bool> {
        let bytes = self
            .body
            .take()
            .map_err(|e| ResourceError::Internal(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(true);
        }

        let parsed = match self.descriptor.body_format() {
            BodyFormat::Json => serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()),
            BodyFormat::Text => String::from_utf8(bytes.to_vec())
                .map(Value::String)
                .map_err(|_| "request body is not valid UTF-8".to_string()),
        };

        match parsed {
            Ok(value) => {
                self.ctx.insert(BODY, value);
                Ok(true)
            }
            Err(detail) => {
                tracing::debug!(resource = self.descriptor.name(), %detail, "Malformed request body");
                self.ctx.insert(ERROR, detail);
                Ok(false)
            }
        }
    }

    /// Run an action. The walk ends early when the store finds the entry
    /// changed since the graph examined it: 412 when the write was pinned to a
    /// version by the preconditions, 409 when the entry disappeared.
    fn act(&mut self, action: Action) -> ResourceResult<Option<Handler>> {
        let descriptor = self.descriptor;
        let Some(f) = descriptor.action(action) else {
            return Ok(None);
        };
        let handler = match f(&mut self.ctx) {
            Ok(()) => None,
            Err(ResourceError::Store(StoreError::Stale { id, expected, found })) => {
                tracing::debug!(resource = descriptor.name(), %id, expected, ?found, "Conditional write lost a race");
                Some(Handler::PreconditionFailed)
            }
            Err(ResourceError::Store(StoreError::Gone(id) | StoreError::NotFound(id))) => {
                tracing::debug!(resource = descriptor.name(), %id, "Entry vanished during action");
                Some(Handler::Conflict)
            }
            Err(e) => return Err(e),
        };
        self.check(action.name(), handler.is_none());
        Ok(handler)
    }

    fn check(&mut self, node: &'static str, answer: bool) -> bool {
        self.trace.push((node, answer));
        answer
    }
}

/// Current validators: descriptor functions first, then the context entry.
pub fn validators(descriptor: &ResourceDescriptor, ctx: &Context) -> ResourceResult<Validators> {
    let entry = ctx.entry();

    let etag = match descriptor.etag() {
        Some(f) => f(ctx)?,
        None => entry.map(|e| ETag::from_version(e.version)),
    };
    let last_modified = match descriptor.last_modified() {
        Some(f) => f(ctx)?,
        None => entry.map(|e| quantize(e.modified_at, std::time::Duration::from_secs(1))),
    };

    Ok(Validators {
        etag,
        last_modified,
    })
}

fn carries_body(method: &Method) -> bool {
    *method == Method::PUT || *method == Method::POST || *method == Method::PATCH
}
