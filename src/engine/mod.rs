//! Decision engine: turns a request and a resource descriptor into an outcome.
//!
//! # Data Flow
//! ```text
//! Request + ResourceDescriptor
//!     → graph.rs (ordered predicates, first failure wins)
//!     → terminal Handler
//!     → render (descriptor function or default message)
//!     → encode for the negotiated media type
//!     → Outcome (status, validators, Location, Allow, Vary, trace)
//! ```
//!
//! # Design Decisions
//! - The engine is stateless; one walk per request
//! - Any error from a resource function becomes a 500 with a generic message
//! - Bodies are rendered eagerly; 204, 304 and HEAD outcomes carry none

mod graph;


use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};

use crate::error::ResourceResult;
use crate::http::request::Request;
use crate::http::response::Outcome;
use crate::negotiation::{ContentNegotiator, MediaType};
use crate::resource::context::LOCATION;
use crate::resource::representation::content_type;
use crate::resource::{default_rendering, Context, Handler, Rendered, ResourceDescriptor};

use graph::{validators, TraceStep, Walk};

/// Name of the response header listing visited nodes.
pub const TRACE_HEADER: &str = "x-decision-trace";

/// Evaluates requests against resource descriptors.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    trace: bool,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit each visited node as an `X-Decision-Trace` header.
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Walk the decision graph for `request` and build the response.
    pub fn evaluate(&self, request: Request, descriptor: &ResourceDescriptor) -> Outcome {
        let (head, body) = request.into_parts();
        let mut walk = Walk::new(descriptor, Context::new(head), body);

        let handler = match walk.run() {
            Ok(handler) => handler,
            Err(error) => {
                tracing::error!(
                    resource = descriptor.name(),
                    method = %walk.ctx.method(),
                    error = %error,
                    "Resource function failed"
                );
                Handler::InternalFailure
            }
        };

        let Walk { mut ctx, trace, .. } = walk;
        let outcome = self.respond(descriptor, &mut ctx, handler);
        self.finish(outcome, descriptor, &ctx, trace)
    }

    fn respond(&self, descriptor: &ResourceDescriptor, ctx: &mut Context, handler: Handler) -> Outcome {
        if ctx.media_type().is_none() {
            ctx.set_media_type(fallback_media_type(descriptor, ctx));
        }

        let (handler, rendered) = match render(descriptor, handler, ctx) {
            Ok(rendered) => (handler, rendered),
            Err(error) => {
                tracing::error!(
                    resource = descriptor.name(),
                    handler = handler.name(),
                    error = %error,
                    "Render failed"
                );
                match render(descriptor, Handler::InternalFailure, ctx) {
                    Ok(rendered) => (Handler::InternalFailure, rendered),
                    Err(_) => return internal_failure(),
                }
            }
        };

        let media_type = ctx.media_type().cloned().unwrap_or_else(MediaType::text_plain);
        let body = match rendered.encode(&media_type) {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(resource = descriptor.name(), error = %error, "Encoding failed");
                return internal_failure();
            }
        };

        let mut outcome = Outcome::new(handler.status());
        if let Some(body) = body {
            set_header(&mut outcome, header::CONTENT_TYPE, &content_type(&media_type));
            if *ctx.method() != Method::HEAD {
                outcome.body = Some(body);
            }
        }

        let validated = handler.status().is_success() || handler == Handler::NotModified;
        if validated && *ctx.method() != Method::DELETE {
            add_validators(&mut outcome, descriptor, ctx);
        }

        if handler.has_location() {
            match location(descriptor, ctx) {
                Ok(Some(location)) => set_header(&mut outcome, header::LOCATION, &location),
                Ok(None) => {}
                Err(error) => {
                    tracing::error!(resource = descriptor.name(), error = %error, "Location lookup failed");
                    return internal_failure();
                }
            }
        }

        if matches!(handler, Handler::MethodNotAllowed | Handler::Options) {
            set_header(&mut outcome, header::ALLOW, &descriptor.allow_header());
        }

        outcome
    }

    fn finish(
        &self,
        mut outcome: Outcome,
        descriptor: &ResourceDescriptor,
        ctx: &Context,
        trace: Vec<TraceStep>,
    ) -> Outcome {
        if descriptor.available_media_types().len() > 1 {
            set_header(&mut outcome, header::VARY, "Accept");
        }

        if self.trace {
            for (node, answer) in &trace {
                tracing::trace!(resource = descriptor.name(), node, answer, "Decision");
                if let Ok(value) = HeaderValue::try_from(format!("{node} {answer}")) {
                    outcome
                        .headers
                        .append(HeaderName::from_static(TRACE_HEADER), value);
                }
            }
        }

        tracing::debug!(
            resource = descriptor.name(),
            method = %ctx.method(),
            status = outcome.status.as_u16(),
            "Request evaluated"
        );
        outcome
    }
}

fn render(descriptor: &ResourceDescriptor, handler: Handler, ctx: &Context) -> ResourceResult<Rendered> {
    if handler.is_bodiless() {
        return Ok(Rendered::Empty);
    }
    match descriptor.handler(handler) {
        Some(f) => f(ctx),
        None => Ok(default_rendering(handler, ctx)),
    }
}

/// Media type for states reached before (or by failing) negotiation.
fn fallback_media_type(descriptor: &ResourceDescriptor, ctx: &Context) -> MediaType {
    let accept = ctx.request().header(header::ACCEPT);
    ContentNegotiator::negotiate(accept, descriptor.available_media_types())
        .unwrap_or_else(MediaType::text_plain)
}

fn location(descriptor: &ResourceDescriptor, ctx: &Context) -> ResourceResult<Option<String>> {
    match descriptor.location() {
        Some(f) => f(ctx),
        None => Ok(ctx.get_str(LOCATION).map(str::to_string)),
    }
}

fn add_validators(outcome: &mut Outcome, descriptor: &ResourceDescriptor, ctx: &Context) {
    match validators(descriptor, ctx) {
        Ok(validators) => {
            if let Some(etag) = validators.etag {
                set_header(outcome, header::ETAG, &etag.to_string());
            }
            if let Some(modified) = validators.last_modified {
                set_header(
                    outcome,
                    header::LAST_MODIFIED,
                    &crate::conditional::format_http_date(modified),
                );
            }
        }
        Err(error) => {
            tracing::warn!(resource = descriptor.name(), error = %error, "Validator lookup failed");
        }
    }
}

fn set_header(outcome: &mut Outcome, name: HeaderName, value: &str) {
    match HeaderValue::try_from(value) {
        Ok(value) => {
            outcome.headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping invalid header value"),
    }
}

fn internal_failure() -> Outcome {
    Outcome::plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}
