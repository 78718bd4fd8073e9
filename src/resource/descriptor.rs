//! Immutable per-resource configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::context::Context;
use super::decision::{Action, DecisionPoint, DecisionResult, Handler};
use super::representation::Rendered;
use crate::conditional::ETag;
use crate::error::ResourceResult;
use crate::negotiation::{MediaType, MediaTypeError};

/// Predicate bound to a [`DecisionPoint`].
pub type Decide = Arc<dyn Fn(&Context) -> ResourceResult<DecisionResult> + Send + Sync>;
/// Side effect bound to an [`Action`].
pub type Act = Arc<dyn Fn(&mut Context) -> ResourceResult<()> + Send + Sync>;
/// Render function bound to a [`Handler`].
pub type Render = Arc<dyn Fn(&Context) -> ResourceResult<Rendered> + Send + Sync>;
/// Optional per-request value such as an ETag or a location.
pub type Lookup<T> = Arc<dyn Fn(&Context) -> ResourceResult<Option<T>> + Send + Sync>;

/// Errors raised while building a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("resource {0} declares no available media types")]
    NoMediaTypes(String),

    #[error("resource {resource} has invalid media type {value:?}: {source}")]
    InvalidMediaType {
        resource: String,
        value: String,
        #[source]
        source: MediaTypeError,
    },
}

/// How request bodies of mutating methods are parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFormat {
    /// A JSON document.
    #[default]
    Json,
    /// UTF-8 text, placed in the context as a string.
    Text,
}

/// Everything the decision engine needs to know about one resource.
#[derive(Clone)]
pub struct ResourceDescriptor {
    name: String,
    allowed_methods: Vec<Method>,
    available_media_types: Vec<MediaType>,
    known_content_types: Vec<MediaType>,
    patch_content_types: Vec<MediaType>,
    body_format: BodyFormat,
    max_entity_length: Option<usize>,
    decisions: HashMap<DecisionPoint, Decide>,
    actions: HashMap<Action, Act>,
    handlers: HashMap<Handler, Render>,
    etag: Option<Lookup<ETag>>,
    last_modified: Option<Lookup<DateTime<Utc>>>,
    location: Option<Lookup<String>>,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("allowed_methods", &self.allowed_methods)
            .field("available_media_types", &self.available_media_types)
            .field("body_format", &self.body_format)
            .field("decisions", &self.decisions.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ResourceDescriptor {
    pub fn builder(name: impl Into<String>) -> ResourceDescriptorBuilder {
        ResourceDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    /// HEAD is allowed whenever GET is.
    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
            || (method == Method::HEAD && self.allowed_methods.contains(&Method::GET))
    }

    /// Value of the `Allow` header.
    pub fn allow_header(&self) -> String {
        let mut methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
        if self.allowed_methods.contains(&Method::GET)
            && !self.allowed_methods.contains(&Method::HEAD)
        {
            methods.push(Method::HEAD.as_str());
        }
        methods.join(", ")
    }

    pub fn available_media_types(&self) -> &[MediaType] {
        &self.available_media_types
    }

    /// Accepted request content types for `method`.
    pub fn accepted_content_types(&self, method: &Method) -> &[MediaType] {
        if method == Method::PATCH {
            &self.patch_content_types
        } else {
            &self.known_content_types
        }
    }

    pub fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    pub fn max_entity_length(&self) -> Option<usize> {
        self.max_entity_length
    }

    pub fn decision(&self, point: DecisionPoint) -> Option<&Decide> {
        self.decisions.get(&point)
    }

    pub fn action(&self, action: Action) -> Option<&Act> {
        self.actions.get(&action)
    }

    pub fn handler(&self, handler: Handler) -> Option<&Render> {
        self.handlers.get(&handler)
    }

    pub fn etag(&self) -> Option<&Lookup<ETag>> {
        self.etag.as_ref()
    }

    pub fn last_modified(&self) -> Option<&Lookup<DateTime<Utc>>> {
        self.last_modified.as_ref()
    }

    pub fn location(&self) -> Option<&Lookup<String>> {
        self.location.as_ref()
    }
}

/// Builder for [`ResourceDescriptor`].
pub struct ResourceDescriptorBuilder {
    name: String,
    allowed_methods: Vec<Method>,
    available_media_types: Vec<String>,
    known_content_types: Vec<String>,
    patch_content_types: Vec<String>,
    body_format: BodyFormat,
    max_entity_length: Option<usize>,
    decisions: HashMap<DecisionPoint, Decide>,
    actions: HashMap<Action, Act>,
    handlers: HashMap<Handler, Render>,
    etag: Option<Lookup<ETag>>,
    last_modified: Option<Lookup<DateTime<Utc>>>,
    location: Option<Lookup<String>>,
}

impl ResourceDescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_methods: vec![Method::GET],
            available_media_types: Vec::new(),
            known_content_types: vec!["*/*".into()],
            patch_content_types: vec!["*/*".into()],
            body_format: BodyFormat::default(),
            max_entity_length: None,
            decisions: HashMap::new(),
            actions: HashMap::new(),
            handlers: HashMap::new(),
            etag: None,
            last_modified: None,
            location: None,
        }
    }

    /// Replace the allowed methods (default GET).
    pub fn allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods.clear();
        for method in methods {
            if !self.allowed_methods.contains(&method) {
                self.allowed_methods.push(method);
            }
        }
        self
    }

    /// Response media types in priority order.
    pub fn available_media_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_media_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Request content types accepted for PUT and POST.
    pub fn known_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Request content types accepted for PATCH.
    pub fn patch_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patch_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn body_format(mut self, format: BodyFormat) -> Self {
        self.body_format = format;
        self
    }

    pub fn max_entity_length(mut self, limit: usize) -> Self {
        self.max_entity_length = Some(limit);
        self
    }

    pub fn decide<F>(mut self, point: DecisionPoint, f: F) -> Self
    where
        F: Fn(&Context) -> ResourceResult<DecisionResult> + Send + Sync + 'static,
    {
        self.decisions.insert(point, Arc::new(f));
        self
    }

    /// Bind a constant answer to a decision point.
    pub fn decide_const(self, point: DecisionPoint, answer: bool) -> Self {
        self.decide(point, move |_| Ok(DecisionResult::from(answer)))
    }

    pub fn act<F>(mut self, action: Action, f: F) -> Self
    where
        F: Fn(&mut Context) -> ResourceResult<()> + Send + Sync + 'static,
    {
        self.actions.insert(action, Arc::new(f));
        self
    }

    pub fn handle<F>(mut self, handler: Handler, f: F) -> Self
    where
        F: Fn(&Context) -> ResourceResult<Rendered> + Send + Sync + 'static,
    {
        self.handlers.insert(handler, Arc::new(f));
        self
    }

    pub fn etag<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> ResourceResult<Option<ETag>> + Send + Sync + 'static,
    {
        self.etag = Some(Arc::new(f));
        self
    }

    pub fn last_modified<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> ResourceResult<Option<DateTime<Utc>>> + Send + Sync + 'static,
    {
        self.last_modified = Some(Arc::new(f));
        self
    }

    pub fn location<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> ResourceResult<Option<String>> + Send + Sync + 'static,
    {
        self.location = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<ResourceDescriptor, DescriptorError> {
        let parse = |values: &[String]| -> Result<Vec<MediaType>, DescriptorError> {
            values
                .iter()
                .map(|value| {
                    MediaType::parse(value).map_err(|source| DescriptorError::InvalidMediaType {
                        resource: self.name.clone(),
                        value: value.clone(),
                        source,
                    })
                })
                .collect()
        };

        let available_media_types = parse(&self.available_media_types)?;
        let known_content_types = parse(&self.known_content_types)?;
        let patch_content_types = parse(&self.patch_content_types)?;
        if available_media_types.is_empty() {
            return Err(DescriptorError::NoMediaTypes(self.name.clone()));
        }

        Ok(ResourceDescriptor {
            name: self.name,
            allowed_methods: self.allowed_methods,
            available_media_types,
            known_content_types,
            patch_content_types,
            body_format: self.body_format,
            max_entity_length: self.max_entity_length,
            decisions: self.decisions,
            actions: self.actions,
            handlers: self.handlers,
            etag: self.etag,
            last_modified: self.last_modified,
            location: self.location,
        })
    }
}
