//! Request-scoped context accumulated while walking the graph.

use axum::http::Method;
use serde_json::{Map, Value};

use crate::conditional::ConditionalEvaluator;
use crate::error::{ResourceError, ResourceResult};
use crate::http::request::RequestHead;
use crate::negotiation::MediaType;
use crate::store::Entry;

/// Key of the entry found by `exists?`.
pub const ENTRY: &str = "entry";
/// Key of the parsed request body.
pub const BODY: &str = "body";
/// Key of the `Location` for 201/301/303/307 outcomes.
pub const LOCATION: &str = "location";
/// Key forcing the `new?` default.
pub const NEW: &str = "new";
/// Key of the malformed-body detail.
pub const ERROR: &str = "error";

/// Mutable state of one request evaluation.
#[derive(Debug, Clone)]
pub struct Context {
    request: RequestHead,
    media_type: Option<MediaType>,
    values: Map<String, Value>,
    /// Typed copy of `values[ENTRY]`, kept in step by `insert`.
    entry: Option<Entry>,
}

impl Context {
    pub fn new(request: RequestHead) -> Self {
        Self {
            request,
            media_type: None,
            values: Map::new(),
            entry: None,
        }
    }

    pub fn request(&self) -> &RequestHead {
        &self.request
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// Route parameter that must be present for this resource.
    pub fn require_param(&self, name: &str) -> ResourceResult<&str> {
        self.param(name)
            .ok_or_else(|| ResourceError::InvalidContext(format!("missing route parameter {name}")))
    }

    /// Negotiated response media type, once negotiation has run.
    pub fn media_type(&self) -> Option<&MediaType> {
        self.media_type.as_ref()
    }

    pub(crate) fn set_media_type(&mut self, media_type: MediaType) {
        self.media_type = Some(media_type);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        if key == ENTRY {
            self.entry = Entry::from_value(&value);
        }
        self.values.insert(key, value);
    }

    pub fn merge(&mut self, updates: Map<String, Value>) {
        for (key, value) in updates {
            self.insert(key, value);
        }
    }

    /// Parsed request body, if the request had one.
    pub fn body(&self) -> Option<&Value> {
        self.get(BODY)
    }

    /// Parsed body as text, failing when absent or not a string.
    pub fn body_text(&self) -> ResourceResult<&str> {
        self.body()
            .and_then(Value::as_str)
            .ok_or_else(|| ResourceError::InvalidContext("request body is not text".into()))
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn set_entry(&mut self, entry: Entry) {
        self.values.insert(ENTRY.into(), entry.clone().into());
        self.entry = Some(entry);
    }

    /// Version a write must still find when committing.
    ///
    /// Set only when the request's preconditions were checked against this
    /// entry's exact representation (`If-Match` with tags, or
    /// `If-Unmodified-Since`).
    pub fn expected_version(&self) -> Option<u64> {
        if !ConditionalEvaluator::pins_version(&self.request.headers) {
            return None;
        }
        self.entry.as_ref().map(|entry| entry.version)
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.insert(LOCATION, location.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use axum::http::header;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_values_and_entry() {
        let (head, _) = Request::new(Method::GET, "/entries/4")
            .with_param("id", "4")
            .into_parts();
        let mut ctx = Context::new(head);

        assert_eq!(ctx.require_param("id").unwrap(), "4");
        assert!(ctx.require_param("other").is_err());

        let entry = Entry {
            id: "4".into(),
            value: json!({"k": "v"}),
            version: 2,
            modified_at: Utc::now(),
        };
        ctx.set_entry(entry.clone());
        assert_eq!(ctx.entry(), Some(&entry));
        assert_eq!(ctx.get(ENTRY).and_then(Entry::from_value), Some(entry.clone()));

        let mut updates = Map::new();
        updates.insert(NEW.into(), Value::Bool(true));
        updates.insert(ENTRY.into(), Value::Null);
        ctx.merge(updates);
        assert_eq!(ctx.get_bool(NEW), Some(true));
        assert!(ctx.entry().is_none());

        ctx.insert(BODY, "text");
        assert_eq!(ctx.body_text().unwrap(), "text");
    }

    #[test]
    fn test_expected_version_follows_preconditions() {
        let entry = Entry {
            id: "4".into(),
            value: json!(1),
            version: 9,
            modified_at: Utc::now(),
        };
        let context = |condition: Option<(header::HeaderName, &'static str)>| {
            let mut request = Request::new(Method::PUT, "/entries/4");
            if let Some((name, value)) = condition {
                request = request.with_header(name, header::HeaderValue::from_static(value));
            }
            let mut ctx = Context::new(request.into_parts().0);
            ctx.set_entry(entry.clone());
            ctx
        };

        assert_eq!(context(None).expected_version(), None);
        assert_eq!(context(Some((header::IF_MATCH, "*"))).expected_version(), None);
        assert_eq!(context(Some((header::IF_MATCH, "\"v9\""))).expected_version(), Some(9));
        assert_eq!(
            context(Some((header::IF_UNMODIFIED_SINCE, "Fri, 01 Jan 2100 00:00:00 GMT")))
                .expected_version(),
            Some(9)
        );
    }
}
