//! JSON entries: the collection, single entries and the legacy alias.

use axum::http::Method;
use serde_json::Value;

use crate::error::ResourceResult;
use crate::resource::context::{ENTRY, NEW};
use crate::resource::{
    Action, Context, DecisionPoint, DecisionResult, DescriptorError, Handler, Rendered,
    ResourceDescriptor,
};
use crate::store::ResourceStore;

const MEDIA_TYPES: [&str; 3] = ["application/json", "text/plain", "text/html"];

/// `/entries`: list entries, create one per POST.
pub fn collection(
    store: &ResourceStore,
    post_redirect: bool,
) -> Result<ResourceDescriptor, DescriptorError> {
    let (list, create) = (store.clone(), store.clone());

    ResourceDescriptor::builder("entries")
        .allowed_methods([Method::GET, Method::POST])
        .available_media_types(MEDIA_TYPES)
        .known_content_types(["application/json"])
        .decide(DecisionPoint::Malformed, |ctx| {
            Ok((*ctx.method() == Method::POST && ctx.body().is_none()).into())
        })
        .decide_const(DecisionPoint::PostRedirect, post_redirect)
        .act(Action::Post, move |ctx| {
            let value = ctx.body().cloned().unwrap_or(Value::Null);
            let id = create.create(value)?;
            if let Some(entry) = create.read(&id)? {
                ctx.set_entry(entry);
            }
            ctx.set_location(format!("/entries/{id}"));
            Ok(())
        })
        .handle(Handler::Ok, move |_| {
            let entries: Vec<Value> = list.list()?.iter().map(|e| e.summary()).collect();
            Ok(Value::Array(entries).into())
        })
        .handle(Handler::Created, render_entry)
        .build()
}

/// `/entries/{id}`: read, replace or delete one entry.
pub fn item(
    store: &ResourceStore,
    allow_put_create: bool,
) -> Result<ResourceDescriptor, DescriptorError> {
    let (exists, existed, put, delete) = (store.clone(), store.clone(), store.clone(), store.clone());

    ResourceDescriptor::builder("entry")
        .allowed_methods([Method::GET, Method::PUT, Method::DELETE])
        .available_media_types(MEDIA_TYPES)
        .known_content_types(["application/json"])
        .decide(DecisionPoint::Malformed, |ctx| {
            Ok((*ctx.method() == Method::PUT && ctx.body().is_none()).into())
        })
        .decide(DecisionPoint::Exists, move |ctx| {
            let id = ctx.require_param("id")?;
            Ok(match exists.read(id)? {
                Some(entry) => DecisionResult::yes().with(ENTRY, entry),
                None => DecisionResult::no(),
            })
        })
        .decide(DecisionPoint::Existed, move |ctx| {
            Ok(existed.existed(ctx.require_param("id")?)?.into())
        })
        .decide_const(DecisionPoint::CanPutToMissing, allow_put_create)
        .act(Action::Put, move |ctx| {
            let id = ctx.require_param("id")?.to_string();
            let value = ctx.body().cloned().unwrap_or(Value::Null);
            // Replacing never recreates: an entry deleted since `exists?` fails the write.
            let (entry, created) = if ctx.entry().is_some() {
                (put.update_if(&id, ctx.expected_version(), |_| Ok(value))?, false)
            } else {
                let upserted = put.put(&id, value)?;
                (upserted.entry, upserted.created)
            };
            ctx.insert(NEW, created);
            ctx.set_entry(entry);
            ctx.set_location(format!("/entries/{id}"));
            Ok(())
        })
        .act(Action::Delete, move |ctx| {
            delete.delete(ctx.require_param("id")?)?;
            Ok(())
        })
        .handle(Handler::Ok, render_entry)
        .handle(Handler::Created, render_entry)
        .build()
}

/// `/items/{id}`: permanently moved to `/entries/{id}` when the entry exists.
pub fn legacy_item(store: &ResourceStore) -> Result<ResourceDescriptor, DescriptorError> {
    let store = store.clone();

    ResourceDescriptor::builder("legacy-item")
        .available_media_types(MEDIA_TYPES)
        .decide_const(DecisionPoint::Exists, false)
        .decide(DecisionPoint::Existed, move |ctx| {
            Ok(store.read(ctx.require_param("id")?)?.is_some().into())
        })
        .decide_const(DecisionPoint::MovedPermanently, true)
        .location(|ctx| Ok(Some(format!("/entries/{}", ctx.require_param("id")?))))
        .build()
}

fn render_entry(ctx: &Context) -> ResourceResult<Rendered> {
    Ok(match ctx.entry() {
        Some(entry) => entry.summary().into(),
        None => Rendered::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DecisionEngine;
    use crate::http::Request;
    use crate::store::IdStrategy;
    use axum::http::header::{self, HeaderValue};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn post(body: &str) -> Request {
        Request::new(Method::POST, "/entries")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body.to_string())
    }

    #[test]
    fn test_post_then_list() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        let descriptor = collection(&store, false).unwrap();
        let engine = DecisionEngine::new();

        let created = engine.evaluate(post(r#"{"title":"a"}"#), &descriptor);
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.header("location"), Some("/entries/1"));
        let body: Value = serde_json::from_slice(created.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["value"], json!({"title": "a"}));

        engine.evaluate(post(r#"{"title":"b"}"#), &descriptor);
        let listed = engine.evaluate(Request::new(Method::GET, "/entries"), &descriptor);
        let body: Value = serde_json::from_slice(listed.body.as_ref().unwrap()).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[1]["id"], "2");
    }

    #[test]
    fn test_post_without_body_is_malformed() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        let descriptor = collection(&store, false).unwrap();
        let outcome = DecisionEngine::new().evaluate(post(""), &descriptor);
        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[test]
    fn test_post_redirect() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        let descriptor = collection(&store, true).unwrap();
        let outcome = DecisionEngine::new().evaluate(post("{}"), &descriptor);
        assert_eq!(outcome.status, StatusCode::SEE_OTHER);
        assert_eq!(outcome.header("location"), Some("/entries/1"));
    }

    #[test]
    fn test_plain_text_rendering() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        store.put("7", json!("seven")).unwrap();
        let descriptor = item(&store, true).unwrap();
        let request = Request::new(Method::GET, "/entries/7")
            .with_param("id", "7")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/plain"));
        let outcome = DecisionEngine::new().evaluate(request, &descriptor);
        assert_eq!(outcome.status, StatusCode::OK);
        let text = outcome.text().unwrap();
        assert!(text.contains("id=7\n"));
        assert!(text.contains("value=seven\n"));
    }

    #[test]
    fn test_put_create_disabled() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        let descriptor = item(&store, false).unwrap();
        let request = Request::new(Method::PUT, "/entries/5")
            .with_param("id", "5")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body("{}");
        let outcome = DecisionEngine::new().evaluate(request, &descriptor);
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
        assert!(store.read("5").unwrap().is_none());
    }

    #[test]
    fn test_legacy_item_redirects_only_existing() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        store.put("3", json!({})).unwrap();
        let descriptor = legacy_item(&store).unwrap();
        let engine = DecisionEngine::new();

        let moved = engine.evaluate(
            Request::new(Method::GET, "/items/3").with_param("id", "3"),
            &descriptor,
        );
        assert_eq!(moved.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(moved.header("location"), Some("/entries/3"));

        let missing = engine.evaluate(
            Request::new(Method::GET, "/items/4").with_param("id", "4"),
            &descriptor,
        );
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    fn put(id: &str, body: &str) -> Request {
        Request::new(Method::PUT, format!("/entries/{id}"))
            .with_param("id", id)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body.to_string())
    }

    #[test]
    fn test_concurrent_if_match_puts_admit_one() {
        const WRITERS: usize = 8;
        let store = ResourceStore::new(IdStrategy::Sequential);
        let version = store.put("1", json!(0)).unwrap().entry.version;
        let etag = format!("\"v{version}\"");
        let descriptor = Arc::new(item(&store, false).unwrap());
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|n| {
                let (descriptor, barrier, etag) = (descriptor.clone(), barrier.clone(), etag.clone());
                thread::spawn(move || {
                    let request = put("1", &n.to_string())
                        .with_header(header::IF_MATCH, HeaderValue::from_str(&etag).unwrap());
                    barrier.wait();
                    DecisionEngine::new().evaluate(request, &descriptor).status
                })
            })
            .collect();
        let statuses: Vec<StatusCode> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let committed = statuses.iter().filter(|s| s.is_success()).count();
        assert_eq!(committed, 1, "{statuses:?}");
        assert!(statuses
            .iter()
            .all(|s| s.is_success() || *s == StatusCode::PRECONDITION_FAILED));
        assert!(store.read("1").unwrap().unwrap().version > version);
    }

    #[test]
    fn test_put_racing_delete_never_revives() {
        let store = ResourceStore::new(IdStrategy::Sequential);
        let descriptor = Arc::new(item(&store, false).unwrap());

        for round in 0..50 {
            let id = format!("r{round}");
            store.put(&id, json!("original")).unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let deleter = {
                let (descriptor, barrier, id) = (descriptor.clone(), barrier.clone(), id.clone());
                thread::spawn(move || {
                    let request = Request::new(Method::DELETE, format!("/entries/{id}"))
                        .with_param("id", id.as_str());
                    barrier.wait();
                    DecisionEngine::new().evaluate(request, &descriptor).status
                })
            };
            let writer = {
                let (descriptor, barrier, id) = (descriptor.clone(), barrier.clone(), id.clone());
                thread::spawn(move || {
                    let request = put(&id, "\"replacement\"");
                    barrier.wait();
                    DecisionEngine::new().evaluate(request, &descriptor).status
                })
            };

            assert_eq!(deleter.join().unwrap(), StatusCode::NO_CONTENT);
            let status = writer.join().unwrap();
            assert!(
                [StatusCode::NO_CONTENT, StatusCode::GONE, StatusCode::CONFLICT].contains(&status),
                "round {round}: {status}"
            );
            assert!(store.read(&id).unwrap().is_none(), "round {round} revived the entry");
            assert!(store.existed(&id).unwrap());
        }
    }
}
