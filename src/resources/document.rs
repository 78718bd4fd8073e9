//! Text documents edited by whole replacement or `old|new` patches.
//!
//! Stored value: `{"content": <text>, "patches": <count>}`. A patch replaces
//! every occurrence of `old` with `new` and bumps `patches` inside one store
//! transaction, so concurrent patches are never lost.

use axum::http::Method;
use serde_json::{json, Value};

use crate::error::{ResourceError, ResourceResult};
use crate::resource::context::{ENTRY, NEW};
use crate::resource::{
    Action, BodyFormat, Context, DecisionPoint, DecisionResult, DescriptorError, Handler,
    Rendered, ResourceDescriptor,
};
use crate::store::{Entry, ResourceStore, StoreError};

/// Split a patch body on its first `|`; `None` when malformed.
pub fn parse_patch(body: &str) -> Option<(&str, &str)> {
    match body.split_once('|') {
        Some((old, new)) if !old.is_empty() => Some((old, new)),
        _ => None,
    }
}

/// `/documents/{id}`.
pub fn document(store: &ResourceStore) -> Result<ResourceDescriptor, DescriptorError> {
    let (exists, put, patch) = (store.clone(), store.clone(), store.clone());

    ResourceDescriptor::builder("document")
        .allowed_methods([Method::GET, Method::PUT, Method::PATCH])
        .available_media_types(["text/plain", "application/json"])
        .known_content_types(["text/plain"])
        .patch_content_types(["text/plain"])
        .body_format(BodyFormat::Text)
        .decide(DecisionPoint::Malformed, |ctx| {
            if *ctx.method() != Method::PATCH {
                return Ok(DecisionResult::no());
            }
            let body = ctx.body().and_then(Value::as_str).unwrap_or_default();
            Ok(parse_patch(body).is_none().into())
        })
        .decide(DecisionPoint::Exists, move |ctx| {
            Ok(match exists.read(ctx.require_param("id")?)? {
                Some(entry) => DecisionResult::yes().with(ENTRY, entry),
                None => DecisionResult::no(),
            })
        })
        .act(Action::Put, move |ctx| {
            let id = ctx.require_param("id")?.to_string();
            let content = ctx.body().and_then(Value::as_str).unwrap_or_default().to_string();
            let (entry, created) = if ctx.entry().is_some() {
                let entry = put.update_if(&id, ctx.expected_version(), |existing| {
                    Ok(json!({"content": content, "patches": patch_count(existing)}))
                })?;
                (entry, false)
            } else {
                let upserted = put.upsert(&id, |existing| {
                    let patches = existing.map_or(0, patch_count);
                    Ok(json!({"content": content, "patches": patches}))
                })?;
                (upserted.entry, upserted.created)
            };
            ctx.insert(NEW, created);
            ctx.set_entry(entry);
            ctx.set_location(format!("/documents/{id}"));
            Ok(())
        })
        .act(Action::Patch, move |ctx| {
            let id = ctx.require_param("id")?.to_string();
            let (old, new) = parse_patch(ctx.body_text()?)
                .ok_or_else(|| ResourceError::InvalidContext("patch body is malformed".into()))?;
            let entry = patch.update_if(&id, ctx.expected_version(), |entry| {
                let content = entry
                    .value
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| StoreError::Rejected(format!("document {id} has no content")))?;
                Ok(json!({
                    "content": content.replace(old, new),
                    "patches": patch_count(entry) + 1,
                }))
            })?;
            ctx.set_entry(entry);
            Ok(())
        })
        .handle(Handler::Ok, render_document)
        .handle(Handler::Created, render_document)
        .build()
}

fn patch_count(entry: &Entry) -> u64 {
    entry.value.get("patches").and_then(Value::as_u64).unwrap_or(0)
}

fn render_document(ctx: &Context) -> ResourceResult<Rendered> {
    let Some(entry) = ctx.entry() else {
        return Ok(Rendered::Empty);
    };
    if ctx.media_type().is_some_and(|m| m.is_json()) {
        return Ok(json!({
            "id": entry.id,
            "version": entry.version,
            "content": entry.value.get("content").cloned().unwrap_or(Value::Null),
            "patches": patch_count(entry),
        })
        .into());
    }
    let content = entry
        .value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(content.into())
}
