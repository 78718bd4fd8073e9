//! Current server time at a configurable granularity.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::conditional::{format_http_date, quantize};
use crate::resource::{
    Context, DecisionPoint, DecisionResult, DescriptorError, Handler, Rendered, ResourceDescriptor,
};

const NOW: &str = "now";

/// `/clock`: the time, floored to `granularity`, as body and `Last-Modified`.
pub fn clock(granularity: Duration) -> Result<ResourceDescriptor, DescriptorError> {
    ResourceDescriptor::builder("clock")
        .available_media_types(["text/plain", "application/json"])
        .decide(DecisionPoint::Exists, move |_| {
            let now = quantize(Utc::now(), granularity);
            Ok(DecisionResult::yes().with(NOW, now.to_rfc3339()))
        })
        .last_modified(|ctx| Ok(now(ctx)))
        .handle(Handler::Ok, move |ctx| {
            let Some(time) = now(ctx) else {
                return Ok(Rendered::Empty);
            };
            if ctx.media_type().is_some_and(|m| m.is_json()) {
                Ok(json!({
                    "now": time.to_rfc3339(),
                    "granularity_secs": granularity.as_secs(),
                })
                .into())
            } else {
                Ok(format_http_date(time).into())
            }
        })
        .build()
}

fn now(ctx: &Context) -> Option<DateTime<Utc>> {
    ctx.get_str(NOW)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}
