//! Rendering handler results into the negotiated media type.

use axum::body::Bytes;
use serde_json::Value;

use crate::error::ResourceResult;
use crate::negotiation::MediaType;

/// Value returned by a handler before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Empty,
    Text(String),
    Value(Value),
}

impl From<&str> for Rendered {
    fn from(text: &str) -> Self {
        Rendered::Text(text.to_string())
    }
}

impl From<String> for Rendered {
    fn from(text: String) -> Self {
        Rendered::Text(text)
    }
}

impl From<Value> for Rendered {
    fn from(value: Value) -> Self {
        Rendered::Value(value)
    }
}

impl Rendered {
    pub fn is_empty(&self) -> bool {
        matches!(self, Rendered::Empty)
    }

    /// Encode for `media_type`; `None` means no body.
    pub fn encode(&self, media_type: &MediaType) -> ResourceResult<Option<Bytes>> {
        let bytes = match self {
            Rendered::Empty => return Ok(None),
            Rendered::Text(text) if media_type.is_json() => serde_json::to_vec(text)?,
            Rendered::Text(text) if media_type.essence() == "text/html" => {
                escape_html(text).into_bytes()
            }
            Rendered::Text(text) => text.clone().into_bytes(),
            Rendered::Value(value) if media_type.essence() == "text/plain" => {
                plain(value).into_bytes()
            }
            Rendered::Value(value) if media_type.essence() == "text/html" => {
                html(value).into_bytes()
            }
            Rendered::Value(value) => serde_json::to_vec(value)?,
        };
        Ok(Some(Bytes::from(bytes)))
    }
}

/// `Content-Type` header value for a negotiated type.
pub fn content_type(media_type: &MediaType) -> String {
    if media_type.is_text() && media_type.param("charset").is_none() {
        media_type.clone().with_param("charset", "utf-8").to_string()
    } else {
        media_type.to_string()
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}\n", scalar(v)))
            .collect(),
        Value::Array(items) => items.iter().map(|v| format!("{}\n", scalar(v))).collect(),
        other => scalar(other),
    }
}

fn html(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut out = String::from("<dl>");
            for (k, v) in map {
                out.push_str(&format!("<dt>{}</dt><dd>{}</dd>", escape_html(k), html(v)));
            }
            out.push_str("</dl>");
            out
        }
        Value::Array(items) => {
            let mut out = String::from("<ul>");
            for item in items {
                out.push_str(&format!("<li>{}</li>", html(item)));
            }
            out.push_str("</ul>");
            out
        }
        other => escape_html(&scalar(other)),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded(rendered: Rendered, media_type: MediaType) -> String {
        let bytes = rendered.encode(&media_type).unwrap().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_json_encoding() {
        assert_eq!(
            encoded(json!({"id": "1"}).into(), MediaType::json()),
            r#"{"id":"1"}"#
        );
        assert_eq!(encoded("hi".into(), MediaType::json()), r#""hi""#);
    }

    #[test]
    fn test_plain_encoding() {
        assert_eq!(encoded("hello".into(), MediaType::text_plain()), "hello");
        assert_eq!(
            encoded(json!({"a": 1, "b": "x"}).into(), MediaType::text_plain()),
            "a=1\nb=x\n"
        );
        assert_eq!(
            encoded(json!(["1", "2"]).into(), MediaType::text_plain()),
            "1\n2\n"
        );
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(
            encoded(json!({"k": "<b>"}).into(), MediaType::text_html()),
            "<dl><dt>k</dt><dd>&lt;b&gt;</dd></dl>"
        );
    }

    #[test]
    fn test_empty_has_no_body() {
        assert_eq!(Rendered::Empty.encode(&MediaType::json()).unwrap(), None);
    }

    #[test]
    fn test_content_type_adds_charset() {
        assert_eq!(content_type(&MediaType::text_plain()), "text/plain;charset=utf-8");
        assert_eq!(content_type(&MediaType::json()), "application/json");
    }
}
