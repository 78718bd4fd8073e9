//! Media type values.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a media type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("media type is empty")]
    Empty,

    #[error("media type {0:?} is missing a subtype")]
    MissingSubtype(String),

    #[error("media type {0:?} has a wildcard type with a concrete subtype")]
    InvalidWildcard(String),
}

/// A `type/subtype` pair with optional parameters.
///
/// Type, subtype and parameter names are stored lowercase. Parameter values
/// keep their case with surrounding quotes removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    main: String,
    sub: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Build a media type without parameters.
    pub fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into().to_ascii_lowercase(),
            sub: sub.into().to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    pub fn json() -> Self {
        Self::new("application", "json")
    }

    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    pub fn text_html() -> Self {
        Self::new("text", "html")
    }

    /// The `*/*` range.
    pub fn any() -> Self {
        Self::new("*", "*")
    }

    /// Parse `type/subtype; name=value; ...`.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        let mut parts = input.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        if essence.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let (main, sub) = essence
            .split_once('/')
            .map(|(m, s)| (m.trim(), s.trim()))
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| MediaTypeError::MissingSubtype(essence.to_string()))?;

        if main == "*" && sub != "*" {
            return Err(MediaTypeError::InvalidWildcard(essence.to_string()));
        }

        let params = parts
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| {
                (
                    k.trim().to_ascii_lowercase(),
                    v.trim().trim_matches('"').to_string(),
                )
            })
            .filter(|(k, _)| !k.is_empty())
            .collect();

        Ok(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            params,
        })
    }

    /// Add or replace a parameter.
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.params.retain(|(k, _)| *k != name);
        self.params.push((name, value.into()));
        self
    }

    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn subtype(&self) -> &str {
        &self.sub
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn is_wildcard(&self) -> bool {
        self.main == "*" || self.sub == "*"
    }

    /// `application/json` or any `+json` structured syntax suffix.
    pub fn is_json(&self) -> bool {
        self.sub == "json" || self.sub.ends_with("+json")
    }

    pub fn is_text(&self) -> bool {
        self.main == "text"
    }

    /// Whether this value, read as a range, covers `concrete`.
    ///
    /// Every parameter of the range must appear on `concrete` with an equal
    /// value; `q` is never treated as a matching parameter.
    pub fn covers(&self, concrete: &MediaType) -> bool {
        let type_matches = self.main == "*"
            || (self.main == concrete.main && (self.sub == "*" || self.sub == concrete.sub));

        type_matches
            && self
                .params
                .iter()
                .filter(|(k, _)| k != "q")
                .all(|(k, v)| concrete.param(k).is_some_and(|cv| cv.eq_ignore_ascii_case(v)))
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)?;
        for (k, v) in &self.params {
            write!(f, ";{}={}", k, v)?;
        }
        Ok(())
    }
}
