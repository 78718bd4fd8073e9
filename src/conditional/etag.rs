//! Entity tags and entity-tag lists.

use std::fmt;

/// An entity tag as carried in `ETag`, `If-Match` and `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag {
    tag: String,
    weak: bool,
}

impl ETag {
    pub fn strong(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            weak: false,
        }
    }

    pub fn weak(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            weak: true,
        }
    }

    /// Strong tag derived from a store version.
    pub fn from_version(version: u64) -> Self {
        Self::strong(format!("v{}", version))
    }

    /// Parse a single quoted tag, optionally prefixed with `W/`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (weak, quoted) = match input.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let tag = quoted.strip_prefix('"')?.strip_suffix('"')?;
        if tag.contains('"') {
            return None;
        }
        Some(Self {
            tag: tag.to_string(),
            weak,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// Both tags strong and identical (used by `If-Match`).
    pub fn strong_eq(&self, other: &ETag) -> bool {
        !self.weak && !other.weak && self.tag == other.tag
    }

    /// Identical opaque tags, weakness ignored (used by `If-None-Match`).
    pub fn weak_eq(&self, other: &ETag) -> bool {
        self.tag == other.tag
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.tag)
        } else {
            write!(f, "\"{}\"", self.tag)
        }
    }
}

/// Value of an `If-Match` or `If-None-Match` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagList {
    /// `*`
    Any,
    Tags(Vec<ETag>),
}

impl TagList {
    /// Parse a comma separated list of tags. Unparseable members are skipped.
    pub fn parse(header: &str) -> Self {
        if header.trim() == "*" {
            return TagList::Any;
        }
        TagList::Tags(header.split(',').filter_map(ETag::parse).collect())
    }

    pub fn matches_strong(&self, current: Option<&ETag>) -> bool {
        match self {
            TagList::Any => current.is_some(),
            TagList::Tags(tags) => current.is_some_and(|c| tags.iter().any(|t| t.strong_eq(c))),
        }
    }

    pub fn matches_weak(&self, current: Option<&ETag>) -> bool {
        match self {
            TagList::Any => current.is_some(),
            TagList::Tags(tags) => current.is_some_and(|c| tags.iter().any(|t| t.weak_eq(c))),
        }
    }
}
