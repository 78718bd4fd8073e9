//! `Accept` header parsing.

use crate::negotiation::media_type::MediaType;

/// Quality value in thousandths (`q=0.5` is 500).
pub type Quality = u16;

pub const MAX_QUALITY: Quality = 1000;

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    /// The range, with the `q` parameter removed.
    pub range: MediaType,
    pub quality: Quality,
}

impl MediaRange {
    /// 0 for `*/*`, 1 for `type/*`, 2 for `type/subtype`, 3 when parameters are present.
    pub fn specificity(&self) -> u8 {
        if !self.range.params().is_empty() {
            3
        } else if self.range.subtype() != "*" {
            2
        } else if self.range.main_type() != "*" {
            1
        } else {
            0
        }
    }

    pub fn matches(&self, media_type: &MediaType) -> bool {
        self.range.covers(media_type)
    }
}

/// Parse an `Accept` header. Ranges that do not parse are dropped.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            let parsed = MediaType::parse(part).ok()?;
            let quality = match parsed.param("q") {
                Some(q) => parse_quality(q)?,
                None => MAX_QUALITY,
            };

            let mut range = MediaType::new(parsed.main_type(), parsed.subtype());
            for (k, v) in parsed.params().iter().filter(|(k, _)| k != "q") {
                range = range.with_param(k, v.clone());
            }
            Some(MediaRange { range, quality })
        })
        .collect()
}

/// Quality the client assigns to `media_type`, taken from the most specific
/// matching range. Unmatched types get 0.
pub fn quality_of(ranges: &[MediaRange], media_type: &MediaType) -> Quality {
    let mut best: Option<&MediaRange> = None;
    for range in ranges.iter().filter(|r| r.matches(media_type)) {
        if best.map_or(true, |b| range.specificity() > b.specificity()) {
            best = Some(range);
        }
    }
    best.map_or(0, |r| r.quality)
}

fn parse_quality(value: &str) -> Option<Quality> {
    let q: f32 = value.trim().parse().ok()?;
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    Some((q * MAX_QUALITY as f32).round() as Quality)
}
