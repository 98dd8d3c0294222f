//! `Range` request header and resolution against a known representation length.
//!
//! Implemented according to
//! - [RFC 9110 §14.1.1](https://www.rfc-editor.org/rfc/rfc9110#section-14.1.1): range-set syntax
//! - [RFC 9110 §14.2](https://www.rfc-editor.org/rfc/rfc9110#section-14.2): combining overlapping ranges

use std::fmt;
use std::str::FromStr;

use http::header::HeaderName;

use crate::config::HeaderConfig;
use crate::error::{HeaderError, Result};
use crate::protocol::constants::headers;
use crate::traits::{self, HeaderInput, TypedHeader};

/// One range-spec of a range-set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RangeSpec {
    /// `first-last`, both inclusive.
    Bounded(u64, u64),
    /// `first-`: from `first` to the end of the representation.
    Open(u64),
    /// `-length`: the final `length` units.
    Suffix(u64),
}

impl RangeSpec {
    fn parse(spec: &str) -> Result<Self> {
        let (first, last) = spec
            .split_once('-')
            .ok_or_else(|| HeaderError::parse(format!("missing '-' in range '{}'", spec)))?;
        let (first, last) = (first.trim(), last.trim());
        let bound = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| HeaderError::parse(format!("invalid range bound '{}'", s)))
        };
        match (first.is_empty(), last.is_empty()) {
            (true, true) => Err(HeaderError::parse("empty range-spec '-'")),
            (true, false) => Ok(RangeSpec::Suffix(bound(last)?)),
            (false, true) => Ok(RangeSpec::Open(bound(first)?)),
            (false, false) => {
                let (start, end) = (bound(first)?, bound(last)?);
                if end < start {
                    return Err(HeaderError::parse(format!(
                        "range end {} precedes start {}",
                        end, start
                    )));
                }
                Ok(RangeSpec::Bounded(start, end))
            }
        }
    }

    /// Absolute inclusive bounds within `total_length`, or `None` when the
    /// spec selects nothing.
    #[must_use]
    pub fn resolve(&self, total_length: u64) -> Option<(u64, u64)> {
        let last = total_length.checked_sub(1)?;
        match *self {
            RangeSpec::Bounded(start, end) if start <= last => Some((start, end.min(last))),
            RangeSpec::Open(start) if start <= last => Some((start, last)),
            RangeSpec::Suffix(length) if length > 0 => {
                Some((total_length.saturating_sub(length), last))
            }
            _ => None,
        }
    }

    /// Number of units covered by a bounded spec. `None` for open and suffix
    /// specs, for a reversed pair, and when the count does not fit in a `u64`.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        match *self {
            RangeSpec::Bounded(start, end) => end.checked_sub(start)?.checked_add(1),
            RangeSpec::Open(_) | RangeSpec::Suffix(_) => None,
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::Bounded(start, end) => write!(f, "{}-{}", start, end),
            RangeSpec::Open(start) => write!(f, "{}-", start),
            RangeSpec::Suffix(length) => write!(f, "-{}", length),
        }
    }
}

/// A parsed `Range` header: a unit and its range-specs in header order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Ranges {
    pub unit: String,
    pub values: Vec<RangeSpec>,
}

impl Ranges {
    #[must_use]
    pub fn new(unit: impl Into<String>, values: Vec<RangeSpec>) -> Self {
        Ranges {
            unit: unit.into(),
            values,
        }
    }

    pub fn parse(header: &str) -> Result<Self> {
        Self::parse_with(header, &HeaderConfig::default())
    }

    /// Parse `unit=spec[,spec...]`, enforcing the limits in `config`.
    pub fn parse_with(header: &str, config: &HeaderConfig) -> Result<Self> {
        config.check_length(header)?;
        let (unit, set) = header
            .split_once('=')
            .ok_or_else(|| HeaderError::parse(format!("missing '=' in range '{}'", header)))?;
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(HeaderError::parse(format!("missing range unit in '{}'", header)));
        }

        let mut values = Vec::new();
        for spec in set.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if values.len() == config.max_ranges {
                return Err(HeaderError::parse(format!(
                    "more than {} ranges requested",
                    config.max_ranges
                )));
            }
            values.push(RangeSpec::parse(spec)?);
        }
        if values.is_empty() {
            return Err(HeaderError::parse(format!("no range-spec in '{}'", header)));
        }
        Ok(Ranges::new(unit, values))
    }

    #[must_use]
    pub fn format(&self) -> String {
        let specs = self
            .values
            .iter()
            .map(RangeSpec::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}={}", self.unit, specs)
    }

    /// Resolve every spec to absolute bounds within `total_length`.
    ///
    /// Specs selecting nothing are dropped rather than clamped, so the result
    /// can hold fewer specs than `self`, or none at all. Without `merge` the output keeps
    /// header order; with `merge` it is sorted by start and every pair of
    /// overlapping or adjacent ranges is coalesced.
    #[must_use]
    pub fn resolve(&self, total_length: u64, merge: bool) -> Ranges {
        let mut resolved = Vec::with_capacity(self.values.len());
        for spec in &self.values {
            match spec.resolve(total_length) {
                Some(bounds) => resolved.push(bounds),
                None => tracing::trace!(
                    "[Headers] Dropping unsatisfiable range {} for length {}",
                    spec,
                    total_length
                ),
            }
        }

        if merge {
            resolved = merge_intervals(resolved);
        }

        Ranges::new(
            self.unit.clone(),
            resolved
                .into_iter()
                .map(|(start, end)| RangeSpec::Bounded(start, end))
                .collect(),
        )
    }

    #[must_use]
    pub fn resolve_with(&self, total_length: u64, config: &HeaderConfig) -> Ranges {
        self.resolve(total_length, config.merge_ranges)
    }

    /// True if at least one spec selects part of a `total_length` representation.
    #[must_use]
    pub fn is_satisfiable(&self, total_length: u64) -> bool {
        self.values
            .iter()
            .any(|spec| spec.resolve(total_length).is_some())
    }

    /// `Content-Range` values for the merged, resolved ranges.
    #[must_use]
    pub fn content_ranges(&self, total_length: u64) -> Vec<String> {
        self.resolve(total_length, true)
            .values
            .iter()
            .filter_map(|spec| match spec {
                RangeSpec::Bounded(start, end) => Some(format!(
                    "{} {}-{}/{}",
                    self.unit, start, end, total_length
                )),
                _ => None,
            })
            .collect()
    }

    /// `Content-Range` value sent with a 416 response.
    #[must_use]
    pub fn content_range_unsatisfied(&self, total_length: u64) -> String {
        format!("{} */{}", self.unit, total_length)
    }
}

fn merge_intervals(mut ranges: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    ranges.sort_by_key(|&(start, _)| start);
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(current) if start <= current.1.saturating_add(1) => {
                current.1 = current.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

impl fmt::Display for Ranges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Ranges {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TypedHeader for Ranges {
    fn name() -> HeaderName {
        headers::RANGE
    }

    fn parse_header(value: &str) -> Result<Self> {
        Self::parse(value)
    }

    fn format_header(&self) -> String {
        self.format()
    }
}

/// Canonical `Range` header text from a value or raw text.
pub fn coerce(input: HeaderInput<'_, Ranges>) -> Result<String> {
    traits::coerce(input)
}
