//! Entity tags and the `If-Match` / `If-None-Match` conditions built on them.
//!
//! See [RFC 9110 §8.8.3](https://www.rfc-editor.org/rfc/rfc9110#section-8.8.3).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use http::header::HeaderName;

use crate::config::HeaderConfig;
use crate::error::{HeaderError, Result};
use crate::protocol::constants::{headers, ANY_ETAG};
use crate::protocol::scanner::split_outside_quotes;
use crate::traits::{self, HeaderInput, TypedHeader};

/// An entity tag.
///
/// Equality and hashing look at `value` only, which is the weak comparison
/// function. Use [`ETag::strong_compare`] where the strong function is required.
#[derive(Clone, Debug, Eq, serde::Serialize, serde::Deserialize)]
pub struct ETag {
    /// Opaque tag, without the surrounding quotes.
    pub value: String,
    pub weak: bool,
}

impl ETag {
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, weak: bool) -> Self {
        ETag {
            value: value.into(),
            weak,
        }
    }

    #[inline]
    #[must_use]
    pub fn strong(value: impl Into<String>) -> Self {
        Self::new(value, false)
    }

    #[inline]
    #[must_use]
    pub fn weak(value: impl Into<String>) -> Self {
        Self::new(value, true)
    }

    /// Parse `"value"` or `W/"value"`. Quotes are optional on input.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (weak, rest) = match text.strip_prefix("W/").or_else(|| text.strip_prefix("w/")) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        ETag::new(rest.trim_matches('"'), weak)
    }

    #[must_use]
    pub fn format(&self) -> String {
        if self.weak {
            format!("W/\"{}\"", self.value)
        } else {
            format!("\"{}\"", self.value)
        }
    }

    /// Strong comparison: equal values and neither tag is weak.
    #[inline]
    #[must_use]
    pub fn strong_compare(&self, other: &ETag) -> bool {
        self.value == other.value && !self.weak && !other.weak
    }

    /// Weak comparison: equal values, weakness ignored.
    #[inline]
    #[must_use]
    pub fn weak_compare(&self, other: &ETag) -> bool {
        self.value == other.value
    }
}

impl PartialEq for ETag {
    fn eq(&self, other: &Self) -> bool {
        self.weak_compare(other)
    }
}

impl PartialEq<str> for ETag {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for ETag {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl Hash for ETag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for ETag {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::parse(s))
    }
}

impl TypedHeader for ETag {
    fn name() -> HeaderName {
        headers::ETAG
    }

    fn parse_header(value: &str) -> Result<Self> {
        Ok(Self::parse(value))
    }

    fn format_header(&self) -> String {
        self.format()
    }
}

/// A set of entity tags, deduplicated by value.
///
/// Iteration and formatting follow first-seen order. Equality is set
/// equality by value.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ETags(Vec<ETag>);

impl ETags {
    #[must_use]
    pub fn new(tags: impl IntoIterator<Item = ETag>) -> Self {
        let mut set = ETags::default();
        for tag in tags {
            set.insert(tag);
        }
        set
    }

    fn insert(&mut self, tag: ETag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn parse(header: &str) -> Result<Self> {
        Self::parse_with(header, &HeaderConfig::default())
    }

    /// Parse a comma-separated list of entity tags. Fails when no tag is
    /// present or the value exceeds `config.max_header_length`.
    pub fn parse_with(header: &str, config: &HeaderConfig) -> Result<Self> {
        config.check_length(header)?;
        let tags = ETags::new(
            split_outside_quotes(header, ',')
                .into_iter()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(ETag::parse),
        );
        if tags.is_empty() {
            return Err(HeaderError::parse(format!(
                "no entity tag in '{}'",
                header
            )));
        }
        Ok(tags)
    }

    #[must_use]
    pub fn format(&self) -> String {
        self.0
            .iter()
            .map(ETag::format)
            .collect::<Vec<_>>()
            .join(",")
    }

    #[must_use]
    pub fn contains(&self, tag: &ETag) -> bool {
        self.0.contains(tag)
    }

    /// Membership by bare value.
    #[must_use]
    pub fn contains_value(&self, value: &str) -> bool {
        self.0.iter().any(|tag| tag == value)
    }

    /// True if any tag in the set weakly matches `current`.
    #[must_use]
    pub fn matches_weak(&self, current: &ETag) -> bool {
        self.0.iter().any(|tag| tag.weak_compare(current))
    }

    /// True if any tag in the set strongly matches `current`.
    #[must_use]
    pub fn matches_strong(&self, current: &ETag) -> bool {
        self.0.iter().any(|tag| tag.strong_compare(current))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ETag> {
        self.0.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for ETags {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|tag| other.contains(tag))
    }
}

impl Eq for ETags {}

impl FromIterator<ETag> for ETags {
    fn from_iter<I: IntoIterator<Item = ETag>>(iter: I) -> Self {
        ETags::new(iter)
    }
}

impl<'a> IntoIterator for &'a ETags {
    type Item = &'a ETag;
    type IntoIter = std::slice::Iter<'a, ETag>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ETags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Value of `If-Match` or `If-None-Match`: the `*` literal or a tag set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityTagCondition {
    Any,
    Tags(ETags),
}

impl EntityTagCondition {
    pub fn parse(header: &str) -> Result<Self> {
        if header.trim() == ANY_ETAG {
            return Ok(EntityTagCondition::Any);
        }
        ETags::parse(header).map(EntityTagCondition::Tags)
    }

    #[must_use]
    pub fn format(&self) -> String {
        match self {
            EntityTagCondition::Any => ANY_ETAG.to_string(),
            EntityTagCondition::Tags(tags) => tags.format(),
        }
    }

    /// `If-Match` evaluation, using strong comparison.
    ///
    /// `current` is the tag of the selected representation, if one exists.
    #[must_use]
    pub fn if_match_passes(&self, current: Option<&ETag>) -> bool {
        match (self, current) {
            (_, None) => false,
            (EntityTagCondition::Any, Some(_)) => true,
            (EntityTagCondition::Tags(tags), Some(current)) => tags.matches_strong(current),
        }
    }

    /// `If-None-Match` evaluation, using weak comparison.
    #[must_use]
    pub fn if_none_match_passes(&self, current: Option<&ETag>) -> bool {
        match (self, current) {
            (_, None) => true,
            (EntityTagCondition::Any, Some(_)) => false,
            (EntityTagCondition::Tags(tags), Some(current)) => !tags.matches_weak(current),
        }
    }
}

impl fmt::Display for EntityTagCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// `If-Match` request header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfMatch(pub EntityTagCondition);

/// `If-None-Match` request header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfNoneMatch(pub EntityTagCondition);

impl TypedHeader for IfMatch {
    fn name() -> HeaderName {
        headers::IF_MATCH
    }

    fn parse_header(value: &str) -> Result<Self> {
        EntityTagCondition::parse(value).map(IfMatch)
    }

    fn format_header(&self) -> String {
        self.0.format()
    }
}

impl TypedHeader for IfNoneMatch {
    fn name() -> HeaderName {
        headers::IF_NONE_MATCH
    }

    fn parse_header(value: &str) -> Result<Self> {
        EntityTagCondition::parse(value).map(IfNoneMatch)
    }

    fn format_header(&self) -> String {
        self.0.format()
    }
}

/// Canonical `ETag` header text from a tag or raw text.
pub fn coerce(input: HeaderInput<'_, ETag>) -> Result<String> {
    traits::coerce(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_strong() {
        let e = ETag::parse("\"33a64df551425fcc55e4d42a148795d9f25f89d4\"");
        assert_eq!(e, "33a64df551425fcc55e4d42a148795d9f25f89d4");
        assert!(!e.weak);
        assert_eq!(e.format(), "\"33a64df551425fcc55e4d42a148795d9f25f89d4\"");
    }

    #[test]
    fn test_etag_weak() {
        let e = ETag::parse("W/\"0815\"");
        assert_eq!(e, "0815");
        assert!(e.weak);
        assert_eq!(e.format(), "W/\"0815\"");

        let lower = ETag::parse("w/\"0815\"");
        assert!(lower.weak);
        assert_eq!(lower.format(), "W/\"0815\"");
    }

    #[test]
    fn test_etag_unquoted_input() {
        let e = ETag::parse("abc");
        assert_eq!(e.value, "abc");
        assert_eq!(e.to_string(), "\"abc\"");
    }

    #[test]
    fn test_etag_strips_repeated_quotes() {
        let e = ETag::parse("\"\"abc\"\"");
        assert_eq!(e.value, "abc");
        assert_eq!(e.format(), "\"abc\"");
        assert!(!ETag::parse("W/\"\"v\"\"").value.contains('"'));
    }

    #[test]
    fn test_comparison() {
        let strong = ETag::strong("x");
        let weak = ETag::weak("x");
        assert_eq!(strong, weak);
        assert!(strong.weak_compare(&weak));
        assert!(!strong.strong_compare(&weak));
        assert!(strong.strong_compare(&ETag::strong("x")));
        assert!(!weak.strong_compare(&ETag::weak("x")));
    }

    #[test]
    fn test_etags_single() {
        let tags = ETags::parse("\"33a64df551425fcc55e4d42a148795d9f25f89d4\"").unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags, ETags::new([ETag::strong("33a64df551425fcc55e4d42a148795d9f25f89d4")]));
        assert!(tags.contains_value("33a64df551425fcc55e4d42a148795d9f25f89d4"));
    }

    #[test]
    fn test_etags_membership_ignores_weakness() {
        let tags = ETags::new([ETag::weak("33a64df551425fcc55e4d42a148795d9f25f89d4")]);
        assert!(tags.contains_value("33a64df551425fcc55e4d42a148795d9f25f89d4"));
        assert!(tags.contains(&ETag::strong("33a64df551425fcc55e4d42a148795d9f25f89d4")));
    }

    #[test]
    fn test_etags_multiple() {
        let tags = ETags::parse(
            "\"33a64df551425fcc55e4d42a148795d9f25f89d4\",\"ebeb4dbc1362d124452335a71286c21d\",W/\"sdfe7vvc5sf68aaerv85\"",
        )
        .unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(
            tags,
            ETags::new([
                ETag::strong("33a64df551425fcc55e4d42a148795d9f25f89d4"),
                ETag::strong("ebeb4dbc1362d124452335a71286c21d"),
                ETag::weak("sdfe7vvc5sf68aaerv85"),
            ])
        );
        for value in [
            "33a64df551425fcc55e4d42a148795d9f25f89d4",
            "ebeb4dbc1362d124452335a71286c21d",
            "sdfe7vvc5sf68aaerv85",
        ] {
            assert!(tags.contains_value(value));
        }
    }

    #[test]
    fn test_etags_dedup_and_format() {
        let tags = ETags::parse("\"a\", W/\"a\", \"b\"").unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.format(), "\"a\",\"b\"");
    }

    #[test]
    fn test_etags_empty_is_error() {
        assert!(ETags::parse("").unwrap_err().is_parse_error());
        assert!(ETags::parse(" , ,").is_err());
    }

    #[test]
    fn test_etags_length_limit() {
        let config = HeaderConfig {
            max_header_length: 8,
            ..Default::default()
        };
        assert!(ETags::parse_with("\"a\",\"b\"", &config).is_ok());
        assert!(ETags::parse_with("\"abcdef\",\"b\"", &config)
            .unwrap_err()
            .is_parse_error());
    }

    #[test]
    fn test_condition_any() {
        let cond = EntityTagCondition::parse(" * ").unwrap();
        assert_eq!(cond, EntityTagCondition::Any);
        assert_eq!(cond.format(), "*");
        assert!(cond.if_match_passes(Some(&ETag::weak("x"))));
        assert!(!cond.if_match_passes(None));
        assert!(!cond.if_none_match_passes(Some(&ETag::strong("x"))));
        assert!(cond.if_none_match_passes(None));
    }

    #[test]
    fn test_condition_tags() {
        let cond = EntityTagCondition::parse("\"x\", W/\"y\"").unwrap();
        assert!(cond.if_match_passes(Some(&ETag::strong("x"))));
        assert!(!cond.if_match_passes(Some(&ETag::strong("y"))));
        assert!(!cond.if_match_passes(Some(&ETag::weak("x"))));
        assert!(!cond.if_none_match_passes(Some(&ETag::strong("y"))));
        assert!(cond.if_none_match_passes(Some(&ETag::strong("z"))));
    }

    #[test]
    fn test_coerce() {
        let tag = ETag::weak("v1");
        assert_eq!(coerce(HeaderInput::Typed(&tag)).unwrap(), "W/\"v1\"");
        assert_eq!(coerce(HeaderInput::Raw("v1")).unwrap(), "\"v1\"");
        let once = coerce(HeaderInput::Raw("W/\"v1\"")).unwrap();
        assert_eq!(coerce(HeaderInput::Raw(&once)).unwrap(), once);
    }
}
