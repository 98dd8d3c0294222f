//! `Accept-Language` parsing and locale negotiation.
//!
//! Entries are ordered by descending quality, then by descending
//! specificity, and negotiation walks that order against the locales a
//! server supports.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use http::header::HeaderName;
use once_cell::sync::Lazy;
use regex::Regex;
use unic_langid::LanguageIdentifier;

use crate::config::HeaderConfig;
use crate::error::{HeaderError, Result};
use crate::protocol::constants::{headers, ANY_LANGUAGE};
use crate::traits::{self, HeaderInput, TypedHeader};

static WEIGHT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[qQ]\s*=\s*(\d+(?:\.\d*)?|\.\d+)$").unwrap());

/// How narrowly a language range identifies a language variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Specificity {
    /// The `*` wildcard.
    Nonspecific,
    /// Language subtag only, e.g. `de`.
    PartiallySpecific,
    /// Language plus region or script, e.g. `de-AT` or `zh-Hant`.
    Specific,
}

/// One weighted entry of an `Accept-Language` header.
///
/// Equality compares the locale only; quality is ignored.
#[derive(Clone, Debug)]
pub struct Language {
    locale: Option<LanguageIdentifier>,
    pub quality: f32,
    specificity: Specificity,
}

impl Language {
    /// Build an entry from a locale tag (`*` for the wildcard).
    pub fn new(locale: &str, quality: f32) -> Result<Self> {
        let locale = locale.trim();
        if locale == ANY_LANGUAGE {
            return Ok(Language::wildcard(quality));
        }
        let code: LanguageIdentifier = locale
            .parse()
            .map_err(|e| HeaderError::parse(format!("invalid language tag '{}': {}", locale, e)))?;
        let specificity = if code.region.is_some() || code.script.is_some() {
            Specificity::Specific
        } else {
            Specificity::PartiallySpecific
        };
        Ok(Language {
            locale: Some(code),
            quality,
            specificity,
        })
    }

    #[must_use]
    pub fn wildcard(quality: f32) -> Self {
        Language {
            locale: None,
            quality,
            specificity: Specificity::Nonspecific,
        }
    }

    /// Parse `tag[;q=weight]`.
    pub fn parse(text: &str) -> Result<Self> {
        let (locale, weight) = text.split_once(';').unwrap_or((text, ""));
        let weight = weight.trim();
        if weight.is_empty() {
            return Self::new(locale, 1.0);
        }

        let quality = WEIGHT_REGEX
            .captures(weight)
            .and_then(|caps| caps[1].parse::<f32>().ok())
            .filter(|q| (0.0..=1.0).contains(q))
            .ok_or_else(|| HeaderError::parse(format!("invalid quality '{}'", weight)))?;
        Self::new(locale, quality)
    }

    #[must_use]
    pub fn format(&self) -> String {
        format!("{};q={:?}", self, self.quality)
    }

    /// Normalized locale, `None` for the wildcard.
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<&LanguageIdentifier> {
        self.locale.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.locale.is_none()
    }

    /// Negotiation order: higher quality first, then more specific first.
    #[must_use]
    pub fn preference_cmp(&self, other: &Language) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then_with(|| other.specificity.cmp(&self.specificity))
    }

    /// Whether this accepted entry admits `candidate`.
    ///
    /// A wildcard admits anything. A language-only entry, or a candidate
    /// missing its region or script, compares the language subtag alone;
    /// otherwise the full codes must be equal. The rule is not symmetric:
    /// `de-Latn-DE` admits `de-AT`, but `de-AT` does not admit `de-Latn-DE`.
    /// A candidate that is not a valid tag never matches a concrete locale.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let Some(accepted) = &self.locale else {
            return true;
        };
        match candidate.trim().parse::<LanguageIdentifier>() {
            Ok(candidate) => self.matches_code(accepted, &candidate),
            Err(_) => false,
        }
    }

    fn matches_code(&self, accepted: &LanguageIdentifier, candidate: &LanguageIdentifier) -> bool {
        if self.specificity == Specificity::PartiallySpecific
            || candidate.region.is_none()
            || candidate.script.is_none()
        {
            return candidate.language == accepted.language;
        }
        candidate == accepted
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.locale == other.locale
    }
}

impl PartialEq<str> for Language {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Language {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locale {
            Some(code) => write!(f, "{}", code),
            None => f.write_str(ANY_LANGUAGE),
        }
    }
}

impl FromStr for Language {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Accepted languages in negotiation order. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Languages(Vec<Language>);

impl Languages {
    /// Sort `values` into negotiation order. An empty list becomes the
    /// single wildcard entry.
    #[must_use]
    pub fn new(mut values: Vec<Language>) -> Self {
        if values.is_empty() {
            return Languages(vec![Language::wildcard(1.0)]);
        }
        values.sort_by(Language::preference_cmp);
        Languages(values)
    }

    pub fn parse(header: &str) -> Result<Self> {
        Self::parse_with(header, &HeaderConfig::default())
    }

    /// Parse an `Accept-Language` value.
    ///
    /// An empty value accepts anything. Entries with `q=0` are dropped unless
    /// `config.keep_zero_quality` is set; if nothing is left the header is
    /// rejected.
    pub fn parse_with(header: &str, config: &HeaderConfig) -> Result<Self> {
        config.check_length(header)?;
        if header.trim().is_empty() {
            return Ok(Languages::new(Vec::new()));
        }

        let mut langs = Vec::new();
        for entry in header.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let lang = Language::parse(entry)?;
            if lang.quality == 0.0 && !config.keep_zero_quality {
                tracing::trace!("[Headers] Dropping zero-quality language '{}'", lang);
                continue;
            }
            langs.push(lang);
        }
        if langs.is_empty() {
            return Err(HeaderError::parse(format!(
                "no acceptable language in '{}'",
                header
            )));
        }
        Ok(Languages::new(langs))
    }

    #[must_use]
    pub fn format(&self) -> String {
        self.0
            .iter()
            .map(Language::format)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Pick the best supported locale.
    ///
    /// Accepted entries are tried in preference order; for each, candidates
    /// are scanned in the order given and the first match wins.
    #[must_use]
    pub fn negotiate<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Option<&'a S> {
        if candidates.is_empty() {
            return None;
        }
        if self.0.is_empty() {
            return candidates.first();
        }
        self.0.iter().find_map(|accepted| {
            candidates
                .iter()
                .find(|candidate| accepted.matches(candidate.as_ref()))
        })
    }

    /// Every supported locale that matches, best first, without repeats.
    #[must_use]
    pub fn negotiate_all<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Vec<&'a S> {
        let mut picked = vec![false; candidates.len()];
        let mut ordered = Vec::new();
        for accepted in &self.0 {
            for (index, candidate) in candidates.iter().enumerate() {
                if !picked[index] && accepted.matches(candidate.as_ref()) {
                    picked[index] = true;
                    ordered.push(candidate);
                }
            }
        }
        ordered
    }

    /// Formatted locale tags, in negotiation order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.0.iter().map(Language::to_string).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Language> {
        self.0.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Language> {
        self.0.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for values built through this type's constructors.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Languages {
    type Item = &'a Language;
    type IntoIter = std::slice::Iter<'a, Language>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Languages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Languages {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TypedHeader for Languages {
    fn name() -> HeaderName {
        headers::ACCEPT_LANGUAGE
    }

    fn parse_header(value: &str) -> Result<Self> {
        Self::parse(value)
    }

    fn format_header(&self) -> String {
        self.format()
    }
}

/// Canonical `Accept-Language` header text from a value or raw text.
pub fn coerce(input: HeaderInput<'_, Languages>) -> Result<String> {
    traits::coerce(input)
}
