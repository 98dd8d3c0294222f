//! Low-level tokenizer shared by every header value type.
//!
//! Covers quote-aware list splitting, `;name=value` parameter scanning and
//! the percent-encoding rules used when URIs are written into headers.

use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::error::{HeaderError, Result};

/// Characters never percent-encoded: `A-Z a-z 0-9 _ . - ~`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Path components keep `+&=/`.
pub const PATH_SAFE: &AsciiSet = &UNRESERVED.remove(b'+').remove(b'&').remove(b'=').remove(b'/');

/// Query components keep `?/=`.
pub const QUERY_SAFE: &AsciiSet = &UNRESERVED.remove(b'?').remove(b'/').remove(b'=');

/// Fragment components keep `?/#+&=`.
pub const FRAGMENT_SAFE: &AsciiSet = &UNRESERVED
    .remove(b'?')
    .remove(b'/')
    .remove(b'#')
    .remove(b'+')
    .remove(b'&')
    .remove(b'=');

/// Link targets keep `:/`.
pub const TARGET_SAFE: &AsciiSet = &UNRESERVED.remove(b':').remove(b'/');

/// Link anchors keep `#` and `/`.
pub const ANCHOR_SAFE: &AsciiSet = &UNRESERVED.remove(b'#').remove(b'/');

/// Extended parameter values (`title*`) keep only unreserved characters.
pub const EXT_VALUE_SAFE: &AsciiSet = UNRESERVED;

static PARAMETER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*([\w!#$%&'*+\-.^_`|~]+)\s*(?:=\s*(?:([\w!#$%&'*+\-.^_`|~]+)|"((?:[^"\\]|\\.)*)"))?\s*$"#,
    )
    .unwrap()
});

/// Parameters following the primary value of a header, in encounter order.
///
/// Names are lower-cased. Lookups by name return the last occurrence, so the
/// type behaves as a mapping while still exposing repeated names through
/// [`Parameters::get_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
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

/// Remove one layer of surrounding double quotes, if present.
#[must_use]
pub fn dequote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Whether `value` is a non-empty RFC 9110 token and may be written unquoted.
#[must_use]
pub fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Wrap a value in double quotes, escaping embedded quotes and backslashes.
#[must_use]
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split `value` on `separator` wherever it appears outside a quoted string.
///
/// Backslash escapes inside quotes are kept verbatim so the pieces can be
/// handed to a later stage unchanged.
pub(crate) fn split_outside_quotes(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == separator && !quoted => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Split a comma-separated header list.
///
/// Commas inside quoted strings do not split. Each token is trimmed and
/// loses one layer of surrounding quotes; empty tokens are dropped.
#[must_use]
pub fn split_list(header: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in header.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if quoted {
            match c {
                '\\' => escaped = true,
                '"' => {
                    quoted = false;
                    current.push(c);
                }
                _ => current.push(c),
            }
            continue;
        }
        match c {
            ',' => items.push(std::mem::take(&mut current)),
            '"' => {
                quoted = true;
                current.push(c);
            }
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| dequote(item).to_string())
        .collect()
}

fn unescape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a header into its primary value and its `;name=value` parameters.
///
/// Parameter names are lower-cased; values are unquoted and have `%22` and
/// `%0D%0A` restored to `"` and a newline. A parameter that does not match
/// the grammar is skipped and the rest of the header is still parsed, so a
/// single malformed parameter never fails the whole value. A bare `;name`
/// yields an empty value.
#[must_use]
pub fn parse_parameters(header: &str) -> (String, Parameters) {
    let Some(pos) = header.find(';') else {
        return (header.trim().to_string(), Parameters::default());
    };

    let primary = header[..pos].trim().to_string();
    let mut params = Vec::new();
    for segment in split_outside_quotes(&header[pos + 1..], ';') {
        if segment.trim().is_empty() {
            continue;
        }
        let Some(caps) = PARAMETER_REGEX.captures(segment) else {
            tracing::trace!("[Headers] Skipping malformed parameter: '{}'", segment);
            continue;
        };
        let name = caps[1].to_ascii_lowercase();
        let value = match (caps.get(2), caps.get(3)) {
            (Some(token), _) => token.as_str().to_string(),
            (None, Some(quoted)) => unescape_quoted(quoted.as_str()),
            (None, None) => String::new(),
        };
        let value = value.replace("%22", "\"").replace("%0D%0A", "\n");
        params.push((name, value));
    }
    (primary, Parameters(params))
}

/// Percent-encode `value`, leaving unreserved characters and the
/// characters allowed by `safe` untouched. Non-ASCII text is encoded as UTF-8.
#[must_use]
pub fn percent_encode(value: &str, safe: &'static AsciiSet) -> String {
    utf8_percent_encode(value, safe).to_string()
}

/// Decode `%XX` sequences, requiring the result to be valid UTF-8.
pub fn percent_decode(value: &str) -> Result<String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| HeaderError::parse(format!("invalid UTF-8 in '{}': {}", value, e)))
}

struct UriParts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: &'a str,
    fragment: &'a str,
}

fn split_uri(uri: &str) -> UriParts<'_> {
    let (rest, fragment) = uri.split_once('#').unwrap_or((uri, ""));
    let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));

    let mut scheme = None;
    let mut rest = rest;
    if let Some(colon) = rest.find(':') {
        let candidate = &rest[..colon];
        let valid = candidate
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            scheme = Some(candidate);
            rest = &rest[colon + 1..];
        }
    }

    let mut authority = None;
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find('/').unwrap_or(after.len());
        authority = Some(&after[..end]);
        rest = &after[end..];
    }

    UriParts {
        scheme,
        authority,
        path: rest,
        query,
        fragment,
    }
}

/// Percent-encode the path, query and fragment of a URI, each with its own
/// safe set. Scheme and authority are left as given.
#[must_use]
pub fn encode_uri(uri: &str) -> String {
    let parts = split_uri(uri);
    let mut out = String::with_capacity(uri.len());
    if let Some(scheme) = parts.scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(authority) = parts.authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(&percent_encode(parts.path, PATH_SAFE));
    if !parts.query.is_empty() {
        out.push('?');
        out.push_str(&percent_encode(parts.query, QUERY_SAFE));
    }
    if !parts.fragment.is_empty() {
        out.push('#');
        out.push_str(&percent_encode(parts.fragment, FRAGMENT_SAFE));
    }
    out
}
