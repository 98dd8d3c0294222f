//! `Link` header values ([RFC 8288]).
//!
//! Target attributes (`title`, `title*`, `anchor`, `hreflang`, `type`,
//! `crossorigin`) get typed fields; every other parameter is kept as an
//! extension in the order it was seen.
//!
//! [RFC 8288]: https://www.rfc-editor.org/rfc/rfc8288

use std::fmt;
use std::str::FromStr;

use http::header::HeaderName;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::HeaderConfig;
use crate::error::{HeaderError, Result};
use crate::protocol::constants::headers;
use crate::protocol::scanner::{
    self, encode_uri, is_token, parse_parameters, percent_encode, quote_string, ANCHOR_SAFE,
    EXT_VALUE_SAFE, TARGET_SAFE,
};
use crate::traits::{self, HeaderInput, TypedHeader};

/// Allowed values of the `crossorigin` target attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

impl CrossOrigin {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossOrigin::Anonymous => "anonymous",
            CrossOrigin::UseCredentials => "use-credentials",
        }
    }
}

impl FromStr for CrossOrigin {
    type Err = HeaderError;

    /// Case-insensitive. An empty value is the bare `crossorigin` flag.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "anonymous" => Ok(CrossOrigin::Anonymous),
            "use-credentials" => Ok(CrossOrigin::UseCredentials),
            other => Err(HeaderError::Validation(format!(
                "unsupported crossorigin value '{}'",
                other
            ))),
        }
    }
}

/// Value of the `title*` parameter: a language tag and UTF-8 text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TitleStar {
    pub language: String,
    pub value: String,
}

impl TitleStar {
    #[must_use]
    pub fn new(language: impl Into<String>, value: impl Into<String>) -> Self {
        TitleStar {
            language: language.into(),
            value: value.into(),
        }
    }

    /// Parse an RFC 8187 ext-value: `charset'language'pct-encoded`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.splitn(3, '\'');
        let (Some(charset), Some(language), Some(encoded)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(HeaderError::parse(format!("malformed ext-value '{}'", text)));
        };
        let value = match charset.to_ascii_lowercase().as_str() {
            "utf-8" => scanner::percent_decode(encoded)?,
            "iso-8859-1" => percent_decode_str(encoded).map(char::from).collect(),
            other => {
                return Err(HeaderError::Validation(format!(
                    "unsupported ext-value charset '{}'",
                    other
                )))
            }
        };
        Ok(TitleStar::new(language, value))
    }

    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "UTF-8'{}'{}",
            self.language,
            percent_encode(&self.value, EXT_VALUE_SAFE)
        )
    }
}

/// A single link: target URI, relation type and target attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Link {
    pub target: String,
    pub rel: String,
    pub title: Option<String>,
    pub title_star: Option<TitleStar>,
    pub anchor: Option<String>,
    pub hreflang: Vec<String>,
    pub type_hint: Option<String>,
    pub crossorigin: Option<CrossOrigin>,
    pub extensions: Vec<(String, String)>,
}

fn decode_or_raw(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl Link {
    #[must_use]
    pub fn new(target: impl Into<String>, rel: impl Into<String>) -> Self {
        Link {
            target: target.into(),
            rel: rel.into(),
            title: None,
            title_star: None,
            anchor: None,
            hreflang: Vec::new(),
            type_hint: None,
            crossorigin: None,
            extensions: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_title_star(mut self, language: impl Into<String>, value: impl Into<String>) -> Self {
        self.title_star = Some(TitleStar::new(language, value));
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn with_hreflang(mut self, hreflang: impl Into<String>) -> Self {
        self.hreflang.push(hreflang.into());
        self
    }

    pub fn with_type_hint(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn with_crossorigin(mut self, crossorigin: CrossOrigin) -> Self {
        self.crossorigin = Some(crossorigin);
        self
    }

    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.push((name.into(), value.into()));
        self
    }

    /// Parse `<target>; rel=...[; name=value ...]`.
    ///
    /// Angle brackets around the target are optional. A missing `rel` is a
    /// parse error; an unknown `crossorigin` value is a validation error.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (target, rest) = match text.strip_prefix('<') {
            Some(inner) => {
                let end = inner
                    .find('>')
                    .ok_or_else(|| HeaderError::parse(format!("unterminated target in '{}'", text)))?;
                (&inner[..end], &inner[end + 1..])
            }
            None => match text.find(';') {
                Some(pos) => (&text[..pos], &text[pos..]),
                None => (text, ""),
            },
        };

        let (_, params) = parse_parameters(rest);
        let rel = params
            .get("rel")
            .filter(|rel| !rel.is_empty())
            .ok_or_else(|| HeaderError::parse(format!("missing rel in link '{}'", text)))?;

        let mut link = Link::new(decode_or_raw(target.trim()), decode_or_raw(rel));
        for (name, value) in params.iter() {
            match name {
                "rel" => {}
                "title" => link.title = Some(value.to_string()),
                "title*" => link.title_star = Some(TitleStar::parse(value)?),
                "anchor" => link.anchor = Some(decode_or_raw(value)),
                "hreflang" => link.hreflang.push(value.to_string()),
                "type" => link.type_hint = Some(value.to_string()),
                "crossorigin" => link.crossorigin = Some(value.parse()?),
                _ => link.extensions.push((name.to_string(), value.to_string())),
            }
        }
        Ok(link)
    }

    #[must_use]
    pub fn format(&self) -> String {
        let mut out = format!("<{}>", percent_encode(&self.target, TARGET_SAFE));

        if self.rel.contains("//") {
            out.push_str(&format!("; rel={}", quote_string(&encode_uri(&self.rel))));
        } else if self.rel.contains(char::is_whitespace) {
            out.push_str(&format!("; rel={}", quote_string(&self.rel)));
        } else {
            out.push_str(&format!("; rel={}", self.rel));
        }
        if let Some(title) = &self.title {
            out.push_str(&format!("; title={}", quote_string(title)));
        }
        if let Some(title_star) = &self.title_star {
            out.push_str(&format!("; title*={}", title_star.format()));
        }
        if let Some(anchor) = &self.anchor {
            out.push_str(&format!(
                "; anchor={}",
                quote_string(&percent_encode(anchor, ANCHOR_SAFE))
            ));
        }
        for hreflang in &self.hreflang {
            out.push_str(&format!("; hreflang={}", hreflang));
        }
        if let Some(type_hint) = &self.type_hint {
            out.push_str(&format!("; type={}", quote_string(type_hint)));
        }
        match self.crossorigin {
            Some(CrossOrigin::Anonymous) => out.push_str("; crossorigin"),
            Some(CrossOrigin::UseCredentials) => out.push_str("; crossorigin=\"use-credentials\""),
            None => {}
        }
        for (name, value) in &self.extensions {
            if is_token(value) {
                out.push_str(&format!("; {}={}", name, value));
            } else {
                out.push_str(&format!("; {}={}", name, quote_string(value)));
            }
        }
        out
    }

    /// Space-separated relation types, as RFC 8288 §3.3 allows several.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.rel.split_ascii_whitespace()
    }

    /// Resolve the target against the context URI.
    pub fn resolve_target(&self, base: &Url) -> Result<Url> {
        Ok(base.join(&self.target)?)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Link {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split on commas that sit outside quoted strings and `<...>` targets.
fn split_links(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    let mut in_target = false;
    for (i, c) in header.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' if !in_target => quoted = !quoted,
            '<' if !quoted => in_target = true,
            '>' if !quoted => in_target = false,
            ',' if !quoted && !in_target => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

/// Links of a `Link` header, in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Links(Vec<Link>);

impl Links {
    #[must_use]
    pub fn new(links: Vec<Link>) -> Self {
        Links(links)
    }

    pub fn parse(header: &str) -> Result<Self> {
        Self::parse_with(header, &HeaderConfig::default())
    }

    /// Parse a `Link` value, rejecting it when it exceeds `config.max_header_length`.
    pub fn parse_with(header: &str, config: &HeaderConfig) -> Result<Self> {
        config.check_length(header)?;
        split_links(header)
            .into_iter()
            .filter(|segment| !segment.trim().is_empty())
            .map(Link::parse)
            .collect::<Result<Vec<_>>>()
            .map(Links)
    }

    #[must_use]
    pub fn format(&self) -> String {
        self.0
            .iter()
            .map(Link::format)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn push(&mut self, link: Link) {
        self.0.push(link);
    }

    /// Links carrying `rel` among their relation types (case-insensitive).
    pub fn find_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.0
            .iter()
            .filter(move |link| link.relations().any(|r| r.eq_ignore_ascii_case(rel)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
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

impl From<Vec<Link>> for Links {
    fn from(links: Vec<Link>) -> Self {
        Links(links)
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PartialEq<Vec<Link>> for Links {
    fn eq(&self, other: &Vec<Link>) -> bool {
        &self.0 == other
    }
}

impl fmt::Display for Links {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Links {
    type Err = HeaderError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TypedHeader for Links {
    fn name() -> HeaderName {
        headers::LINK
    }

    fn parse_header(value: &str) -> Result<Self> {
        Self::parse(value)
    }

    fn format_header(&self) -> String {
        self.format()
    }
}

/// Canonical `Link` header text from a value or raw text.
pub fn coerce(input: HeaderInput<'_, Links>) -> Result<String> {
    traits::coerce(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_link() {
        let link = Link::new("http://example.com/TheBook/chapter2", "previous");
        assert_eq!(link.format(), "<http://example.com/TheBook/chapter2>; rel=previous");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);
    }

    #[test]
    fn test_uri_relation_is_quoted() {
        let link = Link::new("/", "http://example.net/foo");
        assert_eq!(link.format(), "</>; rel=\"http://example.net/foo\"");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);
    }

    #[test]
    fn test_anchor() {
        let link = Link::new("/terms", "copyright").with_anchor("#foo");
        assert_eq!(link.format(), "</terms>; rel=copyright; anchor=\"#foo\"");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);
    }

    #[test]
    fn test_target_is_encoded() {
        let link = Link::new("/a file.html", "alternate");
        assert_eq!(link.format(), "</a%20file.html>; rel=alternate");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);
    }

    #[test]
    fn test_missing_rel() {
        assert!(Link::parse("</x>; title=\"no rel\"").unwrap_err().is_parse_error());
        assert!(Link::parse("</x>").is_err());
        assert!(Link::parse("</x; rel=next").is_err());
    }

    #[test]
    fn test_unbracketed_target() {
        let link = Link::parse("/next; rel=next").unwrap();
        assert_eq!(link.target, "/next");
        assert_eq!(link.rel, "next");
    }

    #[test]
    fn test_all_attributes() {
        let link = Link::new("/doc", "alternate")
            .with_title("The \"Doc\"")
            .with_title_star("de", "Das Dokument für alle")
            .with_hreflang("de")
            .with_hreflang("de-AT")
            .with_type_hint("text/html")
            .with_crossorigin(CrossOrigin::UseCredentials)
            .with_extension("media", "screen")
            .with_extension("rev", "made");
        assert_eq!(
            link.format(),
            "</doc>; rel=alternate; title=\"The \\\"Doc\\\"\"; \
             title*=UTF-8'de'Das%20Dokument%20f%C3%BCr%20alle; hreflang=de; hreflang=de-AT; \
             type=\"text/html\"; crossorigin=\"use-credentials\"; media=screen; rev=made"
        );
        assert_eq!(Link::parse(&link.format()).unwrap(), link);
    }

    #[test]
    fn test_crossorigin() {
        let link = Link::new("/s.js", "preload").with_crossorigin(CrossOrigin::Anonymous);
        assert_eq!(link.format(), "</s.js>; rel=preload; crossorigin");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);

        let parsed = Link::parse("</s.js>; rel=preload; crossorigin=Use-Credentials").unwrap();
        assert_eq!(parsed.crossorigin, Some(CrossOrigin::UseCredentials));

        let err = Link::parse("</s.js>; rel=preload; crossorigin=everyone").unwrap_err();
        assert!(err.is_validation_error());
        assert!("ANONYMOUS".parse::<CrossOrigin>().is_ok());
    }

    #[test]
    fn test_title_star_charsets() {
        let t = TitleStar::parse("iso-8859-1'en'%A3%20rates").unwrap();
        assert_eq!(t, TitleStar::new("en", "£ rates"));
        assert!(TitleStar::parse("koi8-r'ru'x").unwrap_err().is_validation_error());
        assert!(TitleStar::parse("no-quotes").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_extensions_keep_order() {
        let link = Link::parse("</x>; z=1; rel=next; a=2; foo=\"bar baz\"").unwrap();
        assert_eq!(
            link.extensions,
            vec![
                ("z".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
                ("foo".to_string(), "bar baz".to_string()),
            ]
        );
    }

    #[test]
    fn test_extension_values_needing_quotes() {
        let link = Link::parse("</x>; rel=next; foo=\"bar baz\"").unwrap();
        assert_eq!(link.format(), "</x>; rel=next; foo=\"bar baz\"");
        assert_eq!(Link::parse(&link.format()).unwrap(), link);

        let link =
            Link::new("/style.css", "stylesheet").with_extension("media", "(min-width: 600px)");
        assert_eq!(
            link.format(),
            "</style.css>; rel=stylesheet; media=\"(min-width: 600px)\""
        );
        let reparsed = Link::parse(&link.format()).unwrap();
        assert_eq!(
            reparsed.extensions,
            vec![("media".to_string(), "(min-width: 600px)".to_string())]
        );
        assert_eq!(reparsed, link);
    }

    #[test]
    fn test_links_length_limit() {
        let config = HeaderConfig {
            max_header_length: 16,
            ..Default::default()
        };
        assert!(Links::parse_with("</a>; rel=next", &config).is_ok());
        let err = Links::parse_with("</a/long/path>; rel=next", &config).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_links() {
        let value = "<http://example.com/TheBook/chapter2>; rel=previous,</terms>; rel=copyright; anchor=\"#foo\"";
        let links = Links::parse(value).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links,
            vec![
                Link::new("http://example.com/TheBook/chapter2", "previous"),
                Link::new("/terms", "copyright").with_anchor("#foo"),
            ]
        );
        assert_eq!(Links::parse(&links.format()).unwrap(), links);
    }

    #[test]
    fn test_links_commas_inside_target_and_quotes() {
        let value = "</a,b>; rel=next; title=\"x, y\", </c>; rel=prev";
        let links = Links::parse(value).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links.iter().next().unwrap().target, "/a,b");
        assert_eq!(links.iter().next().unwrap().title.as_deref(), Some("x, y"));
    }

    #[test]
    fn test_find_rel_and_push() {
        let mut links = Links::default();
        links.push(Link::new("/1", "next"));
        links.push(Link::new("/2", "prev Alternate"));
        assert_eq!(links.find_rel("alternate").count(), 1);
        assert_eq!(links.find_rel("next").next().unwrap().target, "/1");
        assert_eq!(links.format(), "</1>; rel=next,</2>; rel=\"prev Alternate\"");
        assert_eq!(Links::parse(&links.format()).unwrap(), links);
    }

    #[test]
    fn test_resolve_target() {
        let base = Url::parse("https://example.com/books/1").unwrap();
        let link = Link::new("../authors/2", "author");
        assert_eq!(
            link.resolve_target(&base).unwrap().as_str(),
            "https://example.com/authors/2"
        );
    }
}
