use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Result;

/// A header value with a typed representation and an exact wire format.
pub trait TypedHeader: Sized {
    /// Header name this value is carried under.
    fn name() -> HeaderName;

    /// Parse the wire-format value.
    fn parse_header(value: &str) -> Result<Self>;

    /// Serialize back to the wire format.
    fn format_header(&self) -> String;

    fn to_header_value(&self) -> Result<HeaderValue> {
        Ok(HeaderValue::from_str(&self.format_header())?)
    }

    /// Read the header from a map, joining repeated field lines with `", "`.
    ///
    /// Returns `Ok(None)` when the header is absent.
    fn from_header_map(headers: &HeaderMap) -> Result<Option<Self>> {
        let mut values = Vec::new();
        for value in headers.get_all(Self::name()) {
            values.push(value.to_str()?);
        }
        if values.is_empty() {
            return Ok(None);
        }
        Self::parse_header(&values.join(", ")).map(Some)
    }

    /// Replace any existing value for this header in `headers`.
    fn insert_into(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(Self::name(), self.to_header_value()?);
        Ok(())
    }
}

/// Either an already-built value or raw header text.
#[derive(Clone, Copy, Debug)]
pub enum HeaderInput<'a, T> {
    Typed(&'a T),
    Raw(&'a str),
}

/// Normalize a typed value or raw text to the canonical wire format.
///
/// Raw text is parsed first, so `coerce` is idempotent on its own output.
pub fn coerce<T: TypedHeader>(input: HeaderInput<'_, T>) -> Result<String> {
    match input {
        HeaderInput::Typed(value) => Ok(value.format_header()),
        HeaderInput::Raw(text) => Ok(T::parse_header(text)?.format_header()),
    }
}
