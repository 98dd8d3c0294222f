//! Error types for typed header values.

use thiserror::Error;

/// Result type for header value operations.
pub type Result<T> = std::result::Result<T, HeaderError>;

/// Errors that can occur while parsing or formatting header values.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("Header parse error: {0}")]
    HeaderParse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Header value is not visible ASCII: {0}")]
    NonAsciiHeader(#[from] http::header::ToStrError),

    #[error("Invalid HTTP date: {0}")]
    InvalidDate(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}

impl HeaderError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::debug!("[Headers] {}", msg);
        HeaderError::HeaderParse(msg)
    }

    /// Check if this error comes from malformed wire syntax.
    #[inline]
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            HeaderError::HeaderParse(_)
                | HeaderError::NonAsciiHeader(_)
                | HeaderError::InvalidDate(_)
        )
    }

    /// Check if this error comes from a well-formed but semantically invalid value.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, HeaderError::Validation(_))
    }
}
