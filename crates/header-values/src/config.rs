//! Parsing configuration for typed header values.

use serde::{Deserialize, Serialize};

/// Limits and defaults applied when parsing header values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Keep `Accept-Language` entries carrying `q=0`.
    pub keep_zero_quality: bool,
    /// Coalesce overlapping ranges when resolving a `Range` header.
    pub merge_ranges: bool,
    /// Maximum number of range-specs accepted in one `Range` header.
    pub max_ranges: usize,
    /// Maximum length in bytes of a header value handed to a parser.
    pub max_header_length: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            keep_zero_quality: false,
            merge_ranges: true,
            max_ranges: 100,
            max_header_length: 8192,
        }
    }
}

impl HeaderConfig {
    pub(crate) fn check_length(&self, value: &str) -> crate::Result<()> {
        if value.len() > self.max_header_length {
            return Err(crate::HeaderError::parse(format!(
                "header value of {} bytes exceeds limit of {}",
                value.len(),
                self.max_header_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HeaderConfig::default();
        assert!(!config.keep_zero_quality);
        assert!(config.merge_ranges);
        assert_eq!(config.max_ranges, 100);
        assert_eq!(config.max_header_length, 8192);
    }

    #[test]
    fn test_partial_override() {
        let config = HeaderConfig {
            max_ranges: 2,
            ..Default::default()
        };
        assert_eq!(config.max_ranges, 2);
        assert!(config.merge_ranges);
    }

    #[test]
    fn test_length_check() {
        let config = HeaderConfig {
            max_header_length: 4,
            ..Default::default()
        };
        assert!(config.check_length("abcd").is_ok());
        assert!(config.check_length("abcde").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HeaderConfig = serde_json::from_str(r#"{"keep_zero_quality": true}"#).unwrap();
        assert!(config.keep_zero_quality);
        assert_eq!(config.max_ranges, 100);
    }
}
