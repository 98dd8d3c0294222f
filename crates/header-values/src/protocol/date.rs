//! HTTP-date formatting and parsing ([RFC 9110 §5.6.7]).
//!
//! Output is always the IMF-fixdate form in GMT. Input additionally accepts
//! the obsolete RFC 850 and asctime forms.
//!
//! [RFC 9110 §5.6.7]: https://www.rfc-editor.org/rfc/rfc9110#section-5.6.7

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{HeaderError, Result};

/// `Sun, 06 Nov 1994 08:49:37 GMT`
pub const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// `Sunday, 06-Nov-94 08:49:37 GMT`
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// `Sun Nov  6 08:49:37 1994`
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an HTTP-date, converting it to UTC first.
#[must_use]
pub fn format_http_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format(IMF_FIXDATE).to_string()
}

/// Format a naive timestamp as an HTTP-date. Naive values are taken as UTC.
#[must_use]
pub fn format_naive_http_date(dt: &NaiveDateTime) -> String {
    dt.and_utc().format(IMF_FIXDATE).to_string()
}

/// Parse an HTTP-date into a UTC timestamp.
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    tracing::debug!("[Headers] Unparseable HTTP date: '{}'", value);
    Err(HeaderError::InvalidDate(value.to_string()))
}
