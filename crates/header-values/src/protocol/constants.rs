//! Header names, units and status codes used with the typed header values.
//!
//! | Code | Constant | Used when |
//! |------|----------|-----------|
//! | 206 | `status::PARTIAL_CONTENT` | a `Range` resolved to satisfiable ranges |
//! | 304 | `status::NOT_MODIFIED` | `If-None-Match` matched on a safe method |
//! | 412 | `status::PRECONDITION_FAILED` | `If-Match` failed, or `If-None-Match` matched otherwise |
//! | 416 | `status::RANGE_NOT_SATISFIABLE` | no range in the set is satisfiable |

/// Header names handled by this crate.
pub mod headers {
    pub use http::header::{
        ACCEPT_LANGUAGE, CONTENT_RANGE, ETAG, IF_MATCH, IF_NONE_MATCH, IF_RANGE, LINK, RANGE,
    };
}

/// Status codes the response layer pairs with these headers.
pub mod status {
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const NOT_MODIFIED: u16 = 304;
    pub const PRECONDITION_FAILED: u16 = 412;
    pub const RANGE_NOT_SATISFIABLE: u16 = 416;
}

/// The only range unit registered by RFC 9110.
pub const RANGE_UNIT_BYTES: &str = "bytes";

/// Literal meaning "any current representation" in `If-Match`/`If-None-Match`.
pub const ANY_ETAG: &str = "*";

/// Locale wildcard in `Accept-Language`.
pub const ANY_LANGUAGE: &str = "*";
