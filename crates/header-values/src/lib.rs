//! Typed values for conditional-request, partial-content, language
//! negotiation and link headers.
//!
//! Every value type parses from and formats to its exact wire format:
//!
//! ```
//! use header_values::{Languages, Ranges, RangeSpec};
//!
//! let ranges = Ranges::parse("bytes=0-4,5-75,-1").unwrap();
//! assert_eq!(
//!     ranges.resolve(150, true).values,
//!     vec![RangeSpec::Bounded(0, 75), RangeSpec::Bounded(149, 149)]
//! );
//!
//! let accepted = Languages::parse("de;q=0.3, fr-FR;q=0.8").unwrap();
//! assert_eq!(accepted.negotiate(&["ru", "de-DE"]), Some(&"de-DE"));
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod types;

pub use config::HeaderConfig;
pub use error::{HeaderError, Result};
pub use traits::{coerce, HeaderInput, TypedHeader};
pub use types::{
    CrossOrigin, ETag, ETags, EntityTagCondition, IfMatch, IfNoneMatch, Language, Languages, Link,
    Links, RangeSpec, Ranges, Specificity, TitleStar,
};
