pub mod etag;
pub mod language;
pub mod link;
pub mod range;

pub use etag::{ETag, ETags, EntityTagCondition, IfMatch, IfNoneMatch};
pub use language::{Language, Languages, Specificity};
pub use link::{CrossOrigin, Link, Links, TitleStar};
pub use range::{RangeSpec, Ranges};
