//! Wire-level primitives shared by the header value types.

pub mod constants;
pub mod date;
pub mod scanner;

pub use constants::*;
pub use date::{format_http_date, format_naive_http_date, parse_http_date};
pub use scanner::{
    dequote, encode_uri, is_token, parse_parameters, percent_decode, percent_encode,
    quote_string, split_list, Parameters,
};
