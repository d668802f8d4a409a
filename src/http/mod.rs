//! HTTP Module
//!
//! Browser-facing request handling: URL parsing, request validation and
//! rewriting, and synthesized error responses.

pub mod request;
pub mod response;
pub mod url;

pub use request::{
    build_origin_request, downgrade_version, read_headers, read_line, ClientHeaders, RequestLine,
};
pub use response::error_page;
pub use url::{parse_url, ParsedUrl, DEFAULT_HTTP_PORT};
