//! URL Module
//!
//! Splits an absolute request URL into hostname, port and path.

use crate::error::{ProxyError, Result};

/// Port used when the URL names none.
pub const DEFAULT_HTTP_PORT: u16 = 80;

// == Parsed Url ==
/// Components of `scheme://host[:port][/path]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub host: String,
    /// Explicit port, if the URL carried one
    pub port: Option<u16>,
    /// Path and query verbatim, `/` when absent
    pub path: String,
}

impl ParsedUrl {
    /// Port to connect to, falling back to 80.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_HTTP_PORT)
    }
}

// == Parse ==
/// Parses an absolute URL.
///
/// The host runs from after the first `//` to the next `:` or `/`. A `:`
/// before the next `/` introduces the port; an empty port counts as absent.
pub fn parse_url(url: &str) -> Result<ParsedUrl> {
    let Some(start) = url.find("//") else {
        return Err(ProxyError::MalformedUrl(url.to_string()));
    };
    let rest = &url[start + 2..];

    let host_end = rest.find([':', '/']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() {
        return Err(ProxyError::MalformedUrl(url.to_string()));
    }

    let after_host = &rest[host_end..];
    let (port, path) = match after_host.strip_prefix(':') {
        Some(port_and_path) => {
            let port_end = port_and_path.find('/').unwrap_or(port_and_path.len());
            let digits = &port_and_path[..port_end];
            let port = if digits.is_empty() {
                None
            } else {
                Some(
                    digits
                        .parse::<u16>()
                        .map_err(|_| ProxyError::MalformedUrl(url.to_string()))?,
                )
            };
            (port, &port_and_path[port_end..])
        }
        None => (None, after_host),
    };

    Ok(ParsedUrl {
        host: host.to_string(),
        port,
        path: if path.is_empty() { "/" } else { path }.to_string(),
    })
}
