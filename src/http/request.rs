//! Request Module
//!
//! Reads and validates the browser's request, and rewrites it for the origin.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{ProxyError, Result};
use crate::http::url::ParsedUrl;
use crate::proxy::with_deadline;

/// Longest request or header line accepted, including the line ending.
pub const MAX_LINE: usize = 8192;

/// User-Agent sent to every origin.
pub const USER_AGENT_HDR: &str =
    "User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3\r\n";
/// Accept sent to every origin.
pub const ACCEPT_HDR: &str =
    "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n";
/// Accept-Encoding sent to every origin.
pub const ACCEPT_ENCODING_HDR: &str = "Accept-Encoding: gzip, deflate\r\n";

/// Client headers the proxy replaces with its own.
const OVERRIDDEN_HEADERS: [&str; 5] = [
    "User-Agent",
    "Accept",
    "Accept-Encoding",
    "Connection",
    "Proxy-Connection",
];

// == Request Line ==
/// A validated `GET <absolute-url> HTTP/1.x` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub url: String,
    pub version: String,
}

impl RequestLine {
    /// Validates a raw request line as read from the client.
    ///
    /// The URL becomes the cache key as received, so a line that is not
    /// valid UTF-8 is rejected instead of being decoded lossily.
    pub fn from_bytes(line: &[u8]) -> Result<Self> {
        let line = std::str::from_utf8(line).map_err(|_| {
            ProxyError::MalformedRequest("request line is not valid UTF-8".to_string())
        })?;
        Self::parse(line)
    }

    /// Tokenizes and validates a request line.
    ///
    /// Shape errors are checked before the method, so `POST garbage` is
    /// malformed rather than unimplemented.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let tokens: Vec<&str> = trimmed.split_ascii_whitespace().collect();

        let [method, url, version] = tokens[..] else {
            return Err(ProxyError::MalformedRequest(trimmed.to_string()));
        };
        if !url.contains("http://") || !version.contains("HTTP/1.") {
            return Err(ProxyError::MalformedRequest(trimmed.to_string()));
        }
        if !method.eq_ignore_ascii_case("GET") {
            return Err(ProxyError::NotImplemented(method.to_string()));
        }

        Ok(Self {
            method: method.to_string(),
            url: url.to_string(),
            version: version.to_string(),
        })
    }
}

// == Version Downgrade ==
/// Forces a trailing minor version `1` to `0`; any other version is unchanged.
pub fn downgrade_version(version: &str) -> String {
    match version.strip_suffix('1') {
        Some(prefix) => format!("{prefix}0"),
        None => version.to_string(),
    }
}

// == Client Headers ==
/// Browser headers kept for the origin request, as raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHeaders {
    /// The client's Host line, verbatim
    pub host: Option<Vec<u8>>,
    /// Every other non-overridden line, in arrival order
    pub forwarded: Vec<Vec<u8>>,
}

impl ClientHeaders {
    /// Sorts one header line (without its line ending) into place.
    pub fn push(&mut self, line: &[u8]) {
        let name = line
            .iter()
            .position(|&b| b == b':')
            .map(|colon| line[..colon].trim_ascii());

        match name {
            Some(name)
                if OVERRIDDEN_HEADERS
                    .iter()
                    .any(|h| h.as_bytes().eq_ignore_ascii_case(name)) => {}
            Some(name) if name.eq_ignore_ascii_case(b"Host") => {
                self.host = Some(line.to_vec());
            }
            _ => self.forwarded.push(line.to_vec()),
        }
    }
}

// == Origin Request ==
/// Builds the HTTP/1.0 request sent to the origin.
///
/// Client header lines are copied byte for byte.
pub fn build_origin_request(
    request: &RequestLine,
    url: &ParsedUrl,
    headers: &ClientHeaders,
) -> Vec<u8> {
    let mut out = format!(
        "{} {} {}\r\n",
        request.method,
        url.path,
        downgrade_version(&request.version)
    )
    .into_bytes();

    match &headers.host {
        Some(host) => {
            out.extend_from_slice(host);
            out.extend_from_slice(b"\r\n");
        }
        None => out.extend_from_slice(format!("Host: {}\r\n", url.host).as_bytes()),
    }

    out.extend_from_slice(USER_AGENT_HDR.as_bytes());
    out.extend_from_slice(ACCEPT_HDR.as_bytes());
    out.extend_from_slice(ACCEPT_ENCODING_HDR.as_bytes());
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(b"Proxy-Connection: close\r\n");
    for line in &headers.forwarded {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out
}

// == Line Reading ==
/// Reads one line as raw bytes, without its line ending.
///
/// Returns None at end of stream. Lines that reach [`MAX_LINE`] without a
/// newline are rejected as malformed.
pub async fn read_line<R>(reader: &mut R, deadline: Option<Duration>) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = with_deadline(
        deadline,
        (&mut *reader).take(MAX_LINE as u64).read_until(b'\n', &mut buf),
    )
    .await?;

    if n == 0 {
        return Ok(None);
    }
    if n == MAX_LINE && buf.last() != Some(&b'\n') {
        return Err(ProxyError::MalformedRequest(format!(
            "line exceeds {MAX_LINE} bytes"
        )));
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(buf))
}

/// Reads header lines up to the blank line (or end of stream).
pub async fn read_headers<R>(reader: &mut R, deadline: Option<Duration>) -> Result<ClientHeaders>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = ClientHeaders::default();
    while let Some(line) = read_line(reader, deadline).await? {
        if line.is_empty() {
            break;
        }
        headers.push(&line);
    }
    Ok(headers)
}
