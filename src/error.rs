//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Proxy Error Enum ==
/// Errors local to one proxied transaction.
///
/// None of these ever reach the accept loop; the connection worker turns the
/// client-visible ones into an HTML error page.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request line is not `METHOD http://... HTTP/1.x`
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Method other than GET
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// URL without `//` or with a non-numeric port
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// Origin hostname did not resolve
    #[error("Origin not found: {0}")]
    OriginNotFound(String),

    /// Origin resolved but no connection could be made
    #[error("Origin unreachable: {host}:{port}: {source}")]
    OriginUnreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A configured I/O deadline expired
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Transport failure on either socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Client Status ==
/// Status line and explanation sent to the client for an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorStatus {
    pub code: u16,
    pub reason: &'static str,
    pub detail: &'static str,
    pub cause: String,
}

impl ProxyError {
    /// Maps the error to the page the client receives.
    ///
    /// Returns None for transport errors, which are never reported to the
    /// client because a partial response may already be on the wire.
    pub fn client_status(&self) -> Option<ErrorStatus> {
        let (code, reason, detail, cause) = match self {
            ProxyError::MalformedRequest(line) => {
                (400, "Bad Request", "Malformed HTTP request", line.clone())
            }
            ProxyError::MalformedUrl(url) => (400, "Bad Request", "Malformed URL", url.clone()),
            ProxyError::NotImplemented(method) => (
                501,
                "Not Implemented",
                "Proxy does not implement this method",
                method.clone(),
            ),
            ProxyError::OriginNotFound(host) => {
                (502, "Bad Gateway", "Server not found", host.clone())
            }
            ProxyError::OriginUnreachable { host, .. } => (
                502,
                "Bad Gateway",
                "Cannot connect to server at this port",
                host.clone(),
            ),
            ProxyError::Timeout(what) => {
                (504, "Gateway Timeout", "No response in time", what.clone())
            }
            ProxyError::Io(_) => return None,
        };

        Some(ErrorStatus {
            code,
            reason,
            detail,
            cause,
        })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
