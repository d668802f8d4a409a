//! Origin Fetcher
//!
//! Connects to the origin, sends the rewritten request and relays the
//! response to the client chunk by chunk, capturing it for the cache while it
//! stays under the per-object limit.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};

use super::{with_deadline, RELAY_CHUNK};
use crate::error::{ProxyError, Result};

// == Fetch Outcome ==
/// Result of relaying one origin response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Bytes written to the client
    pub relayed: usize,
    /// The complete response, if it finished cleanly within the size limit.
    ///
    /// An origin that closes without sending anything yields None, so empty
    /// responses are never cached.
    pub captured: Option<Vec<u8>>,
}

// == Connect ==
/// Opens a connection to `host:port`.
///
/// Resolution failure is `OriginNotFound`; failure to connect to every
/// resolved address is `OriginUnreachable`.
pub async fn connect_origin(host: &str, port: u16, deadline: Option<Duration>) -> Result<TcpStream> {
    let addrs: Vec<_> = match with_deadline(deadline, lookup_host((host, port))).await {
        Ok(addrs) => addrs.collect(),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => {
            return Err(ProxyError::Timeout(format!("resolving {host}")));
        }
        Err(e) => {
            debug!(host, error = %e, "Origin resolution failed");
            return Err(ProxyError::OriginNotFound(host.to_string()));
        }
    };
    if addrs.is_empty() {
        return Err(ProxyError::OriginNotFound(host.to_string()));
    }

    let mut last_error = None;
    for addr in addrs {
        match with_deadline(deadline, TcpStream::connect(addr)).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "Origin connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    let source = last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected));
    if source.kind() == io::ErrorKind::TimedOut {
        return Err(ProxyError::Timeout(format!("connecting to {host}:{port}")));
    }
    Err(ProxyError::OriginUnreachable {
        host: host.to_string(),
        port,
        source,
    })
}

// == Relay ==
/// Streams `origin` to `client` until the origin closes.
///
/// Every chunk is written to the client as soon as it is read. Capture is
/// abandoned once the running size would exceed `max_object_size`, but the
/// relay continues. A transport failure after the first byte reached the
/// client ends the relay quietly with nothing captured; before that, it is
/// returned as an error.
pub async fn relay_response<O, C>(
    origin: &mut O,
    client: &mut C,
    max_object_size: usize,
    deadline: Option<Duration>,
) -> Result<FetchOutcome>
where
    O: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_CHUNK];
    let mut relayed = 0;
    let mut capture = Some(Vec::new());

    loop {
        let n = match with_deadline(deadline, origin.read(&mut buf)).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if relayed == 0 && e.kind() == io::ErrorKind::TimedOut => {
                return Err(ProxyError::Timeout("waiting for origin response".to_string()));
            }
            Err(e) if relayed == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, relayed, "Origin read failed mid-transfer");
                return Ok(FetchOutcome {
                    relayed,
                    captured: None,
                });
            }
        };
        let chunk = &buf[..n];

        if let Err(e) = client.write_all(chunk).await {
            warn!(error = %e, relayed, "Client write failed mid-transfer");
            return Ok(FetchOutcome {
                relayed,
                captured: None,
            });
        }
        relayed += n;

        let overflow = capture
            .as_ref()
            .is_some_and(|bytes| bytes.len() + n > max_object_size);
        if overflow {
            debug!(relayed, max_object_size, "Response too large to cache");
            capture = None;
        } else if let Some(bytes) = capture.as_mut() {
            bytes.extend_from_slice(chunk);
        }
    }

    if let Err(e) = client.flush().await {
        warn!(error = %e, "Client flush failed");
        capture = None;
    }

    Ok(FetchOutcome {
        relayed,
        captured: capture.filter(|bytes| !bytes.is_empty()),
    })
}

// == Fetch ==
/// Sends `request` to `host:port` and relays the response to `client`.
///
/// The origin connection is closed when this returns.
pub async fn fetch<C>(
    host: &str,
    port: u16,
    request: &[u8],
    client: &mut C,
    max_object_size: usize,
    deadline: Option<Duration>,
) -> Result<FetchOutcome>
where
    C: AsyncWrite + Unpin,
{
    let mut origin = connect_origin(host, port, deadline).await?;
    debug!(host, port, "Connected to origin");

    origin.write_all(request).await?;
    relay_response(&mut origin, client, max_object_size, deadline).await
}
