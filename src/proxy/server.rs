//! Proxy Server
//!
//! Accepts client connections and hands each one to a detached worker task.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{handle_connection, ProxyContext};

/// Pause after an accept failure that is likely to repeat immediately.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// How long to wait before accepting again after `err`.
///
/// A peer dropping its connection in the backlog is retried at once. Anything
/// else, such as running out of file descriptors, backs off.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}

// == Proxy Server ==
/// Listening proxy with its shared context.
#[derive(Debug)]
pub struct ProxyServer {
    listener: TcpListener,
    ctx: ProxyContext,
}

impl ProxyServer {
    /// Binds the listen socket.
    pub async fn bind(addr: SocketAddr, ctx: ProxyContext) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("unable to listen on {addr}"))?;
        Ok(Self { listener, ctx })
    }

    /// Returns the address actually bound, useful with port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    ///
    /// Each connection runs in its own task and is never joined. A failed
    /// accept is logged and the loop carries on, pausing first when the
    /// failure is not tied to a single peer.
    pub async fn run(self) {
        info!(addr = ?self.listener.local_addr().ok(), "Proxy accepting connections");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    let backoff = accept_backoff(&e);
                    warn!(error = %e, ?backoff, "Failed to accept connection");
                    if let Some(pause) = backoff {
                        tokio::time::sleep(pause).await;
                    }
                    continue;
                }
            };
            debug!(%peer, "Connection accepted");

            let ctx = self.ctx.clone();
            tokio::spawn(
                async move {
                    handle_connection(stream, &ctx).await;
                    debug!("Connection closed");
                }
                .instrument(info_span!("conn", %peer)),
            );
        }
    }
}
