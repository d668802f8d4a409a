//! Connection Worker
//!
//! Handles one client connection end to end: read and validate the request,
//! answer from the cache or fetch from the origin, then close.

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::{fetch, ProxyContext};
use crate::cache::CacheEntry;
use crate::error::Result;
use crate::http::{
    build_origin_request, error_page, parse_url, read_headers, read_line, RequestLine,
};

// == Handle Connection ==
/// Runs a single proxied transaction on `stream` and closes it.
///
/// Never fails: client-visible errors become an HTML error page, transport
/// errors are logged.
pub async fn handle_connection<S>(stream: S, ctx: &ProxyContext)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    if let Err(e) = serve(&mut reader, &mut writer, ctx).await {
        match e.client_status() {
            Some(status) => {
                warn!(code = status.code, error = %e, "Rejecting request");
                if let Err(write_err) = writer.write_all(&error_page(&status)).await {
                    debug!(error = %write_err, "Could not deliver error page");
                }
            }
            None => debug!(error = %e, "Transaction ended early"),
        }
    }

    let _ = writer.shutdown().await;
}

/// The request pipeline; any error it returns is handled by the caller.
async fn serve<R, W>(reader: &mut R, writer: &mut W, ctx: &ProxyContext) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(line) = read_line(reader, ctx.io_timeout).await? else {
        debug!("Client closed before sending a request");
        return Ok(());
    };

    let request = RequestLine::from_bytes(&line)?;
    let url = parse_url(&request.url)?;
    let headers = read_headers(reader, ctx.io_timeout).await?;
    let outbound = build_origin_request(&request, &url, &headers);
    debug!(
        host = %url.host,
        port = url.port_or_default(),
        request = %String::from_utf8_lossy(&outbound),
        "Proxy target"
    );

    let cached = ctx.cache.read().await.lookup(&request.url);
    if let Some(entry) = cached {
        info!(url = %request.url, size = entry.size(), "Cache hit");
        writer.write_all(&entry.body).await?;
        writer.flush().await?;
        return Ok(());
    }

    info!(url = %request.url, "Cache miss, fetching from origin");
    let outcome = fetch(
        &url.host,
        url.port_or_default(),
        &outbound,
        writer,
        ctx.max_object_size,
        ctx.io_timeout,
    )
    .await?;

    match outcome.captured {
        Some(body) => {
            let size = body.len();
            let evicted = ctx
                .cache
                .write()
                .await
                .insert(CacheEntry::new(request.url.clone(), body));
            info!(url = %request.url, size, evicted, "Cached response");
        }
        None => debug!(url = %request.url, relayed = outcome.relayed, "Response not cached"),
    }

    Ok(())
}
