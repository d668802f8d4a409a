//! Shared helpers for proxy integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use caching_proxy::cache::{self, CacheStore};
use caching_proxy::{ProxyContext, ProxyServer};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Origin server that answers every request with the same bytes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Vec<u8>>>,
}

impl MockOrigin {
    /// Number of requests the origin has received.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request head (request line and headers) of the latest request.
    pub fn last_request(&self) -> String {
        String::from_utf8_lossy(&self.last_request_bytes()).into_owned()
    }

    /// Raw bytes of the latest request head.
    pub fn last_request_bytes(&self) -> Vec<u8> {
        self.last_request.lock().unwrap().clone()
    }
}

/// Starts an origin on an ephemeral port replying with `response` and closing.
pub async fn start_mock_origin(response: Vec<u8>) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let last_request = Arc::new(Mutex::new(Vec::new()));
    let response = Arc::new(response);

    let (task_hits, task_last) = (hits.clone(), last_request.clone());
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let (hits, last, response) = (task_hits.clone(), task_last.clone(), response.clone());
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                let mut head = Vec::new();
                loop {
                    let mut line = Vec::new();
                    match reader.read_until(b'\n', &mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == b"\r\n" => break,
                        Ok(_) => head.extend_from_slice(&line),
                    }
                }
                hits.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = head;

                let mut socket = reader.into_inner();
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockOrigin {
        addr,
        hits,
        last_request,
    }
}

/// Starts a proxy on an ephemeral port and returns its address and context.
pub async fn start_proxy(capacity: usize, max_object_size: usize) -> (SocketAddr, ProxyContext) {
    let ctx = ProxyContext::new(cache::shared(CacheStore::new(capacity)), max_object_size, None);
    let server = ProxyServer::bind("127.0.0.1:0".parse().unwrap(), ctx.clone())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, ctx)
}

/// Sends raw request bytes to the proxy and reads until it closes.
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Sends `GET <url> HTTP/1.1` with a Host header through the proxy.
pub async fn proxy_get(proxy: SocketAddr, url: &str) -> Vec<u8> {
    let request = format!("GET {url} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: keep-alive\r\n\r\n");
    send_raw(proxy, request.as_bytes()).await
}

/// An HTTP/1.0 response with a body of `len` bytes.
pub fn response_with_body(len: usize) -> Vec<u8> {
    let mut response =
        format!("HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {len}\r\n\r\n")
            .into_bytes();
    response.extend(std::iter::repeat(b'a').take(len));
    response
}
