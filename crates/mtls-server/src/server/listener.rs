//! TCP accept loop with per-connection TLS handshake.
//!
//! For each accepted TCP connection the listener:
//! 1. Spawns a Tokio task.
//! 2. Runs the rustls handshake, bounded by the handshake timeout. Clients
//!    without a certificate from the trusted CA fail here and are dropped
//!    without any HTTP response.
//! 3. Serves HTTP on the encrypted stream with the shared axum router.

use std::{future::Future, io, net::SocketAddr, time::Duration};

use anyhow::Result;
use axum::Router;
use hyper::{body::Incoming, Request};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tracing::{debug, error};

use super::peer;

/// Pause after a failed `accept`. Errors such as `EMFILE` persist until some
/// connection closes, so retrying immediately only spins.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop. Runs until the process is killed.
pub async fn serve(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    handshake_timeout: Duration,
) -> Result<()> {
    let listener = &listener;
    loop {
        let (tcp, peer_addr) =
            accept_with_backoff(move || listener.accept(), ACCEPT_ERROR_BACKOFF).await;
        debug!(%peer_addr, "accepted TCP connection");

        let acceptor = acceptor.clone();
        let router = router.clone();
        tokio::spawn(async move {
            handle_connection(tcp, peer_addr, acceptor, router, handshake_timeout).await;
        });
    }
}

/// Call `accept` until it succeeds, sleeping `backoff` after each failure.
async fn accept_with_backoff<T, F, Fut>(mut accept: F, backoff: Duration) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                error!(error = %e, backoff_ms = backoff.as_millis() as u64, "accept error");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Handshake, then serve HTTP until the client goes away.
async fn handle_connection(
    tcp: TcpStream,
    peer_addr: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    handshake_timeout: Duration,
) {
    let tls = match tokio::time::timeout(handshake_timeout, acceptor.accept(tcp)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!(%peer_addr, error = %e, "TLS handshake failed");
            return;
        }
        Err(_) => {
            debug!(%peer_addr, "TLS handshake timed out");
            return;
        }
    };

    let (_, conn) = tls.get_ref();
    debug!(
        %peer_addr,
        client_fingerprint = peer::client_fingerprint(conn).as_deref().unwrap_or("-"),
        protocol = ?conn.protocol_version(),
        "mTLS session established"
    );

    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
        router.clone().call(req)
    });

    if let Err(e) = auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(tls), service)
        .await
    {
        debug!(%peer_addr, error = %e, "connection closed with error");
    }
}
