//! Axum HTTPS server with mandatory client certificates.
//!
//! # Responsibilities
//! - Load the CA, server certificate and key, and build the rustls config.
//! - Bind the TCP listener once the TLS material is known to be good.
//! - Run the accept loop, serving the router on every verified connection.

pub mod handlers;
pub mod listener;
pub mod peer;
pub mod router;
pub mod tls;

use std::{io, net::SocketAddr, time::Duration};

use anyhow::Result;
use axum::Router;
use common::BootstrapError;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::config::Config;

/// A bound, ready-to-run server. Everything it holds is immutable.
pub struct Server {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    handshake_timeout: Duration,
}

impl Server {
    /// Load TLS material and bind `0.0.0.0:<tls_port>`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BootstrapError`] hit. TLS material is checked
    /// before the socket is bound, so a bad CA never opens a port.
    pub async fn bind(cfg: &Config) -> Result<Self, BootstrapError> {
        let addr: SocketAddr = ([0, 0, 0, 0], cfg.tls_port).into();
        Self::bind_to(cfg, addr).await
    }

    /// Like [`Server::bind`], but on an explicit address.
    pub async fn bind_to(cfg: &Config, addr: SocketAddr) -> Result<Self, BootstrapError> {
        let material = tls::TlsMaterial::load(cfg)?;
        let tls_config = tls::build_server_config(&material)?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BootstrapError::Bind { addr, source })?;

        Ok(Self {
            listener,
            acceptor: TlsAcceptor::from(tls_config),
            router: router::build(),
            handshake_timeout: cfg.handshake_timeout(),
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve connections until the process is killed.
    pub async fn run(self) -> Result<()> {
        listener::serve(
            self.listener,
            self.acceptor,
            self.router,
            self.handshake_timeout,
        )
        .await
    }
}
