//! Common error types shared across crates.

use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Everything that can stop the server from starting.
///
/// Every variant is fatal: the binary reports it and exits. Handshake
/// failures of individual clients are not represented here, they only drop
/// the offending connection.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A PEM file could not be read from disk.
    #[error("failed to read {what} from {}: {source}", path.display())]
    ReadFile {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// PEM framing was present but could not be decoded.
    #[error("malformed PEM in {what}: {source}")]
    Pem {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// A certificate file decoded cleanly but held no certificates.
    #[error("no certificates found in {what}")]
    NoCertificates { what: &'static str },

    /// The key file held no PKCS#1, PKCS#8 or SEC1 private key.
    #[error("no private key found in server key")]
    NoPrivateKey,

    /// None of the CA certificates could be used as a trust anchor, so every
    /// client would be rejected.
    #[error("CA certificate produced an empty trust store")]
    NoTrustAnchors,

    /// rustls refused the verifier or server configuration.
    #[error("TLS configuration rejected: {0}")]
    Tls(String),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl BootstrapError {
    /// Returns `true` when the fix lies in the certificate material on disk
    /// rather than in the host environment.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, BootstrapError::Bind { .. })
    }
}
