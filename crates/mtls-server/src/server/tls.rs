//! Trust store and `rustls::ServerConfig` construction.
//!
//! The CA certificate is read first so that a missing trust anchor stops the
//! process before any other file is touched or any socket is opened. The
//! resulting configuration:
//! - offers TLS 1.2 and TLS 1.3 only,
//! - requires a client certificate chaining to the loaded CA,
//! - advertises no ALPN protocols and does no SNI-based selection.

use std::{fs, io::BufReader, path::Path, sync::Arc};

use common::BootstrapError;
use rustls::{
    crypto::CryptoProvider,
    pki_types::{CertificateDer, PrivateKeyDer},
    server::WebPkiClientVerifier,
    RootCertStore, ServerConfig,
};
use tracing::{info, warn};

use crate::config::Config;

/// Raw PEM bytes for everything the TLS layer needs, read once at startup.
pub struct TlsMaterial {
    pub ca_pem: Vec<u8>,
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl TlsMaterial {
    /// Read the CA certificate, server certificate and server key named in
    /// `cfg`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::ReadFile`] for the first file that cannot be
    /// read.
    pub fn load(cfg: &Config) -> Result<Self, BootstrapError> {
        let ca_pem = read_pem("CA certificate", &cfg.ca_cert_path)?;
        let cert_pem = read_pem("server certificate", &cfg.tls_cert_path)?;
        let key_pem = read_pem("server key", &cfg.tls_key_path)?;
        Ok(Self {
            ca_pem,
            cert_pem,
            key_pem,
        })
    }
}

fn read_pem(what: &'static str, path: impl AsRef<Path>) -> Result<Vec<u8>, BootstrapError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| BootstrapError::ReadFile {
        what,
        path: path.to_path_buf(),
        source,
    })
}

/// The crypto provider every handshake runs on.
fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Parse every certificate in `pem`.
fn parse_certs(what: &'static str, pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, BootstrapError> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| BootstrapError::Pem { what, source })?;
    if certs.is_empty() {
        return Err(BootstrapError::NoCertificates { what });
    }
    Ok(certs)
}

fn parse_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, BootstrapError> {
    rustls_pemfile::private_key(&mut BufReader::new(pem))
        .map_err(|source| BootstrapError::Pem {
            what: "server key",
            source,
        })?
        .ok_or(BootstrapError::NoPrivateKey)
}

/// Build the client trust store from the CA PEM.
///
/// Certificates that fail to parse are skipped. A store that ends up empty
/// is an error, since it would reject every client.
///
/// # Errors
///
/// Returns [`BootstrapError::NoTrustAnchors`] if no usable CA certificate was
/// found, or [`BootstrapError::Pem`] if the PEM framing is corrupt.
pub fn load_client_roots(ca_pem: &[u8]) -> Result<RootCertStore, BootstrapError> {
    let certs = match parse_certs("CA certificate", ca_pem) {
        Ok(certs) => certs,
        Err(BootstrapError::NoCertificates { .. }) => return Err(BootstrapError::NoTrustAnchors),
        Err(e) => return Err(e),
    };

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if ignored > 0 {
        warn!(ignored, "skipped unparsable CA certificates");
    }
    if added == 0 {
        return Err(BootstrapError::NoTrustAnchors);
    }
    info!(trust_anchors = added, "client trust store loaded");
    Ok(roots)
}

/// Build the shared [`ServerConfig`] from PEM material.
///
/// # Errors
///
/// Returns an error if any PEM input is unusable or rustls rejects the
/// resulting configuration (e.g. key does not match certificate).
pub fn build_server_config(material: &TlsMaterial) -> Result<Arc<ServerConfig>, BootstrapError> {
    let roots = load_client_roots(&material.ca_pem)?;
    let provider = crypto_provider();

    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| BootstrapError::Tls(e.to_string()))?;

    let certs = parse_certs("server certificate", &material.cert_pem)?;
    let key = parse_key(&material.key_pem)?;

    let config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
        .map_err(|e| BootstrapError::Tls(e.to_string()))?
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| BootstrapError::Tls(e.to_string()))?;

    Ok(Arc::new(config))
}
