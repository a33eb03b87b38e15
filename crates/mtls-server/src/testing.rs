//! Throwaway PKI and client helpers for tests.

use std::{net::SocketAddr, path::Path, sync::Arc};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use rustls::{
    pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName},
    ClientConfig, RootCertStore, SupportedProtocolVersion,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::TlsConnector;

use crate::config::Config;

/// A self-signed certificate authority.
pub struct TestCa {
    cert: Certificate,
    key: KeyPair,
}

/// A leaf certificate and its key, signed by a [`TestCa`].
pub struct Leaf {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: CertificateDer<'static>,
    key_der: Vec<u8>,
}

impl Leaf {
    pub fn key_der(&self) -> PrivateKeyDer<'static> {
        PrivatePkcs8KeyDer::from(self.key_der.clone()).into()
    }
}

impl TestCa {
    pub fn new(name: &str) -> Self {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    pub fn der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    pub fn issue_server(&self, dns_name: &str) -> Leaf {
        self.issue(dns_name, ExtendedKeyUsagePurpose::ServerAuth)
    }

    pub fn issue_client(&self, name: &str) -> Leaf {
        self.issue(name, ExtendedKeyUsagePurpose::ClientAuth)
    }

    fn issue(&self, name: &str, purpose: ExtendedKeyUsagePurpose) -> Leaf {
        let mut params = CertificateParams::new(vec![name.to_owned()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = vec![purpose];
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        Leaf {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
            cert_der: cert.der().clone(),
            key_der: key.serialize_der(),
        }
    }
}

/// A CA plus a server leaf for `localhost`, written out as a config.
pub struct Fixture {
    pub ca: TestCa,
    pub server: Leaf,
    pub config: Config,
    _dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let ca = TestCa::new("test-ca");
        let server = ca.issue_server("localhost");
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), &ca.pem(), &server);
        Self {
            ca,
            server,
            config,
            _dir: dir,
        }
    }
}

/// Write the CA and server material into `dir` and return a config that
/// points at it.
pub fn write_config(dir: &Path, ca_pem: &str, server: &Leaf) -> Config {
    let ca_path = dir.join("ca.crt");
    let cert_path = dir.join("server.crt");
    let key_path = dir.join("server.key");
    std::fs::write(&ca_path, ca_pem).unwrap();
    std::fs::write(&cert_path, &server.cert_pem).unwrap();
    std::fs::write(&key_path, &server.key_pem).unwrap();
    Config {
        ca_cert_path: ca_path.to_string_lossy().into_owned(),
        tls_cert_path: cert_path.to_string_lossy().into_owned(),
        tls_key_path: key_path.to_string_lossy().into_owned(),
        ..Config::default()
    }
}

/// Client TLS connector trusting `ca`, optionally presenting `identity`.
pub fn connector(
    ca: &TestCa,
    identity: Option<&Leaf>,
    versions: &[&'static SupportedProtocolVersion],
) -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.add(ca.der()).unwrap();
    let builder = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(versions)
    .unwrap()
    .with_root_certificates(roots);
    let config = match identity {
        Some(leaf) => builder
            .with_client_auth_cert(vec![leaf.cert_der.clone()], leaf.key_der())
            .unwrap(),
        None => builder.with_no_client_auth(),
    };
    TlsConnector::from(Arc::new(config))
}

/// Send a `GET` for `path` and return whatever plaintext came back.
///
/// A failed handshake, or an alert sent after the client thinks the
/// handshake is done (TLS 1.3), both surface as `Err`.
pub async fn get(connector: &TlsConnector, addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let tcp = TcpStream::connect(addr).await?;
    let name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(name, tcp).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    tls.write_all(request.as_bytes()).await?;

    let mut buf = Vec::new();
    match tls.read_to_end(&mut buf).await {
        Ok(_) => {}
        // A peer that closes without close_notify after a full response.
        Err(_) if !buf.is_empty() => {}
        Err(e) => return Err(e),
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
