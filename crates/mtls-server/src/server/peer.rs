//! Identification of authenticated clients for log output.

use rustls::{pki_types::CertificateDer, ServerConnection};
use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of a DER certificate.
pub fn fingerprint(cert: &CertificateDer<'_>) -> String {
    hex::encode(Sha256::digest(cert.as_ref()))
}

/// Fingerprint of the leaf certificate the client presented, if any.
pub fn client_fingerprint(conn: &ServerConnection) -> Option<String> {
    conn.peer_certificates()?.first().map(fingerprint)
}
