//! Fixed values visible on the wire.
//!
//! The server has exactly one response, so the protocol surface is a handful
//! of constants shared by the server and its tests.

/// Body returned for every request on an authenticated connection.
pub const GREETING: &str = "Hello, mTLS world!\n";

/// `content-type` sent with [`GREETING`].
pub const GREETING_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Port the server listens on when none is configured.
pub const DEFAULT_TLS_PORT: u16 = 8443;

/// Hostname printed in the startup banner when none is configured.
pub const DEFAULT_PUBLIC_HOST: &str = "backup.local";

/// Base URL clients should use to reach the server.
pub fn public_url(host: &str, port: u16) -> String {
    format!("https://{host}:{port}")
}
