//! Configuration loading and validation for the mTLS server.
//!
//! All values are read from environment variables at startup. With an empty
//! environment the server uses `ca.crt`, `server.crt` and `server.key` from
//! the working directory and listens on port 8443.

use std::time::Duration;

use anyhow::{Context, Result};
use common::protocol::{DEFAULT_PUBLIC_HOST, DEFAULT_TLS_PORT};
use serde::Deserialize;

use crate::telemetry::LogFormat;

/// Validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the PEM-encoded CA certificate(s) client certificates must
    /// chain to.
    #[serde(default = "default_ca_cert_path")]
    pub ca_cert_path: String,

    /// Path to the PEM-encoded server certificate chain.
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: String,

    /// Path to the PEM-encoded server private key.
    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: String,

    /// Port the HTTPS server listens on, on all interfaces.
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,

    /// Hostname announced in the startup banner.
    #[serde(default = "default_public_host")]
    pub public_host: String,

    /// Upper bound on a single TLS handshake, in seconds.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format: `json` (default) or `text`.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_ca_cert_path() -> String {
    "ca.crt".into()
}
fn default_tls_cert_path() -> String {
    "server.crt".into()
}
fn default_tls_key_path() -> String {
    "server.key".into()
}
fn default_tls_port() -> u16 {
    DEFAULT_TLS_PORT
}
fn default_public_host() -> String {
    DEFAULT_PUBLIC_HOST.into()
}
fn default_handshake_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ca_cert_path: default_ca_cert_path(),
            tls_cert_path: default_tls_cert_path(),
            tls_key_path: default_tls_key_path(),
            tls_port: default_tls_port(),
            public_host: default_public_host(),
            handshake_timeout_secs: default_handshake_timeout(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.ca_cert_path, "CA_CERT_PATH")?;
        ensure_non_empty(&self.tls_cert_path, "TLS_CERT_PATH")?;
        ensure_non_empty(&self.tls_key_path, "TLS_KEY_PATH")?;
        ensure_non_empty(&self.public_host, "PUBLIC_HOST")?;

        if self.tls_port == 0 {
            anyhow::bail!("TLS_PORT must be a non-zero port");
        }
        if self.handshake_timeout_secs == 0 {
            anyhow::bail!("HANDSHAKE_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}
