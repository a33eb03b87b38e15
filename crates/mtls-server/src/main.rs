//! `mtls-server` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Read the CA, server certificate and key; build the rustls config.
//! 4. Bind the listener and serve until killed.
//!
//! Any failure in steps 1–4 ends the process with a non-zero exit status.

mod config;
mod server;
mod telemetry;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use common::protocol::public_url;
use tracing::{error, info};

use config::Config;
use server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level, cfg.log_format)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        ca_cert_path = %cfg.ca_cert_path,
        tls_port = cfg.tls_port,
        "mtls-server starting"
    );

    // -----------------------------------------------------------------------
    // 3–4. TLS material and listener
    // -----------------------------------------------------------------------
    let server = match Server::bind(&cfg).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, configuration = e.is_configuration(), "startup failed");
            return Err(e).context("mtls-server could not start");
        }
    };

    info!(
        "Starting mTLS server on {}",
        public_url(&cfg.public_host, cfg.tls_port)
    );
    server.run().await
}
