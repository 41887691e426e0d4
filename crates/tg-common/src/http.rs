use std::fs;
use std::time::Duration;

use base64::Engine as _;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::Certificate;

use crate::config::TrustConfig;
use crate::error::{AppError, AppResult};

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the pooled client shared by the host directory and attestation calls.
///
/// Timeouts are applied per request by the callers; the client only bounds
/// connection setup.
pub fn build_client(config: &TrustConfig) -> AppResult<Client> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.request_timeout.min(MAX_CONNECT_TIMEOUT))
        .pool_max_idle_per_host(4)
        .https_only(config.https_only);

    match &config.ca_file {
        Some(path) => {
            let pem = fs::read(path).map_err(|e| {
                AppError::Config(format!("cannot read CA file {}: {e}", path.display()))
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                AppError::Config(format!("invalid CA file {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        None => {
            tracing::warn!(
                server = %config.server,
                "no attestation CA file configured; server certificates are NOT verified (unsafe for production)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))
}

/// `Basic` authorization header value for a raw `user:password` blob.
pub fn basic_auth(blob: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(blob)
    )
}
