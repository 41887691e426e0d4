//! Attestation assertion retrieval.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tg_common::config::TrustConfig;
use tg_common::error::FetchError;
use tg_common::http::basic_auth;
use tg_common::types::HostIdentity;
use tracing::debug;

const ASSERTION_MEDIA_TYPE: &str = "application/samlassertion+xml";
const AUTH_BLOB_HEADER: &str = "x-auth-blob";

/// Source of raw assertion documents for a host identity.
pub trait AssertionSource: Send + Sync {
    fn fetch(&self, identity: &HostIdentity) -> Result<Vec<u8>, FetchError>;
}

/// HTTP attestation client: `GET {api_path}?host_id=<id>&limit=1`.
///
/// One attempt per call; retries belong to the caller.
#[derive(Clone)]
pub struct AttestationClient {
    url: String,
    auth_blob: Option<String>,
    timeout: Duration,
    client: Client,
}

impl AttestationClient {
    pub fn new(config: &TrustConfig, client: Client) -> Self {
        Self {
            url: config.assertion_url(),
            auth_blob: config.auth_blob.clone(),
            timeout: config.request_timeout,
            client,
        }
    }
}

impl AssertionSource for AttestationClient {
    fn fetch(&self, identity: &HostIdentity) -> Result<Vec<u8>, FetchError> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("host_id", identity.0.as_str()), ("limit", "1")])
            .header("Accept", ASSERTION_MEDIA_TYPE)
            .timeout(self.timeout);
        if let Some(blob) = &self.auth_blob {
            request = request
                .header(AUTH_BLOB_HEADER, blob)
                .header("Authorization", basic_auth(blob));
        }

        let res = request
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
        ) {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = res.bytes().map_err(|e| FetchError::Body(e.to_string()))?;
        debug!(host_id = %identity, bytes = body.len(), "fetched attestation assertion");
        Ok(body.to_vec())
    }
}
