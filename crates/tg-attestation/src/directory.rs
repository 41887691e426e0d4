//! Host identity resolution against the attestation service's host directory.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tg_common::config::TrustConfig;
use tg_common::error::NotFound;
use tg_common::http::basic_auth;
use tg_common::types::{HostIdentity, HostQuery};
use tracing::{debug, warn};

/// Maps a host's network identifiers to its stable directory identity.
pub trait HostDirectory: Send + Sync {
    fn resolve(&self, query: &HostQuery) -> Result<HostIdentity, NotFound>;
}

#[derive(Debug, Deserialize)]
struct HostList {
    hosts: Vec<HostEntry>,
}

#[derive(Debug, Deserialize)]
struct HostEntry {
    id: String,
}

/// HTTP host directory: `GET {host_path}?nameEqualTo=<name>`.
#[derive(Clone)]
pub struct DirectoryClient {
    url: String,
    authorization: Option<String>,
    timeout: Duration,
    client: Client,
}

impl DirectoryClient {
    pub fn new(config: &TrustConfig, client: Client) -> Self {
        Self {
            url: config.host_directory_url(),
            authorization: config.auth_blob.as_deref().map(basic_auth),
            timeout: config.request_timeout,
            client,
        }
    }

    /// Identity of the first host whose name equals `name`.
    fn lookup(&self, name: &str) -> Result<HostIdentity, String> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("nameEqualTo", name)])
            .header("Accept", "application/json")
            .timeout(self.timeout);
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let res = request
            .send()
            .map_err(|e| format!("host directory request failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("host directory returned error status: {e}"))?;
        let list = res
            .json::<HostList>()
            .map_err(|e| format!("host directory parse failed: {e}"))?;

        list.hosts
            .into_iter()
            .next()
            .map(|h| h.id)
            .filter(|id| !id.is_empty())
            .map(HostIdentity)
            .ok_or_else(|| "no matching host".to_string())
    }
}

impl HostDirectory for DirectoryClient {
    fn resolve(&self, query: &HostQuery) -> Result<HostIdentity, NotFound> {
        let mut candidates = vec![query.primary_identifier.as_str()];
        if !query.fallback_identifier.is_empty() {
            candidates.push(query.fallback_identifier.as_str());
        }

        for name in candidates.into_iter().filter(|n| !n.is_empty()) {
            match self.lookup(name) {
                Ok(identity) => {
                    debug!(%name, host_id = %identity, "resolved host identity");
                    return Ok(identity);
                }
                Err(reason) => warn!(%name, %reason, "host directory lookup missed"),
            }
        }

        Err(NotFound {
            hostname: query.primary_identifier.clone(),
            ip: query.fallback_identifier.clone(),
        })
    }
}
