use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Connection and policy settings for the attestation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustConfig {
    pub server: String,
    pub port: u16,
    /// Assertion endpoint, queried with `host_id` and `limit=1`.
    pub api_path: String,
    /// Host directory endpoint, queried with `nameEqualTo`.
    pub host_path: String,
    /// PEM trust anchor for the server certificate. When absent the transport
    /// is still TLS but the server certificate is NOT verified. Unsafe for
    /// production.
    pub ca_file: Option<PathBuf>,
    /// `user:password` shared secret sent as Basic auth and `x-auth-blob`.
    pub auth_blob: Option<String>,
    pub request_timeout: Duration,
    /// Trust record cache lifetime. Zero disables the cache.
    pub cache_ttl: Duration,
    pub https_only: bool,
    /// Overrides `https://{server}:{port}`; only set by `for_tests`.
    base_url_override: Option<String>,
}

impl TrustConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_map(&env_map())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> AppResult<Self> {
        let server = required(vars, "TRUST_ATTESTATION_SERVER")?;
        let timeout_secs: u64 = parsed(vars, "TRUST_REQUEST_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "TRUST_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            server,
            port: parsed(vars, "TRUST_ATTESTATION_PORT", 8443)?,
            api_path: get(
                vars,
                "TRUST_ATTESTATION_API_PATH",
                "/mtwilson/v2/host-attestations",
            ),
            host_path: get(vars, "TRUST_ATTESTATION_HOST_PATH", "/mtwilson/v2/hosts"),
            ca_file: optional(vars, "TRUST_ATTESTATION_CA_FILE").map(PathBuf::from),
            auth_blob: optional(vars, "TRUST_ATTESTATION_AUTH_BLOB"),
            request_timeout: Duration::from_secs(timeout_secs),
            cache_ttl: Duration::from_secs(parsed(vars, "TRUST_CACHE_TTL_SECS", 0)?),
            https_only: true,
            base_url_override: None,
        })
    }

    /// Plaintext config pointed at an in-process mock server.
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            server: "localhost".to_string(),
            port: 0,
            api_path: "/mtwilson/v2/host-attestations".to_string(),
            host_path: "/mtwilson/v2/hosts".to_string(),
            ca_file: None,
            auth_blob: Some("admin:password".to_string()),
            request_timeout: Duration::from_secs(5),
            cache_ttl: Duration::ZERO,
            https_only: false,
            base_url_override: Some(base_url.trim_end_matches('/').to_string()),
        }
    }

    pub fn base_url(&self) -> String {
        match &self.base_url_override {
            Some(url) => url.clone(),
            None => format!("https://{}:{}", self.server, self.port),
        }
    }

    pub fn assertion_url(&self) -> String {
        format!("{}{}", self.base_url(), self.api_path)
    }

    pub fn host_directory_url(&self) -> String {
        format!("{}{}", self.base_url(), self.host_path)
    }
}

fn env_map() -> HashMap<String, String> {
    env::vars().collect()
}

fn get(vars: &HashMap<String, String>, key: &str, default: &str) -> String {
    vars.get(key)
        .cloned()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required(vars: &HashMap<String, String>, key: &str) -> AppResult<String> {
    vars.get(key)
        .cloned()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("missing required env var {key}")))
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).cloned().filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> AppResult<T> {
    match optional(vars, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {key}: {raw}"))),
        None => Ok(default),
    }
}
