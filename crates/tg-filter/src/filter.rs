//! Per-placement admission check.
//!
//! Verification runs only when the workload's image asks for it. Trust is
//! established before tags are looked at; an untrusted host's tags are never
//! evaluated. Every failure on the way denies the host.

use std::collections::HashSet;

use tg_attestation::assertion::evaluate_assertion;
use tg_attestation::cache::TrustCache;
use tg_attestation::policy::matches_text;
use tg_attestation::{AssertionSource, AttestationClient, DirectoryClient, HostDirectory};
use tg_common::config::TrustConfig;
use tg_common::error::{AppResult, FetchError};
use tg_common::http::build_client;
use tg_common::types::{HostDescriptor, HostIdentity, HostQuery, TrustRecord, WorkloadPolicy};
use tracing::{debug, warn};

use crate::decision::{AllowReason, Decision, DenyReason};

pub struct AdmissionFilter {
    directory: Box<dyn HostDirectory>,
    attestation: Box<dyn AssertionSource>,
    cache: TrustCache,
    known_hosts: HashSet<String>,
}

impl AdmissionFilter {
    /// Filter backed by the attestation service in `config`. The host
    /// directory and attestation calls share one connection pool.
    pub fn new(config: &TrustConfig) -> AppResult<Self> {
        let client = build_client(config)?;
        Ok(Self::with_sources(
            Box::new(DirectoryClient::new(config, client.clone())),
            Box::new(AttestationClient::new(config, client)),
            TrustCache::new(config.cache_ttl),
        ))
    }

    pub fn with_sources(
        directory: Box<dyn HostDirectory>,
        attestation: Box<dyn AssertionSource>,
        cache: TrustCache,
    ) -> Self {
        Self {
            directory,
            attestation,
            cache,
            known_hosts: HashSet::new(),
        }
    }

    /// Seed the compute-node snapshot. Only used for diagnostics; the
    /// directory is always consulted.
    pub fn with_known_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn host_passes(&self, host: &HostDescriptor, policy: &WorkloadPolicy) -> bool {
        self.decide(host, policy).is_allowed()
    }

    pub fn decide(&self, host: &HostDescriptor, policy: &WorkloadPolicy) -> Decision {
        if !policy.trust_required() {
            return Decision::Allow(AllowReason::NotRequired);
        }

        if !self.known_hosts.is_empty() && !self.known_hosts.contains(&host.hostname) {
            debug!(hostname = %host.hostname, "host missing from compute-node snapshot");
        }

        let identity = match self.directory.resolve(&HostQuery::from(host)) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(%err, "denying host without directory identity");
                return Decision::Deny(DenyReason::HostNotFound);
            }
        };

        let record = match self.trust_record(&identity) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    hostname = %host.hostname,
                    host_id = %identity,
                    %err,
                    "denying host without assertion"
                );
                return Decision::Deny(DenyReason::FetchFailed);
            }
        };

        if !record.trusted {
            debug!(hostname = %host.hostname, host_id = %identity, "host is not trusted");
            return Decision::Deny(DenyReason::Untrusted);
        }

        match policy.tag_selection() {
            Some(selection) if matches_text(&record.tags, selection) => {
                Decision::Allow(AllowReason::TagsMatched)
            }
            Some(_) => {
                debug!(hostname = %host.hostname, host_id = %identity, "asset tags rejected");
                Decision::Deny(DenyReason::TagMismatch)
            }
            None => Decision::Allow(AllowReason::Trusted),
        }
    }

    fn trust_record(&self, identity: &HostIdentity) -> Result<TrustRecord, FetchError> {
        if let Some(record) = self.cache.get(identity) {
            debug!(host_id = %identity, "using cached trust record");
            return Ok(record);
        }

        let raw = self.attestation.fetch(identity)?;
        let record = evaluate_assertion(&raw);
        self.cache.insert(identity.clone(), record.clone());
        Ok(record)
    }
}
