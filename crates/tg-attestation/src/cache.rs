use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tg_common::types::{HostIdentity, TrustRecord};

#[derive(Debug, Clone)]
struct CachedRecord {
    fetched_at: Instant,
    record: TrustRecord,
}

/// Trust records keyed by host identity, served only until `ttl` elapses.
pub struct TrustCache {
    ttl: Duration,
    entries: RwLock<HashMap<HostIdentity, CachedRecord>>,
}

impl TrustCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh record for `identity`. Expired entries are dropped and reported absent.
    pub fn get(&self, identity: &HostIdentity) -> Option<TrustRecord> {
        if !self.is_enabled() {
            return None;
        }

        {
            let guard = self.entries.read().expect("rwlock poisoned");
            match guard.get(identity) {
                Some(cached) if cached.fetched_at.elapsed() < self.ttl => {
                    return Some(cached.record.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut guard = self.entries.write().expect("rwlock poisoned");
        if guard
            .get(identity)
            .is_some_and(|cached| cached.fetched_at.elapsed() >= self.ttl)
        {
            guard.remove(identity);
        }
        None
    }

    pub fn insert(&self, identity: HostIdentity, record: TrustRecord) {
        if !self.is_enabled() {
            return;
        }
        let mut guard = self.entries.write().expect("rwlock poisoned");
        guard.retain(|_, cached| cached.fetched_at.elapsed() < self.ttl);
        guard.insert(
            identity,
            CachedRecord {
                fetched_at: Instant::now(),
                record,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tg_common::types::{HostIdentity, TagSet, TrustRecord};

    use super::TrustCache;

    fn trusted() -> TrustRecord {
        let mut tags = TagSet::new();
        tags.insert("location", "US");
        TrustRecord {
            trusted: true,
            tags,
        }
    }

    #[test]
    fn serves_fresh_records() {
        let cache = TrustCache::new(Duration::from_secs(60));
        let id = HostIdentity("host-1".to_string());
        cache.insert(id.clone(), trusted());

        assert_eq!(cache.get(&id), Some(trusted()));
        assert_eq!(cache.get(&HostIdentity("host-2".to_string())), None);
    }

    #[test]
    fn expired_records_are_absent_and_evicted() {
        let cache = TrustCache::new(Duration::from_millis(10));
        let id = HostIdentity("host-1".to_string());
        cache.insert(id.clone(), trusted());
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&id), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_sweeps_expired_records_of_other_hosts() {
        let cache = TrustCache::new(Duration::from_millis(10));
        cache.insert(HostIdentity("decommissioned".to_string()), trusted());
        std::thread::sleep(Duration::from_millis(20));

        let id = HostIdentity("host-1".to_string());
        cache.insert(id.clone(), trusted());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id), Some(trusted()));
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let cache = TrustCache::new(Duration::ZERO);
        let id = HostIdentity("host-1".to_string());
        cache.insert(id.clone(), trusted());

        assert!(!cache.is_enabled());
        assert_eq!(cache.get(&id), None);
        assert!(cache.is_empty());
    }
}
