use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use filecheck_domain::normalize_host;
use parking_lot::Mutex;

/// Hosts found unreachable during this run, keyed by normalized host name.
///
/// Entries never expire and nothing is persisted. `host_guard` hands out one
/// mutex per host so that check-then-probe against a host is serialized when
/// records are verified in parallel.
#[derive(Debug, Default)]
pub struct HostExclusionLedger {
    excluded: Mutex<BTreeMap<String, String>>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HostExclusionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, host: &str) -> bool {
        self.excluded.lock().contains_key(&normalize_host(host))
    }

    pub fn reason(&self, host: &str) -> Option<String> {
        self.excluded.lock().get(&normalize_host(host)).cloned()
    }

    /// Returns true when the host was newly excluded; the first reason wins.
    pub fn exclude(&self, host: &str, reason: &str) -> bool {
        let key = normalize_host(host);
        let mut excluded = self.excluded.lock();
        if excluded.contains_key(&key) {
            return false;
        }
        tracing::warn!(
            target: "filecheck.probe",
            host = %key,
            reason,
            "host excluded for the rest of the run"
        );
        excluded.insert(key, reason.to_owned());
        true
    }

    pub fn host_guard(&self, host: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock();
        Arc::clone(guards.entry(normalize_host(host)).or_default())
    }

    /// Excluded hosts in name order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.excluded
            .lock()
            .iter()
            .map(|(host, reason)| (host.clone(), reason.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.excluded.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.lock().is_empty()
    }
}
