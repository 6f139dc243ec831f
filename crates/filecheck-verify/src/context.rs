use std::time::SystemTime;

use filecheck_domain::normalize_host;
use filecheck_probe::HostExclusionLedger;

use crate::metadata::format_timestamp;

/// State that lives for exactly one run: the caller's own host name and the
/// exclusion ledger. Dropping the context forgets every excluded host.
#[derive(Debug)]
pub struct RunContext {
    local_host: String,
    scanned_at: String,
    ledger: HostExclusionLedger,
}

impl RunContext {
    pub fn new(local_host: &str) -> Self {
        Self::with_scan_time(local_host, SystemTime::now())
    }

    pub fn with_scan_time(local_host: &str, scanned_at: SystemTime) -> Self {
        Self {
            local_host: normalize_host(local_host),
            scanned_at: format_timestamp(scanned_at),
            ledger: HostExclusionLedger::new(),
        }
    }

    /// Local time the run started, stamped on every probed record.
    pub fn scanned_at(&self) -> &str {
        &self.scanned_at
    }

    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    pub fn ledger(&self) -> &HostExclusionLedger {
        &self.ledger
    }

    pub fn is_local_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        !host.is_empty() && host == self.local_host
    }
}
