use crate::config::PlatformSet;

/// One input row: a file path claimed to exist on a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub row: u64,
    pub raw_path: String,
    pub host_name: String,
    pub platform_label: String,
    pub is_windows_platform: bool,
    pub cve: Option<String>,
}

impl FileRecord {
    pub fn new(
        row: u64,
        raw_path: impl Into<String>,
        host_name: impl Into<String>,
        platform_label: impl Into<String>,
        windows_platforms: &PlatformSet,
    ) -> Self {
        let platform_label = platform_label.into();
        let is_windows_platform = windows_platforms.matches(&platform_label);
        Self {
            row,
            raw_path: raw_path.into(),
            host_name: host_name.into(),
            platform_label,
            is_windows_platform,
            cve: None,
        }
    }

    pub fn with_cve(mut self, cve: impl Into<String>) -> Self {
        let cve = cve.into();
        self.cve = if cve.trim().is_empty() {
            None
        } else {
            Some(cve)
        };
        self
    }

    pub fn normalized_host(&self) -> String {
        normalize_host(&self.host_name)
    }
}

/// Ledger and routing key for a host name: trimmed and lower-cased.
pub fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Remote,
    Skipped,
}

impl Route {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Remote => "REMOTE",
            Self::Skipped => "SKIPPED",
        }
    }
}
