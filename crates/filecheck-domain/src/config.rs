use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const CONFIG_SCHEMA_V1: &str = "config.v1";

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 7;
const DEFAULT_PE_SCAN_CHUNK_BYTES: usize = 8 * 1024;
const MIN_PE_SCAN_CHUNK_BYTES: usize = 64;
const DEFAULT_MAX_MANIFEST_BYTES: u64 = 1024 * 1024;
const DEFAULT_MARKER_TOKEN: &str = "result.filename=";
const DEFAULT_ARCHIVE_EXTENSION: &str = ".jar";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {} could not be read: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported config schema_version {found:?} (expected {expected:?})")]
    UnsupportedSchema {
        found: String,
        expected: &'static str,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Byte-level bounds for the version extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub pe_scan_chunk_bytes: usize,
    pub max_manifest_bytes: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            pe_scan_chunk_bytes: DEFAULT_PE_SCAN_CHUNK_BYTES,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
        }
    }
}

/// Platform labels that identify Windows hosts; matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSet {
    labels: Vec<String>,
}

impl PlatformSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::<String>::new();
        for label in labels {
            let trimmed = label.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let lower = trimmed.to_lowercase();
            if !out.contains(&lower) {
                out.push(lower);
            }
        }
        Self { labels: out }
    }

    pub fn matches(&self, platform_label: &str) -> bool {
        let needle = platform_label.trim();
        if needle.is_empty() {
            return false;
        }
        let needle = needle.to_lowercase();
        self.labels.iter().any(|l| *l == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// Ordered exact-match replacements for known corrupted paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementTable {
    entries: Vec<Replacement>,
}

impl ReplacementTable {
    pub fn new(entries: Vec<Replacement>) -> Result<Self, ConfigError> {
        for entry in &entries {
            if entry.from.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "replacements",
                    reason: "replacement keys must not be blank".to_string(),
                });
            }
        }
        for entry in &entries {
            let to = entry.to.trim();
            if entries
                .iter()
                .any(|other| fold_case(other.from.trim()) == fold_case(to))
            {
                return Err(ConfigError::Invalid {
                    field: "replacements",
                    reason: format!("replacement value {to:?} is itself a replacement key"),
                });
            }
        }
        Ok(Self { entries })
    }

    /// First entry whose key equals `path`; case-insensitive only for Windows targets.
    pub fn lookup(&self, path: &str, case_insensitive: bool) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| {
                let key = e.from.trim();
                if case_insensitive {
                    fold_case(key) == fold_case(path)
                } else {
                    key == path
                }
            })
            .map(|e| e.to.trim())
    }
}

/// Case folding shared by table validation and Windows lookups.
fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRules {
    pub replacements: ReplacementTable,
    pub marker_tokens: Vec<String>,
    pub invalid_path_detection: bool,
}

impl Default for RepairRules {
    fn default() -> Self {
        Self {
            replacements: ReplacementTable::default(),
            marker_tokens: vec![DEFAULT_MARKER_TOKEN.to_string()],
            invalid_path_detection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnNames {
    pub platform: String,
    pub file_path: String,
    pub host_name: String,
    #[serde(default)]
    pub cve: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            platform: "PlatformName".to_string(),
            file_path: "FilePath".to_string(),
            host_name: "HostName".to_string(),
            cve: None,
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub columns: ColumnNames,
    pub windows_platforms: PlatformSet,
    pub remote_unc_enabled: bool,
    pub remote_timeout: Duration,
    pub duplicate_search_enabled: bool,
    pub repair: RepairRules,
    pub archive_extensions: Vec<String>,
    pub limits: ScanLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            windows_platforms: PlatformSet::new(["Windows"]),
            remote_unc_enabled: true,
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            duplicate_search_enabled: false,
            repair: RepairRules::default(),
            archive_extensions: vec![DEFAULT_ARCHIVE_EXTENSION.to_string()],
            limits: ScanLimits::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    schema_version: String,
    columns: ColumnNames,
    windows_platforms: Vec<String>,
    #[serde(default = "default_true")]
    remote_unc_enabled: bool,
    #[serde(default = "default_remote_timeout_secs")]
    remote_timeout_secs: u64,
    #[serde(default = "default_true")]
    invalid_path_detection: bool,
    #[serde(default)]
    duplicate_search_enabled: bool,
    #[serde(default)]
    replacements: Vec<Replacement>,
    #[serde(default = "default_marker_tokens")]
    marker_tokens: Vec<String>,
    #[serde(default = "default_archive_extensions")]
    archive_extensions: Vec<String>,
    #[serde(default = "default_pe_scan_chunk_bytes")]
    pe_scan_chunk_bytes: usize,
    #[serde(default = "default_max_manifest_bytes")]
    max_manifest_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_remote_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

fn default_marker_tokens() -> Vec<String> {
    vec![DEFAULT_MARKER_TOKEN.to_string()]
}

fn default_archive_extensions() -> Vec<String> {
    vec![DEFAULT_ARCHIVE_EXTENSION.to_string()]
}

fn default_pe_scan_chunk_bytes() -> usize {
    DEFAULT_PE_SCAN_CHUNK_BYTES
}

fn default_max_manifest_bytes() -> u64 {
    DEFAULT_MAX_MANIFEST_BYTES
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let raw: ConfigFileV1 = serde_json::from_slice(bytes)?;
        if raw.schema_version != CONFIG_SCHEMA_V1 {
            return Err(ConfigError::UnsupportedSchema {
                found: raw.schema_version,
                expected: CONFIG_SCHEMA_V1,
            });
        }

        for (field, value) in [
            ("columns.platform", &raw.columns.platform),
            ("columns.file_path", &raw.columns.file_path),
            ("columns.host_name", &raw.columns.host_name),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "column name must not be blank"));
            }
        }

        let windows_platforms = PlatformSet::new(&raw.windows_platforms);
        if windows_platforms.is_empty() {
            return Err(invalid(
                "windows_platforms",
                "at least one platform label is required",
            ));
        }

        if raw.remote_timeout_secs == 0 {
            return Err(invalid("remote_timeout_secs", "must be >= 1"));
        }

        if raw.pe_scan_chunk_bytes < MIN_PE_SCAN_CHUNK_BYTES {
            return Err(invalid(
                "pe_scan_chunk_bytes",
                &format!("must be >= {MIN_PE_SCAN_CHUNK_BYTES}"),
            ));
        }

        if raw.max_manifest_bytes == 0 {
            return Err(invalid("max_manifest_bytes", "must be >= 1"));
        }

        let marker_tokens = raw
            .marker_tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();

        let mut archive_extensions = Vec::<String>::new();
        for ext in raw.archive_extensions {
            let ext = ext.trim().to_ascii_lowercase();
            if ext.is_empty() {
                continue;
            }
            let ext = if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            };
            if !archive_extensions.contains(&ext) {
                archive_extensions.push(ext);
            }
        }

        let columns = ColumnNames {
            platform: raw.columns.platform.trim().to_string(),
            file_path: raw.columns.file_path.trim().to_string(),
            host_name: raw.columns.host_name.trim().to_string(),
            cve: raw
                .columns
                .cve
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };

        Ok(Self {
            columns,
            windows_platforms,
            remote_unc_enabled: raw.remote_unc_enabled,
            remote_timeout: Duration::from_secs(raw.remote_timeout_secs),
            duplicate_search_enabled: raw.duplicate_search_enabled,
            repair: RepairRules {
                replacements: ReplacementTable::new(raw.replacements)?,
                marker_tokens,
                invalid_path_detection: raw.invalid_path_detection,
            },
            archive_extensions,
            limits: ScanLimits {
                pe_scan_chunk_bytes: raw.pe_scan_chunk_bytes,
                max_manifest_bytes: raw.max_manifest_bytes,
            },
        })
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
