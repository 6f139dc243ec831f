use core::fmt;
use std::path::PathBuf;

use crate::ids::RecordKey;
use crate::record::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    EmptyPath,
    PlaceholderPath,
    DisallowedPattern,
    DirectoryPath,
    AccessDenied,
    Timeout,
    ProbeFailed,
    InvalidUncSource,
    HostExcluded,
    NoManifest,
    NoVersion,
    ArchiveError,
    ReadError,
}

impl ReasonCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyPath => "EMPTY_PATH",
            Self::PlaceholderPath => "PLACEHOLDER_PATH",
            Self::DisallowedPattern => "DISALLOWED_PATTERN",
            Self::DirectoryPath => "DIRECTORY_PATH",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Timeout => "TIMEOUT",
            Self::ProbeFailed => "PROBE_FAILED",
            Self::InvalidUncSource => "INVALID_UNC_SOURCE",
            Self::HostExcluded => "HOST_EXCLUDED",
            Self::NoManifest => "NO_MANIFEST",
            Self::NoVersion => "NO_VERSION",
            Self::ArchiveError => "ARCHIVE_ERROR",
            Self::ReadError => "READ_ERROR",
        }
    }

    /// Failures that mean the host itself could not be reached and must be
    /// excluded for the rest of the run.
    pub const fn excludes_host(self) -> bool {
        matches!(self, Self::AccessDenied | Self::Timeout | Self::ProbeFailed)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error string carried inside an outcome value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: ReasonCode,
    pub message: String,
}

impl Failure {
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            code: self.code,
            message: format!("{prefix}{}", self.message),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub repaired_path: String,
    pub was_repaired: bool,
    pub invalid_reason: Option<Failure>,
}

impl RepairOutcome {
    pub fn untouched(path: impl Into<String>) -> Self {
        Self {
            repaired_path: path.into(),
            was_repaired: false,
            invalid_reason: None,
        }
    }

    pub fn repaired(path: impl Into<String>) -> Self {
        Self {
            repaired_path: path.into(),
            was_repaired: true,
            invalid_reason: None,
        }
    }

    pub fn invalid(path: impl Into<String>, was_repaired: bool, reason: Failure) -> Self {
        Self {
            repaired_path: path.into(),
            was_repaired,
            invalid_reason: Some(reason),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid_reason.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Exists,
    Missing,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

impl EntryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Directory => "DIRECTORY",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub existence: Existence,
    pub kind: Option<EntryKind>,
    pub resolved_path: Option<PathBuf>,
    pub error: Option<Failure>,
}

impl ProbeOutcome {
    pub fn exists(resolved_path: PathBuf, kind: EntryKind) -> Self {
        Self {
            existence: Existence::Exists,
            kind: Some(kind),
            resolved_path: Some(resolved_path),
            error: None,
        }
    }

    pub fn missing(resolved_path: PathBuf) -> Self {
        Self {
            existence: Existence::Missing,
            kind: None,
            resolved_path: Some(resolved_path),
            error: None,
        }
    }

    pub fn indeterminate(resolved_path: Option<PathBuf>, error: Failure) -> Self {
        Self {
            existence: Existence::Indeterminate,
            kind: None,
            resolved_path,
            error: Some(error),
        }
    }

    /// True only for an existing regular file; directories and other entry
    /// kinds never feed metadata extraction.
    pub fn is_regular_file(&self) -> bool {
        self.existence == Existence::Exists && self.kind == Some(EntryKind::File)
    }

    pub fn is_non_file_entry(&self) -> bool {
        self.existence == Existence::Exists && self.kind != Some(EntryKind::File)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionOutcome {
    pub version: Option<String>,
    pub error: Option<Failure>,
}

impl VersionOutcome {
    pub fn found(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            error: None,
        }
    }

    pub fn failed(error: Failure) -> Self {
        Self {
            version: None,
            error: Some(error),
        }
    }

    /// No extractor applies to this file type.
    pub fn not_applicable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceStatus {
    Yes,
    No,
    Unknown,
    Invalid,
}

impl ExistenceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Y",
            Self::No => "N",
            Self::Unknown => "UNKNOWN",
            Self::Invalid => "INVALID",
        }
    }

    pub fn from_probe(probe: &ProbeOutcome) -> Self {
        match probe.existence {
            Existence::Exists if probe.is_regular_file() => Self::Yes,
            Existence::Exists | Existence::Missing => Self::No,
            Existence::Indeterminate => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Original,
    Repaired,
}

impl MetadataSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "ORIGINAL",
            Self::Repaired => "REPAIRED",
        }
    }
}

/// Everything the output collaborator persists for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub row: u64,
    pub route: Route,
    pub original_exists: ExistenceStatus,
    pub invalid_reason: Option<Failure>,
    pub repaired_path: String,
    pub was_repaired: bool,
    pub repaired_exists: Option<ExistenceStatus>,
    pub metadata_source: Option<MetadataSource>,
    pub modification_time: Option<String>,
    pub version: Option<String>,
    /// Run-level scan time; set on every record that was routed for probing.
    pub scanned_at: Option<String>,
    pub local_error: Option<String>,
    pub remote_error: Option<String>,
    pub host_excluded: bool,
    pub unique_id: Option<RecordKey>,
    pub duplicate: Option<bool>,
}

impl VerificationResult {
    pub fn new(row: u64, route: Route, raw_path: &str) -> Self {
        Self {
            row,
            route,
            original_exists: ExistenceStatus::Unknown,
            invalid_reason: None,
            repaired_path: raw_path.to_string(),
            was_repaired: false,
            repaired_exists: None,
            metadata_source: None,
            modification_time: None,
            version: None,
            scanned_at: None,
            local_error: None,
            remote_error: None,
            host_excluded: false,
            unique_id: None,
            duplicate: None,
        }
    }

    pub fn push_local_error(&mut self, message: &str) {
        append_error(&mut self.local_error, message);
    }

    pub fn push_remote_error(&mut self, message: &str) {
        append_error(&mut self.remote_error, message);
    }
}

fn append_error(slot: &mut Option<String>, message: &str) {
    match slot {
        Some(existing) => {
            existing.push_str("; ");
            existing.push_str(message);
        }
        None => *slot = Some(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_entry_reports_not_a_file() {
        let probe = ProbeOutcome::exists(PathBuf::from("/tmp"), EntryKind::Directory);
        assert!(!probe.is_regular_file());
        assert!(probe.is_non_file_entry());
        assert_eq!(ExistenceStatus::from_probe(&probe), ExistenceStatus::No);
    }

    #[test]
    fn indeterminate_lookup_maps_to_unknown() {
        let probe = ProbeOutcome::indeterminate(
            None,
            Failure::new(ReasonCode::AccessDenied, "access denied"),
        );
        assert_eq!(ExistenceStatus::from_probe(&probe), ExistenceStatus::Unknown);
    }

    #[test]
    fn errors_accumulate_with_separator() {
        let mut res = VerificationResult::new(3, Route::Local, "C:\\a.exe");
        res.push_local_error("first");
        res.push_local_error("second");
        assert_eq!(res.local_error.as_deref(), Some("first; second"));
        assert_eq!(res.remote_error, None);
    }

    #[test]
    fn only_unreachability_codes_exclude_hosts() {
        assert!(ReasonCode::Timeout.excludes_host());
        assert!(ReasonCode::AccessDenied.excludes_host());
        assert!(ReasonCode::ProbeFailed.excludes_host());
        assert!(!ReasonCode::InvalidUncSource.excludes_host());
        assert!(!ReasonCode::NoVersion.excludes_host());
    }
}
