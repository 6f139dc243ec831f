pub mod config;
pub mod hashing;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod source;

pub use config::{
    CONFIG_SCHEMA_V1, ColumnNames, ConfigError, PlatformSet, RepairRules, Replacement,
    ReplacementTable, ScanLimits, Settings,
};
pub use hashing::compute_record_key;
pub use ids::{Digest32, RecordKey};
pub use outcome::{
    EntryKind, Existence, ExistenceStatus, Failure, MetadataSource, ProbeOutcome, ReasonCode,
    RepairOutcome, VerificationResult, VersionOutcome,
};
pub use record::{FileRecord, Route, normalize_host};
pub use source::ByteSource;
