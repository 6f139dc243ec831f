pub mod bounded;
pub mod fs;
pub mod ledger;
pub mod probe;

pub use bounded::{BoundedError, run_bounded};
pub use fs::{Filesystem, Inspection, OsFilesystem};
pub use ledger::HostExclusionLedger;
pub use probe::{RemoteProbe, check, local_probe, normalize_local_path};
