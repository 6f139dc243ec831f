use std::fs::File;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use filecheck_domain::{ByteSource, EntryKind};

/// Result of the two independent existence predicates plus the entry kind.
///
/// `exists == false && known_absent == false` is the ambiguous case: the entry
/// could not be confirmed either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inspection {
    pub exists: bool,
    pub known_absent: bool,
    pub kind: Option<EntryKind>,
}

impl Inspection {
    pub const fn found(kind: EntryKind) -> Self {
        Self {
            exists: true,
            known_absent: false,
            kind: Some(kind),
        }
    }

    pub const fn absent() -> Self {
        Self {
            exists: false,
            known_absent: true,
            kind: None,
        }
    }

    pub const fn ambiguous() -> Self {
        Self {
            exists: false,
            known_absent: false,
            kind: None,
        }
    }
}

/// Filesystem access used by the probes and metadata extraction.
///
/// Implementations may block for arbitrarily long on unreachable network
/// shares; callers that need a latency bound run them on a bounded worker.
pub trait Filesystem: Send + Sync + 'static {
    fn inspect(&self, path: &Path) -> io::Result<Inspection>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn ByteSource>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn inspect(&self, path: &Path) -> io::Result<Inspection> {
        match std::fs::metadata(path) {
            Ok(meta) => {
                let kind = if meta.is_file() {
                    EntryKind::File
                } else if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::Other
                };
                Ok(Inspection::found(kind))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Inspection::absent()),
            Err(_) => Ok(Inspection::ambiguous()),
        }
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ByteSource>> {
        Ok(Box::new(File::open(path)?))
    }
}
