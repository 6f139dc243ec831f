use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use filecheck_domain::{EntryKind, Failure, ProbeOutcome, ReasonCode};

use crate::bounded::{BoundedError, run_bounded};
use crate::fs::Filesystem;

const ACCESS_DENIED: &str = "access denied";

/// Applies both existence predicates to `path`. Disagreement is reported as
/// indeterminate rather than as "not found".
pub fn check(fs: &dyn Filesystem, path: &Path) -> ProbeOutcome {
    let inspection = match fs.inspect(path) {
        Ok(v) => v,
        Err(err) => {
            return ProbeOutcome::indeterminate(
                Some(path.to_path_buf()),
                Failure::new(ReasonCode::ProbeFailed, err.to_string()),
            );
        }
    };

    match (inspection.exists, inspection.known_absent) {
        (true, _) => {
            ProbeOutcome::exists(path.to_path_buf(), inspection.kind.unwrap_or(EntryKind::Other))
        }
        (false, true) => ProbeOutcome::missing(path.to_path_buf()),
        (false, false) => ProbeOutcome::indeterminate(
            Some(path.to_path_buf()),
            Failure::new(ReasonCode::AccessDenied, ACCESS_DENIED),
        ),
    }
}

/// Local existence check on a path given in either separator style.
pub fn local_probe(fs: &dyn Filesystem, raw_path: &str) -> ProbeOutcome {
    let path = normalize_local_path(raw_path);
    let outcome = check(fs, &path);
    tracing::debug!(
        target: "filecheck.probe",
        path = %path.display(),
        existence = ?outcome.existence,
        "local probe completed"
    );
    outcome
}

/// Backslashes become `/`, then `.` and `..` are resolved lexically.
pub fn normalize_local_path(raw: &str) -> PathBuf {
    let unified = raw.trim().replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Existence checks against network paths, each bounded by a wall-clock
/// timeout on an abandonable worker.
#[derive(Clone)]
pub struct RemoteProbe {
    fs: Arc<dyn Filesystem>,
    timeout: Duration,
}

impl RemoteProbe {
    pub fn new(fs: Arc<dyn Filesystem>, timeout: Duration) -> Self {
        Self { fs, timeout }
    }

    pub fn probe(&self, unc_path: &str) -> ProbeOutcome {
        let path = PathBuf::from(unc_path);
        let worker_path = path.clone();
        let outcome = match self.run(move |fs| check(fs, &worker_path)) {
            Ok(outcome) => outcome,
            Err(failure) => ProbeOutcome::indeterminate(Some(path.clone()), failure),
        };
        tracing::debug!(
            target: "filecheck.probe",
            path = %path.display(),
            existence = ?outcome.existence,
            "remote probe completed"
        );
        outcome
    }

    /// Runs arbitrary filesystem work under the same bound as `probe`.
    pub fn run<T, F>(&self, work: F) -> Result<T, Failure>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Filesystem) -> T + Send + 'static,
    {
        let fs = Arc::clone(&self.fs);
        run_bounded("filecheck-remote", self.timeout, move || work(fs.as_ref())).map_err(
            |err| match err {
                BoundedError::Timeout(_) => Failure::new(ReasonCode::Timeout, err.to_string()),
                BoundedError::Spawn(_) | BoundedError::WorkerLost => {
                    Failure::new(ReasonCode::ProbeFailed, err.to_string())
                }
            },
        )
    }
}

impl std::fmt::Debug for RemoteProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteProbe")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
