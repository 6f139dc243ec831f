use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use filecheck_domain::{
    EntryKind, ExistenceStatus, Failure, FileRecord, MetadataSource, ProbeOutcome, ReasonCode, Route,
    Settings, VerificationResult,
};
use filecheck_extract::ExtractorRegistry;
use filecheck_paths::{PathRepairer, to_unc};
use filecheck_probe::{Filesystem, OsFilesystem, RemoteProbe, local_probe};

use crate::context::RunContext;
use crate::duplicates::{mark_duplicates, record_key};
use crate::metadata::{Metadata, read_metadata};

/// Terminal reason for an original path that exists but is not a regular file.
fn not_a_file(kind: Option<EntryKind>) -> Failure {
    let message = match kind {
        Some(EntryKind::Directory) => "path is a directory, not a file",
        _ => "path is not a regular file",
    };
    Failure::new(ReasonCode::DirectoryPath, message)
}

/// How one record's paths are reached. Chosen once per record.
#[derive(Debug, Clone, Copy)]
enum Access<'a> {
    Local,
    Remote { host: &'a str },
}

/// Per-record verification: route, repair, probe, then extract metadata.
pub struct Verifier {
    settings: Settings,
    repairer: PathRepairer,
    registry: Arc<ExtractorRegistry>,
    fs: Arc<dyn Filesystem>,
    remote: RemoteProbe,
}

impl Verifier {
    pub fn new(settings: Settings, fs: Arc<dyn Filesystem>) -> Self {
        let repairer = PathRepairer::new(settings.repair.clone());
        let registry = Arc::new(ExtractorRegistry::from_settings(&settings));
        let remote = RemoteProbe::new(Arc::clone(&fs), settings.remote_timeout);
        Self {
            settings,
            repairer,
            registry,
            fs,
            remote,
        }
    }

    pub fn with_os_filesystem(settings: Settings) -> Self {
        Self::new(settings, Arc::new(OsFilesystem))
    }

    pub fn route(&self, ctx: &RunContext, record: &FileRecord) -> Route {
        if ctx.is_local_host(&record.host_name) {
            return Route::Local;
        }
        if self.settings.remote_unc_enabled
            && record.is_windows_platform
            && !record.host_name.trim().is_empty()
        {
            return Route::Remote;
        }
        Route::Skipped
    }

    pub fn verify(&self, ctx: &RunContext, record: &FileRecord) -> VerificationResult {
        let route = self.route(ctx, record);
        let mut result = VerificationResult::new(record.row, route, &record.raw_path);

        let repair = self
            .repairer
            .repair(&record.raw_path, record.is_windows_platform);
        result.repaired_path = repair.repaired_path.clone();
        result.was_repaired = repair.was_repaired;

        if route != Route::Skipped {
            result.scanned_at = Some(ctx.scanned_at().to_string());
        }

        match route {
            Route::Skipped => {}
            Route::Local => {
                self.verify_with(ctx, record, Access::Local, repair.invalid_reason, &mut result)
            }
            Route::Remote => {
                let host = record.host_name.trim();
                let guard = ctx.ledger().host_guard(host);
                let _serialized = guard.lock();
                self.verify_with(
                    ctx,
                    record,
                    Access::Remote { host },
                    repair.invalid_reason,
                    &mut result,
                );
            }
        }

        if self.settings.duplicate_search_enabled {
            result.unique_id = Some(record_key(record, &result));
        }

        tracing::debug!(
            target: "filecheck.verify",
            row = record.row,
            route = route.as_str(),
            original_exists = result.original_exists.as_str(),
            was_repaired = result.was_repaired,
            host_excluded = result.host_excluded,
            "record verified"
        );
        result
    }

    fn verify_with(
        &self,
        ctx: &RunContext,
        record: &FileRecord,
        access: Access<'_>,
        invalid_reason: Option<Failure>,
        result: &mut VerificationResult,
    ) {
        if let Some(reason) = invalid_reason {
            result.original_exists = ExistenceStatus::Invalid;
            result.invalid_reason = Some(reason);
            return;
        }

        if let Access::Remote { host } = access
            && let Some(reason) = ctx.ledger().reason(host)
        {
            let failure = Failure::new(ReasonCode::HostExcluded, format!("host excluded: {reason}"));
            result.host_excluded = true;
            result.push_remote_error(&failure.message);
            return;
        }

        let original = self.probe(access, &record.raw_path);
        if let Some(err) = &original.error {
            self.note_failure(ctx, access, result, err);
            if result.host_excluded {
                return;
            }
        }

        if original.is_non_file_entry() {
            result.original_exists = ExistenceStatus::Invalid;
            result.invalid_reason = Some(not_a_file(original.kind));
        } else {
            result.original_exists = ExistenceStatus::from_probe(&original);
        }

        let repaired = if result.was_repaired {
            let repaired_path = result.repaired_path.clone();
            let probe = self.probe(access, &repaired_path);
            result.repaired_exists = Some(ExistenceStatus::from_probe(&probe));
            if let Some(err) = &probe.error {
                self.note_failure(ctx, access, result, &err.with_prefix("repaired path: "));
            }
            Some(probe)
        } else {
            None
        };

        if result.original_exists == ExistenceStatus::Invalid || result.host_excluded {
            return;
        }

        let (source, path) = match (&original, &repaired) {
            (o, _) if o.is_regular_file() => (MetadataSource::Original, o.resolved_path.clone()),
            (_, Some(r)) if r.is_regular_file() => {
                (MetadataSource::Repaired, r.resolved_path.clone())
            }
            _ => return,
        };
        let Some(path) = path else {
            return;
        };

        result.metadata_source = Some(source);
        match self.metadata(access, path, record.is_windows_platform) {
            Ok(meta) => {
                result.modification_time = meta.modified;
                result.version = meta.version.version;
                for err in &meta.errors {
                    self.note_failure(ctx, access, result, err);
                }
            }
            Err(err) => self.note_failure(ctx, access, result, &err),
        }
    }

    fn probe(&self, access: Access<'_>, path: &str) -> ProbeOutcome {
        match access {
            Access::Local => local_probe(self.fs.as_ref(), path),
            Access::Remote { host } => match to_unc(host, path) {
                Ok(unc) => self.remote.probe(&unc),
                Err(failure) => ProbeOutcome::indeterminate(None, failure),
            },
        }
    }

    fn metadata(
        &self,
        access: Access<'_>,
        path: PathBuf,
        is_windows: bool,
    ) -> Result<Metadata, Failure> {
        match access {
            Access::Local => Ok(read_metadata(
                self.fs.as_ref(),
                &self.registry,
                &path,
                is_windows,
            )),
            Access::Remote { .. } => {
                let registry = Arc::clone(&self.registry);
                self.remote
                    .run(move |fs| read_metadata(fs, &registry, &path, is_windows))
            }
        }
    }

    /// Records an error on the field for this access path. Unreachable-host
    /// failures on the remote path also exclude the host.
    fn note_failure(
        &self,
        ctx: &RunContext,
        access: Access<'_>,
        result: &mut VerificationResult,
        failure: &Failure,
    ) {
        match access {
            Access::Local => result.push_local_error(&failure.message),
            Access::Remote { host } => {
                result.push_remote_error(&failure.message);
                if failure.code.excludes_host() {
                    ctx.ledger().exclude(host, &failure.message);
                    result.host_excluded = true;
                }
            }
        }
    }

    /// Verifies every record and returns results in input order.
    ///
    /// With more than one worker, records are grouped by normalized host and
    /// each group is handled by a single worker in input order.
    pub fn verify_all(
        &self,
        ctx: &RunContext,
        records: &[FileRecord],
        workers: usize,
    ) -> Vec<VerificationResult> {
        let mut results = if workers <= 1 || records.len() <= 1 {
            records.iter().map(|r| self.verify(ctx, r)).collect::<Vec<_>>()
        } else {
            self.verify_partitioned(ctx, records, workers)
        };

        let duplicates = if self.settings.duplicate_search_enabled {
            mark_duplicates(records, &mut results)
        } else {
            0
        };

        let existing = results
            .iter()
            .filter(|r| r.original_exists == ExistenceStatus::Yes)
            .count();
        let invalid = results
            .iter()
            .filter(|r| r.original_exists == ExistenceStatus::Invalid)
            .count();
        let repaired = results.iter().filter(|r| r.was_repaired).count();
        tracing::info!(
            target: "filecheck.verify",
            records = results.len(),
            existing,
            invalid,
            repaired,
            duplicates,
            excluded_hosts = ctx.ledger().len(),
            "verification run completed"
        );
        results
    }

    fn verify_partitioned(
        &self,
        ctx: &RunContext,
        records: &[FileRecord],
        workers: usize,
    ) -> Vec<VerificationResult> {
        let mut groups = BTreeMap::<String, Vec<usize>>::new();
        for (idx, record) in records.iter().enumerate() {
            groups.entry(record.normalized_host()).or_default().push(idx);
        }
        let groups = groups.into_values().collect::<Vec<_>>();
        let next_group = AtomicUsize::new(0);
        let workers = workers.min(groups.len()).max(1);
        let (groups, next_group) = (&groups, &next_group);

        let mut indexed = thread::scope(|scope| {
            let handles = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut out = Vec::<(usize, VerificationResult)>::new();
                        loop {
                            let g = next_group.fetch_add(1, Ordering::Relaxed);
                            let Some(group) = groups.get(g) else {
                                break;
                            };
                            for &idx in group {
                                out.push((idx, self.verify(ctx, &records[idx])));
                            }
                        }
                        out
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(v) => v,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Vec<_>>()
        });

        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, r)| r).collect()
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("settings", &self.settings)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}
