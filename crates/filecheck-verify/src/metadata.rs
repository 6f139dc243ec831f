use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use filecheck_domain::{Failure, ReasonCode, VersionOutcome};
use filecheck_extract::ExtractorRegistry;
use filecheck_probe::Filesystem;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Metadata {
    pub modified: Option<String>,
    pub version: VersionOutcome,
    pub errors: Vec<Failure>,
}

pub(crate) fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

/// Modification time and version of an existing regular file.
pub(crate) fn read_metadata(
    fs: &dyn Filesystem,
    registry: &ExtractorRegistry,
    path: &Path,
    is_windows: bool,
) -> Metadata {
    let mut out = Metadata::default();

    match fs.modified(path) {
        Ok(time) => out.modified = Some(format_timestamp(time)),
        Err(err) => out.errors.push(Failure::new(
            ReasonCode::ReadError,
            format!("modification time unavailable: {err}"),
        )),
    }

    let Some(kind) = registry.classify(&path.to_string_lossy(), is_windows) else {
        return out;
    };
    out.version = match fs.open(path) {
        Ok(mut source) => registry.extract_by_kind(kind, source.as_mut()),
        Err(err) => VersionOutcome::failed(Failure::new(
            ReasonCode::ReadError,
            format!("error reading file: {err}"),
        )),
    };
    if let Some(err) = &out.version.error {
        out.errors.push(err.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn modified_time_uses_second_precision_local_format() {
        let local = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("unambiguous local time");
        let system: SystemTime = local.into();
        assert_eq!(format_timestamp(system), "2024-03-09 07:05:01");
    }
}
