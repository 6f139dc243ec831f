//! CSV input rows and NDJSON result lines.

use std::io::Write;
use std::path::{Path, PathBuf};

use filecheck_domain::{
    FileRecord, RepairOutcome, Settings, VerificationResult, VersionOutcome,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InputError {
    #[error("input file {} could not be read: {source}", .path.display())]
    Open { path: PathBuf, source: csv::Error },
    #[error("required column {name:?} missing from input header")]
    MissingColumn { name: String },
    #[error("input row {row} could not be read: {source}")]
    Row { row: u64, source: csv::Error },
}

struct ColumnIndex {
    platform: usize,
    file_path: usize,
    host_name: usize,
    cve: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

fn require_column(headers: &csv::StringRecord, name: &str) -> Result<usize, InputError> {
    find_column(headers, name).ok_or_else(|| InputError::MissingColumn {
        name: name.to_string(),
    })
}

/// Reads every data row; row numbers start at 1 after the header.
pub(crate) fn read_records(path: &Path, settings: &Settings) -> Result<Vec<FileRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let columns = &settings.columns;
    let index = ColumnIndex {
        platform: require_column(&headers, &columns.platform)?,
        file_path: require_column(&headers, &columns.file_path)?,
        host_name: require_column(&headers, &columns.host_name)?,
        cve: match columns.cve.as_deref() {
            Some(name) => {
                let found = find_column(&headers, name);
                if found.is_none() {
                    tracing::warn!(
                        target: "filecheck.cli",
                        column = name,
                        "cve column not found; duplicate keys ignore it"
                    );
                }
                found
            }
            None => None,
        },
    };

    let mut out = Vec::new();
    for (idx, row) in reader.byte_records().enumerate() {
        let row_no = idx as u64 + 1;
        let row = row.map_err(|source| InputError::Row {
            row: row_no,
            source,
        })?;
        // Undecodable bytes become U+FFFD; the record still gets verified.
        let field = |i: usize| String::from_utf8_lossy(row.get(i).unwrap_or(b"")).into_owned();
        if std::str::from_utf8(row.as_slice()).is_err() {
            tracing::warn!(
                target: "filecheck.cli",
                row = row_no,
                "row is not valid UTF-8; invalid bytes replaced"
            );
        }
        let mut record = FileRecord::new(
            row_no,
            field(index.file_path),
            field(index.host_name),
            field(index.platform),
            &settings.windows_platforms,
        );
        if let Some(i) = index.cve {
            record = record.with_cve(field(i));
        }
        out.push(record);
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
struct ReasonLine<'a> {
    code: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ResultLine<'a> {
    row: u64,
    host_name: &'a str,
    platform: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cve: Option<&'a str>,
    file_path: &'a str,
    route: &'static str,
    original_exists: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<ReasonLine<'a>>,
    repaired_path: &'a str,
    was_repaired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    repaired_exists: Option<&'static str>,
    metadata_source: Option<&'static str>,
    modification_time: Option<&'a str>,
    version: Option<&'a str>,
    scanned_at: Option<&'a str>,
    local_error: Option<&'a str>,
    remote_error: Option<&'a str>,
    host_excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duplicate: Option<bool>,
}

impl<'a> ResultLine<'a> {
    fn new(record: &'a FileRecord, result: &'a VerificationResult) -> Self {
        Self {
            row: result.row,
            host_name: &record.host_name,
            platform: &record.platform_label,
            cve: record.cve.as_deref(),
            file_path: &record.raw_path,
            route: result.route.as_str(),
            original_exists: result.original_exists.as_str(),
            invalid_reason: result.invalid_reason.as_ref().map(|r| ReasonLine {
                code: r.code.as_str(),
                message: &r.message,
            }),
            repaired_path: &result.repaired_path,
            was_repaired: result.was_repaired,
            repaired_exists: result.repaired_exists.map(|s| s.as_str()),
            metadata_source: result.metadata_source.map(|s| s.as_str()),
            modification_time: result.modification_time.as_deref(),
            version: result.version.as_deref(),
            scanned_at: result.scanned_at.as_deref(),
            local_error: result.local_error.as_deref(),
            remote_error: result.remote_error.as_deref(),
            host_excluded: result.host_excluded,
            unique_id: result.unique_id.map(|k| k.to_hex()),
            duplicate: result.duplicate,
        }
    }
}

/// One JSON object per line, in the order given.
pub(crate) fn write_results<W: Write>(
    mut out: W,
    records: &[FileRecord],
    results: &[VerificationResult],
) -> std::io::Result<()> {
    for (record, result) in records.iter().zip(results) {
        serde_json::to_writer(&mut out, &ResultLine::new(record, result))?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[derive(Debug, Serialize)]
pub(crate) struct RepairLine<'a> {
    path: &'a str,
    repaired_path: &'a str,
    was_repaired: bool,
    invalid_reason: Option<ReasonLine<'a>>,
}

impl<'a> RepairLine<'a> {
    pub(crate) fn new(path: &'a str, outcome: &'a RepairOutcome) -> Self {
        Self {
            path,
            repaired_path: &outcome.repaired_path,
            was_repaired: outcome.was_repaired,
            invalid_reason: outcome.invalid_reason.as_ref().map(|r| ReasonLine {
                code: r.code.as_str(),
                message: &r.message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VersionLine<'a> {
    file: &'a str,
    kind: Option<&'static str>,
    version: Option<&'a str>,
    error: Option<ReasonLine<'a>>,
}

impl<'a> VersionLine<'a> {
    pub(crate) fn new(file: &'a str, kind: Option<&'static str>, outcome: &'a VersionOutcome) -> Self {
        Self {
            file,
            kind,
            version: outcome.version.as_deref(),
            error: outcome.error.as_ref().map(|r| ReasonLine {
                code: r.code.as_str(),
                message: &r.message,
            }),
        }
    }
}
