use filecheck_domain::{Failure, ReasonCode, VersionOutcome};
use filecheck_extract::ExtractorRegistry;
use filecheck_paths::PathRepairer;
use filecheck_probe::{Filesystem, OsFilesystem};

use super::*;
use crate::records::{RepairLine, VersionLine};

pub(super) fn cmd_repair(exe: &str, args: &[String]) -> ExitCode {
    if wants_help(args) {
        print_repair_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_repair_args(args) {
        Ok(p) => p,
        Err(msg) => return exit_usage(exe, &msg, print_repair_help),
    };
    init_subscriber(Verbosity::Normal);

    let settings = match load_settings(parsed.config.as_deref()) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let outcome = PathRepairer::new(settings.repair).repair(&parsed.path, parsed.windows);
    print_json(&RepairLine::new(&parsed.path, &outcome))
}

pub(super) fn cmd_version(exe: &str, args: &[String]) -> ExitCode {
    if wants_help(args) {
        print_version_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_version_args(args) {
        Ok(p) => p,
        Err(msg) => return exit_usage(exe, &msg, print_version_help),
    };
    init_subscriber(Verbosity::Normal);

    let settings = match load_settings(parsed.config.as_deref()) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let registry = ExtractorRegistry::from_settings(&settings);
    let file = parsed.file.to_string_lossy();
    let kind = registry.classify(&file, parsed.windows);
    let outcome = match kind {
        None => VersionOutcome::not_applicable(),
        Some(kind) => match OsFilesystem.open(&parsed.file) {
            Ok(mut source) => registry.extract_by_kind(kind, source.as_mut()),
            Err(err) => VersionOutcome::failed(Failure::new(
                ReasonCode::ReadError,
                format!("error reading file: {err}"),
            )),
        },
    };

    print_json(&VersionLine::new(&file, kind.map(|k| k.as_str()), &outcome))
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string(value) {
        Ok(line) => {
            println!("{line}");
            ExitCode::from(EXIT_OK)
        }
        Err(err) => exit_fatal(&format!("output could not be encoded: {err}")),
    }
}
