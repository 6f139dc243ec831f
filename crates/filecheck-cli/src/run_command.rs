use std::fs::OpenOptions;
use std::io::BufWriter;

use filecheck_domain::ExistenceStatus;
use filecheck_verify::{RunContext, Verifier};

use super::*;
use crate::records::{InputError, read_records, write_results};

const UNKNOWN_HOST: &str = "UNKNOWN_HOST";

pub(super) fn cmd_run(exe: &str, args: &[String]) -> ExitCode {
    if wants_help(args) {
        print_run_help(exe);
        return ExitCode::from(EXIT_OK);
    }

    let parsed = match parse_run_args(args) {
        Ok(p) => p,
        Err(msg) => return exit_usage(exe, &msg, print_run_help),
    };
    if let Err(msg) = validate_run_args(&parsed) {
        return exit_usage(exe, &msg, print_run_help);
    }

    init_subscriber(Verbosity::from_flags(parsed.verbose, parsed.quiet));

    let mut settings = match load_settings(Some(&parsed.config)) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    apply_overrides(&mut settings, parsed.timeout_secs);

    let records = match read_records(&parsed.input, &settings) {
        Ok(r) => r,
        Err(err @ InputError::MissingColumn { .. }) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_MISSING_COLUMN);
        }
        Err(err) => return exit_fatal(&err.to_string()),
    };

    let output = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&parsed.output)
    {
        Ok(f) => BufWriter::new(f),
        Err(err) => {
            return exit_fatal(&format!(
                "output file {} could not be created: {err}",
                parsed.output.display()
            ));
        }
    };

    let local_host = parsed.local_host.clone().unwrap_or_else(resolve_local_host);
    let ctx = RunContext::new(&local_host);
    tracing::info!(
        target: "filecheck.cli",
        records = records.len(),
        local_host = ctx.local_host(),
        workers = parsed.max_workers,
        timeout_secs = settings.remote_timeout.as_secs(),
        "run started"
    );

    let verifier = Verifier::with_os_filesystem(settings);
    let results = verifier.verify_all(&ctx, &records, parsed.max_workers);

    if let Err(err) = write_results(output, &records, &results) {
        return exit_fatal(&format!(
            "results could not be written to {}: {err}",
            parsed.output.display()
        ));
    }

    let count = |status: ExistenceStatus| {
        results
            .iter()
            .filter(|r| r.original_exists == status)
            .count()
    };
    println!(
        "verified {} records: {} present, {} missing, {} unknown, {} invalid, {} repaired, {} hosts excluded",
        results.len(),
        count(ExistenceStatus::Yes),
        count(ExistenceStatus::No),
        count(ExistenceStatus::Unknown),
        count(ExistenceStatus::Invalid),
        results.iter().filter(|r| r.was_repaired).count(),
        ctx.ledger().len(),
    );
    for (host, reason) in ctx.ledger().snapshot() {
        println!("excluded host {host}: {reason}");
    }

    ExitCode::from(EXIT_OK)
}

/// `COMPUTERNAME`, then `HOSTNAME`, then `/etc/hostname`.
fn resolve_local_host() -> String {
    ["COMPUTERNAME", "HOSTNAME"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}
