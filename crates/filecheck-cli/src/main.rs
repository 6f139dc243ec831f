use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use filecheck_domain::Settings;

mod inspect_command;
mod records;
mod run_command;
mod tracing_setup;

use tracing_setup::{Verbosity, init_subscriber};

const EXIT_OK: u8 = 0;
const EXIT_FATAL: u8 = 1;
const EXIT_MISSING_COLUMN: u8 = 2;
const EXIT_USAGE: u8 = 3;

fn main() -> ExitCode {
    let mut args = std::env::args().collect::<Vec<String>>();
    let exe = args
        .first()
        .cloned()
        .unwrap_or_else(|| "filecheck".to_string());
    if !args.is_empty() {
        args.remove(0);
    }

    if args.is_empty() || args[0] == "-h" || args[0] == "--help" {
        print_root_help(&exe);
        return ExitCode::from(EXIT_OK);
    }

    match args[0].as_str() {
        "run" => run_command::cmd_run(&exe, &args[1..]),
        "repair" => inspect_command::cmd_repair(&exe, &args[1..]),
        "version" => inspect_command::cmd_version(&exe, &args[1..]),
        other => {
            eprintln!("error: unknown command: {other}");
            eprintln!();
            print_root_help(&exe);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn exit_usage(exe: &str, message: &str, help: fn(&str)) -> ExitCode {
    eprintln!("error: {message}");
    eprintln!();
    help(exe);
    ExitCode::from(EXIT_USAGE)
}

fn exit_fatal(message: &str) -> ExitCode {
    tracing::error!(target: "filecheck.cli", error = message, "run aborted");
    eprintln!("error: {message}");
    ExitCode::from(EXIT_FATAL)
}

fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "-h" || a == "--help")
}

#[derive(Debug)]
struct RunArgs {
    input: PathBuf,
    config: PathBuf,
    output: PathBuf,
    local_host: Option<String>,
    timeout_secs: Option<u64>,
    max_workers: usize,
    verbose: bool,
    quiet: bool,
}

fn parse_run_args(args: &[String]) -> Result<RunArgs, String> {
    let mut input = None;
    let mut config = None;
    let mut output = None;
    let mut local_host = None;
    let mut timeout_secs = None;
    let mut max_workers = 1;
    let mut verbose = false;
    let mut quiet = false;

    let mut i = 0;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--input" => {
                i += 1;
                input = Some(PathBuf::from(require_value(args, i, "--input")?));
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(require_value(args, i, "--config")?));
            }
            "--output" => {
                i += 1;
                output = Some(PathBuf::from(require_value(args, i, "--output")?));
            }
            "--local-host" => {
                i += 1;
                let raw = require_value(args, i, "--local-host")?;
                if raw.trim().is_empty() {
                    return Err("--local-host must not be blank".to_string());
                }
                local_host = Some(raw.trim().to_string());
            }
            "--timeout-secs" => {
                i += 1;
                let raw = require_value(args, i, "--timeout-secs")?;
                timeout_secs = Some(parse_positive("--timeout-secs", raw)?);
            }
            "--max-workers" => {
                i += 1;
                let raw = require_value(args, i, "--max-workers")?;
                let parsed = parse_positive("--max-workers", raw)?;
                max_workers = usize::try_from(parsed)
                    .map_err(|_| "--max-workers is too large".to_string())?;
            }
            "-v" | "--verbose" => verbose = true,
            "-q" | "--quiet" => quiet = true,
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown flag: {unknown}"));
            }
            other => {
                return Err(format!("unexpected argument: {other}"));
            }
        }
        i += 1;
    }

    Ok(RunArgs {
        input: input.ok_or_else(|| "missing required flag: --input".to_string())?,
        config: config.ok_or_else(|| "missing required flag: --config".to_string())?,
        output: output.ok_or_else(|| "missing required flag: --output".to_string())?,
        local_host,
        timeout_secs,
        max_workers,
        verbose,
        quiet,
    })
}

fn validate_run_args(args: &RunArgs) -> Result<(), String> {
    ensure_file_exists(&args.input, "input")?;
    ensure_file_exists(&args.config, "config")?;
    ensure_output_absent(&args.output)?;
    Ok(())
}

#[derive(Debug)]
struct RepairArgs {
    path: String,
    windows: bool,
    config: Option<PathBuf>,
}

fn parse_repair_args(args: &[String]) -> Result<RepairArgs, String> {
    let mut path = None;
    let mut windows = false;
    let mut config = None;

    let mut i = 0;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--path" => {
                i += 1;
                // Paths may legitimately be blank or start with dashes here.
                let value = args
                    .get(i)
                    .ok_or_else(|| "missing value for --path".to_string())?;
                path = Some(value.clone());
            }
            "--windows" => {
                i += 1;
                windows = parse_bool_flag("--windows", require_value(args, i, "--windows")?)?;
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(require_value(args, i, "--config")?));
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown flag: {unknown}"));
            }
            other => {
                return Err(format!("unexpected argument: {other}"));
            }
        }
        i += 1;
    }

    Ok(RepairArgs {
        path: path.ok_or_else(|| "missing required flag: --path".to_string())?,
        windows,
        config,
    })
}

#[derive(Debug)]
struct VersionArgs {
    file: PathBuf,
    windows: bool,
    config: Option<PathBuf>,
}

fn parse_version_args(args: &[String]) -> Result<VersionArgs, String> {
    let mut file = None;
    let mut windows = false;
    let mut config = None;

    let mut i = 0;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--file" => {
                i += 1;
                file = Some(PathBuf::from(require_value(args, i, "--file")?));
            }
            "--windows" => {
                i += 1;
                windows = parse_bool_flag("--windows", require_value(args, i, "--windows")?)?;
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(require_value(args, i, "--config")?));
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown flag: {unknown}"));
            }
            other => {
                return Err(format!("unexpected argument: {other}"));
            }
        }
        i += 1;
    }

    let parsed = VersionArgs {
        file: file.ok_or_else(|| "missing required flag: --file".to_string())?,
        windows,
        config,
    };
    ensure_file_exists(&parsed.file, "file")?;
    Ok(parsed)
}

fn require_value<'a>(args: &'a [String], i: usize, flag: &'static str) -> Result<&'a str, String> {
    let value = args
        .get(i)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    if value.starts_with("--") {
        return Err(format!("missing value for {flag}"));
    }
    Ok(value.as_str())
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("{flag} must be 'true' or 'false'")),
    }
}

fn parse_positive(flag: &str, value: &str) -> Result<u64, String> {
    let parsed: u64 = value
        .parse()
        .map_err(|_| format!("{flag} must be a positive integer"))?;
    if parsed == 0 {
        return Err(format!("{flag} must be >= 1"));
    }
    Ok(parsed)
}

fn ensure_file_exists(path: &Path, kind: &str) -> Result<(), String> {
    let meta = std::fs::metadata(path)
        .map_err(|_| format!("{kind} path does not exist or is not accessible: {}", path.display()))?;
    if !meta.is_file() {
        return Err(format!("{kind} path must be a file: {}", path.display()));
    }
    Ok(())
}

fn ensure_output_absent(output: &Path) -> Result<(), String> {
    match std::fs::symlink_metadata(output) {
        Ok(_) => Err(format!("output path already exists: {}", output.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(_) => Err(format!("output path is not accessible: {}", output.display())),
    }
}

/// Loads `--config` when given, otherwise the built-in defaults.
fn load_settings(config: Option<&Path>) -> Result<Settings, String> {
    match config {
        Some(path) => Settings::load(path).map_err(|e| e.to_string()),
        None => Ok(Settings::default()),
    }
}

fn apply_overrides(settings: &mut Settings, timeout_secs: Option<u64>) {
    if let Some(secs) = timeout_secs {
        settings.remote_timeout = Duration::from_secs(secs);
    }
}

fn print_root_help(exe: &str) {
    println!("filecheck (file existence verification and version extraction)");
    println!();
    println!("USAGE:");
    println!("  {exe} <COMMAND> [FLAGS]");
    println!();
    println!("COMMANDS:");
    println!("  run       Verify every record of a CSV input and write NDJSON results");
    println!("  repair    Print the repair outcome for a single path");
    println!("  version   Print the embedded version of a single JAR or EXE file");
    println!();
    println!("Run '{exe} <COMMAND> --help' for command-specific help.");
}

fn print_run_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} run --input <CSV> --config <JSON> --output <NDJSON> [FLAGS]");
    println!();
    println!("REQUIRED:");
    println!("  --input <CSV>       Input records with a header row");
    println!("  --config <JSON>     Run configuration (schema_version config.v1)");
    println!("  --output <NDJSON>   Result file (must not exist)");
    println!();
    println!("OPTIONAL:");
    println!("  --local-host <NAME>   Host name treated as local (default: this machine)");
    println!("  --timeout-secs <N>    Remote probe timeout override (>= 1)");
    println!("  --max-workers <N>     Hosts verified in parallel (default: 1)");
    println!("  -v, --verbose         Debug logging on stderr");
    println!("  -q, --quiet           Errors only on stderr");
    println!();
    println!("EXIT CODES:");
    println!("  0 ok, 1 fatal I/O error, 2 required input column missing, 3 usage or config error");
}

fn print_repair_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} repair --path <PATH> [--windows true|false] [--config <JSON>]");
    println!();
    println!("  --windows true|false   Apply Windows path rules (default: false)");
}

fn print_version_help(exe: &str) {
    println!("USAGE:");
    println!("  {exe} version --file <PATH> [--windows true|false] [--config <JSON>]");
    println!();
    println!("  --windows true|false   Allow EXE version extraction (default: false)");
}
