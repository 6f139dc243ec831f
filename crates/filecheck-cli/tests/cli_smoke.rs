use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use zip::write::FileOptions;

fn filecheck_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_filecheck"))
}

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(label: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "filecheck_cli_smoke_{}_{}",
            std::process::id(),
            label.replace(['\\', '/', ':'], "_")
        ));

        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    fn join(&self, rel: &str) -> PathBuf {
        self.path.join(rel)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn write_jar(path: &Path, version: &str) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::<u8>::new()));
    writer
        .start_file("META-INF/MANIFEST.MF", FileOptions::default())
        .expect("start manifest");
    writer
        .write_all(format!("Manifest-Version: 1.0\r\nImplementation-Version: {version}\r\n").as_bytes())
        .expect("write manifest");
    let bytes = writer.finish().expect("finish jar").into_inner();
    std::fs::write(path, bytes).expect("write jar");
}

fn stdout_json(out: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&out.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout is one JSON object")
}

#[test]
fn help_is_available() {
    let out = filecheck_cmd().arg("--help").output().expect("run filecheck --help");
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("filecheck"));
    assert!(stdout.contains("USAGE:"));
}

#[test]
fn unknown_command_is_usage_error() {
    let out = filecheck_cmd().arg("scan").output().expect("run filecheck scan");
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn run_missing_flags_is_usage_error() {
    let out = filecheck_cmd().arg("run").output().expect("run filecheck run");
    assert_eq!(out.status.code(), Some(3));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing required flag: --input"));
}

#[test]
fn run_rejects_zero_workers() {
    let out = filecheck_cmd()
        .args(["run", "--input", "a.csv", "--config", "c.json", "--output", "o", "--max-workers", "0"])
        .output()
        .expect("run filecheck run");
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn repair_prints_repaired_path() {
    let out = filecheck_cmd()
        .args(["repair", "--path", "C:\\apps\\tool.exe some_junk", "--windows", "true"])
        .output()
        .expect("run filecheck repair");
    assert_eq!(out.status.code(), Some(0));

    let v = stdout_json(&out);
    assert_eq!(v["repaired_path"], "C:\\apps\\tool.exe");
    assert_eq!(v["was_repaired"], true);
    assert!(v["invalid_reason"].is_null());
}

#[test]
fn repair_reports_placeholder() {
    let out = filecheck_cmd()
        .args(["repair", "--path", "n/a"])
        .output()
        .expect("run filecheck repair");
    assert_eq!(out.status.code(), Some(0));

    let v = stdout_json(&out);
    assert_eq!(v["invalid_reason"]["code"], "PLACEHOLDER_PATH");
}

#[test]
fn version_reads_jar_manifest() {
    let dir = TestDir::new("version_jar");
    let jar = dir.join("app.jar");
    write_jar(&jar, "3.1.4");

    let out = filecheck_cmd()
        .arg("version")
        .arg("--file")
        .arg(&jar)
        .output()
        .expect("run filecheck version");
    assert_eq!(out.status.code(), Some(0));

    let v = stdout_json(&out);
    assert_eq!(v["kind"], "ARCHIVE");
    assert_eq!(v["version"], "3.1.4");
    assert!(v["error"].is_null());
}

#[test]
fn version_skips_exe_off_windows() {
    let dir = TestDir::new("version_exe");
    let exe = dir.join("tool.exe");
    std::fs::write(&exe, b"MZ").expect("write exe");

    let out = filecheck_cmd()
        .arg("version")
        .arg("--file")
        .arg(&exe)
        .output()
        .expect("run filecheck version");
    assert_eq!(out.status.code(), Some(0));

    let v = stdout_json(&out);
    assert!(v["kind"].is_null());
    assert!(v["version"].is_null());

    let out = filecheck_cmd()
        .arg("version")
        .arg("--file")
        .arg(&exe)
        .args(["--windows", "true"])
        .output()
        .expect("run filecheck version");
    let v = stdout_json(&out);
    assert_eq!(v["kind"], "EXECUTABLE");
    assert_eq!(v["error"]["code"], "NO_VERSION");
    assert_eq!(v["error"]["message"], "no version info found");
    assert!(dir.path().exists());
}

#[test]
fn version_of_missing_file_is_usage_error() {
    let dir = TestDir::new("version_missing");
    let out = filecheck_cmd()
        .arg("version")
        .arg("--file")
        .arg(dir.join("absent.jar"))
        .output()
        .expect("run filecheck version");
    assert_eq!(out.status.code(), Some(3));
}
