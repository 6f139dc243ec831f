use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant, SystemTime};

use filecheck_domain::{ByteSource, EntryKind, Existence, ReasonCode};
use filecheck_probe::{Filesystem, Inspection, RemoteProbe};

enum Behaviour {
    Found,
    Absent,
    Ambiguous,
    Hang,
    Fail,
}

struct ScriptedFs {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl ScriptedFs {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Filesystem for ScriptedFs {
    fn inspect(&self, _path: &Path) -> io::Result<Inspection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Found => Ok(Inspection::found(EntryKind::File)),
            Behaviour::Absent => Ok(Inspection::absent()),
            Behaviour::Ambiguous => Ok(Inspection::ambiguous()),
            Behaviour::Hang => {
                std::thread::sleep(Duration::from_secs(5));
                Ok(Inspection::found(EntryKind::File))
            }
            Behaviour::Fail => Err(io::Error::other("network name is no longer available")),
        }
    }

    fn modified(&self, _path: &Path) -> io::Result<SystemTime> {
        Ok(SystemTime::UNIX_EPOCH)
    }

    fn open(&self, _path: &Path) -> io::Result<Box<dyn ByteSource>> {
        Ok(Box::new(io::Cursor::new(Vec::<u8>::new())))
    }
}

const UNC: &str = "\\\\SRV01\\C$\\apps\\tool.exe";

#[test]
fn definitive_answers_pass_through() {
    let probe = RemoteProbe::new(ScriptedFs::new(Behaviour::Found), Duration::from_secs(5));
    let out = probe.probe(UNC);
    assert_eq!(out.existence, Existence::Exists);
    assert!(out.is_regular_file());

    let probe = RemoteProbe::new(ScriptedFs::new(Behaviour::Absent), Duration::from_secs(5));
    let out = probe.probe(UNC);
    assert_eq!(out.existence, Existence::Missing);
    assert_eq!(out.error, None);
}

#[test]
fn disagreeing_predicates_are_access_denied() {
    let probe = RemoteProbe::new(ScriptedFs::new(Behaviour::Ambiguous), Duration::from_secs(5));
    let out = probe.probe(UNC);
    assert_eq!(out.existence, Existence::Indeterminate);
    let err = out.error.expect("error");
    assert_eq!(err.code, ReasonCode::AccessDenied);
    assert!(err.code.excludes_host());
}

#[test]
fn filesystem_errors_are_remote_failures() {
    let probe = RemoteProbe::new(ScriptedFs::new(Behaviour::Fail), Duration::from_secs(5));
    let out = probe.probe(UNC);
    assert_eq!(out.existence, Existence::Indeterminate);
    let err = out.error.expect("error");
    assert_eq!(err.code, ReasonCode::ProbeFailed);
    assert!(err.message.contains("no longer available"));
}

#[test]
fn hanging_filesystem_is_bounded_by_the_timeout() {
    let fs = ScriptedFs::new(Behaviour::Hang);
    let probe = RemoteProbe::new(fs.clone(), Duration::from_millis(100));

    let started = Instant::now();
    let out = probe.probe(UNC);
    assert!(started.elapsed() < Duration::from_secs(3));

    assert_eq!(out.existence, Existence::Indeterminate);
    let err = out.error.expect("error");
    assert_eq!(err.code, ReasonCode::Timeout);
    assert!(err.message.starts_with("timeout"));
    assert_eq!(fs.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn bounded_run_reports_timeout_for_metadata_work() {
    let probe = RemoteProbe::new(ScriptedFs::new(Behaviour::Found), Duration::from_millis(50));
    let err = probe
        .run(|_fs| std::thread::sleep(Duration::from_secs(3)))
        .unwrap_err();
    assert_eq!(err.code, ReasonCode::Timeout);
}
