use std::io::Read;

use filecheck_domain::{ByteSource, Failure, ReasonCode, ScanLimits, Settings, VersionOutcome};

mod jar;
mod manifest;
mod pe;

pub use jar::JarExtractor;
pub use manifest::{ManifestError, main_attributes, scan_attribute};
pub use pe::{FileVersion, PeExtractor, scan_fixed_file_version};

pub trait Extractor {
    fn id(&self) -> &'static str;

    fn extract(&self, source: &mut dyn ByteSource) -> VersionOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Archive,
    Executable,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "ARCHIVE",
            Self::Executable => "EXECUTABLE",
        }
    }
}

/// Picks the version extractor for a path by its file name.
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    archive_extensions: Vec<String>,
    jar: JarExtractor,
    pe: PeExtractor,
}

impl ExtractorRegistry {
    pub fn new(archive_extensions: Vec<String>, limits: ScanLimits) -> Self {
        Self {
            archive_extensions: archive_extensions
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            jar: JarExtractor::new(limits.max_manifest_bytes),
            pe: PeExtractor::new(limits.pe_scan_chunk_bytes),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.archive_extensions.clone(), settings.limits)
    }

    /// `None` means no version extraction applies to this file.
    pub fn classify(&self, path: &str, is_windows: bool) -> Option<ArtifactKind> {
        let name = file_name(path).to_ascii_lowercase();
        if self
            .archive_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
        {
            return Some(ArtifactKind::Archive);
        }
        if is_windows && name.ends_with(".exe") {
            return Some(ArtifactKind::Executable);
        }
        None
    }

    fn extractor_for(&self, kind: ArtifactKind) -> &dyn Extractor {
        match kind {
            ArtifactKind::Archive => &self.jar,
            ArtifactKind::Executable => &self.pe,
        }
    }

    pub fn extract_by_kind(&self, kind: ArtifactKind, source: &mut dyn ByteSource) -> VersionOutcome {
        let extractor = self.extractor_for(kind);
        let outcome = extractor.extract(source);
        tracing::debug!(
            target: "filecheck.extract",
            extractor = extractor.id(),
            kind = kind.as_str(),
            version = outcome.version.as_deref().unwrap_or(""),
            error = outcome.error.as_ref().map(|e| e.code.as_str()).unwrap_or(""),
            "version extraction completed"
        );
        outcome
    }
}

fn file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

fn read_to_end_bounded<R: Read + ?Sized>(reader: &mut R, max_bytes: u64) -> Result<Vec<u8>, Failure> {
    let mut out = Vec::<u8>::new();
    let mut total = 0_u64;
    let mut buf = [0_u8; 16 * 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(Failure::new(
                    ReasonCode::ArchiveError,
                    format!("manifest could not be read: {err}"),
                ));
            }
        };
        if n == 0 {
            break;
        }

        total = total.saturating_add(n as u64);
        if total > max_bytes {
            return Err(Failure::new(
                ReasonCode::ArchiveError,
                format!("manifest exceeds {max_bytes} bytes"),
            ));
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExtractorRegistry {
        ExtractorRegistry::new(vec![".jar".to_string(), ".WAR".to_string()], ScanLimits::default())
    }

    #[test]
    fn classification_uses_the_file_name() {
        let r = registry();
        assert_eq!(r.classify("C:\\lib\\Core.JAR", false), Some(ArtifactKind::Archive));
        assert_eq!(r.classify("/srv/app.war", false), Some(ArtifactKind::Archive));
        assert_eq!(r.classify("\\\\h\\C$\\a\\tool.EXE", true), Some(ArtifactKind::Executable));
        assert_eq!(r.classify("/opt/tool.exe", false), None);
        assert_eq!(r.classify("/opt/readme.txt", true), None);
        assert_eq!(r.classify("/opt/jar.d/file", true), None);
    }

    #[test]
    fn each_kind_has_its_own_extractor() {
        let r = registry();
        assert_eq!(r.extractor_for(ArtifactKind::Archive).id(), "extract.jar.v1");
        assert_eq!(r.extractor_for(ArtifactKind::Executable).id(), "extract.pe.v1");
    }

    #[test]
    fn bounded_read_rejects_oversized_input() {
        let data = vec![b'a'; 100];
        let err = read_to_end_bounded(&mut data.as_slice(), 99).unwrap_err();
        assert_eq!(err.code, ReasonCode::ArchiveError);
        let ok = read_to_end_bounded(&mut data.as_slice(), 100).expect("within bound");
        assert_eq!(ok.len(), 100);
    }
}
