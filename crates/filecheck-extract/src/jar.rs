use filecheck_domain::{ByteSource, Failure, ReasonCode, VersionOutcome};

use crate::manifest::{lookup, main_attributes, scan_attribute};
use crate::{Extractor, read_to_end_bounded};

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
const IMPLEMENTATION_VERSION: &str = "Implementation-Version";
const BUNDLE_VERSION: &str = "Bundle-Version";

#[derive(Debug, Clone, Copy)]
pub struct JarExtractor {
    max_manifest_bytes: u64,
}

impl JarExtractor {
    pub fn new(max_manifest_bytes: u64) -> Self {
        Self { max_manifest_bytes }
    }

    fn read_manifest(&self, source: &mut dyn ByteSource) -> Result<String, Failure> {
        let mut archive = zip::ZipArchive::new(source).map_err(|err| {
            Failure::new(
                ReasonCode::ArchiveError,
                format!("not a readable archive: {err}"),
            )
        })?;

        let mut entry = match archive.by_name(MANIFEST_PATH) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(Failure::new(ReasonCode::NoManifest, "no manifest"));
            }
            Err(err) => {
                return Err(Failure::new(
                    ReasonCode::ArchiveError,
                    format!("manifest entry could not be opened: {err}"),
                ));
            }
        };

        let bytes = read_to_end_bounded(&mut entry, self.max_manifest_bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Extractor for JarExtractor {
    fn id(&self) -> &'static str {
        "extract.jar.v1"
    }

    fn extract(&self, source: &mut dyn ByteSource) -> VersionOutcome {
        let text = match self.read_manifest(source) {
            Ok(v) => v,
            Err(failure) => return VersionOutcome::failed(failure),
        };

        let attrs = main_attributes(&text).unwrap_or_default();
        if let Some(v) = lookup(&attrs, IMPLEMENTATION_VERSION) {
            return VersionOutcome::found(v);
        }
        if let Some(v) = scan_attribute(&text, IMPLEMENTATION_VERSION) {
            return VersionOutcome::found(v);
        }
        if let Some(v) = lookup(&attrs, BUNDLE_VERSION) {
            return VersionOutcome::found(v);
        }
        if let Some(v) = scan_attribute(&text, BUNDLE_VERSION) {
            return VersionOutcome::found(v);
        }

        VersionOutcome::failed(Failure::new(
            ReasonCode::NoVersion,
            "no Implementation-Version or Bundle-Version in manifest",
        ))
    }
}
