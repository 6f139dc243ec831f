use std::io::Cursor;

use filecheck_domain::ScanLimits;
use filecheck_extract::{ArtifactKind, ExtractorRegistry, main_attributes, scan_attribute};
use proptest::prelude::*;

fn registry() -> ExtractorRegistry {
    ExtractorRegistry::new(
        vec![".jar".to_string()],
        ScanLimits {
            pe_scan_chunk_bytes: 64,
            max_manifest_bytes: 4096,
        },
    )
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic_either_extractor(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let r = registry();
        let jar = r.extract_by_kind(ArtifactKind::Archive, &mut Cursor::new(bytes.clone()));
        prop_assert!(jar.version.is_some() || jar.error.is_some());
        let pe = r.extract_by_kind(ArtifactKind::Executable, &mut Cursor::new(bytes));
        prop_assert!(pe.version.is_some() || pe.error.is_some());
    }

    #[test]
    fn manifest_parsers_accept_any_text(text in "(?s).{0,512}") {
        let _ = main_attributes(&text);
        let _ = scan_attribute(&text, "Implementation-Version");
    }

    #[test]
    fn reported_pe_versions_are_never_zero(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let out = registry().extract_by_kind(ArtifactKind::Executable, &mut Cursor::new(bytes));
        prop_assert_ne!(out.version.as_deref(), Some("0.0.0.0"));
    }
}
