use std::collections::HashSet;

use filecheck_domain::{FileRecord, RecordKey, VerificationResult, compute_record_key};

/// Key for a verified record: the repaired path counts when one was produced.
pub fn record_key(record: &FileRecord, result: &VerificationResult) -> RecordKey {
    let path = if result.was_repaired {
        result.repaired_path.as_str()
    } else {
        record.raw_path.as_str()
    };
    compute_record_key(&record.host_name, record.cve.as_deref(), path)
}

#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashSet<RecordKey>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` was already observed.
    pub fn observe(&mut self, key: RecordKey) -> bool {
        !self.seen.insert(key)
    }
}

/// Sets `unique_id` and `duplicate` on results given in row order.
pub fn mark_duplicates(records: &[FileRecord], results: &mut [VerificationResult]) -> usize {
    let mut tracker = DuplicateTracker::new();
    let mut duplicates = 0;
    for (record, result) in records.iter().zip(results.iter_mut()) {
        let key = record_key(record, result);
        let dup = tracker.observe(key);
        if dup {
            duplicates += 1;
        }
        result.unique_id = Some(key);
        result.duplicate = Some(dup);
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use filecheck_domain::{PlatformSet, Route};

    use super::*;

    #[test]
    fn repeated_triples_are_flagged_after_the_first() {
        let platforms = PlatformSet::new(["Windows"]);
        let records = vec![
            FileRecord::new(1, "C:\\a.jar", "SRV1", "Windows", &platforms).with_cve("CVE-1"),
            FileRecord::new(2, "c:\\A.JAR", "srv1", "Windows", &platforms).with_cve("cve-1"),
            FileRecord::new(3, "C:\\a.jar", "SRV1", "Windows", &platforms).with_cve("CVE-2"),
        ];
        let mut results = records
            .iter()
            .map(|r| VerificationResult::new(r.row, Route::Remote, &r.raw_path))
            .collect::<Vec<_>>();

        assert_eq!(mark_duplicates(&records, &mut results), 1);
        assert_eq!(results[0].duplicate, Some(false));
        assert_eq!(results[1].duplicate, Some(true));
        assert_eq!(results[2].duplicate, Some(false));
        assert_eq!(results[0].unique_id, results[1].unique_id);
    }

    #[test]
    fn repaired_path_feeds_the_key() {
        let platforms = PlatformSet::new(["Windows"]);
        let a = FileRecord::new(1, "C:\\a.exe junk", "h", "Windows", &platforms);
        let b = FileRecord::new(2, "C:\\a.exe", "h", "Windows", &platforms);

        let mut ra = VerificationResult::new(1, Route::Local, &a.raw_path);
        ra.repaired_path = "C:\\a.exe".to_string();
        ra.was_repaired = true;
        let rb = VerificationResult::new(2, Route::Local, &b.raw_path);

        assert_eq!(record_key(&a, &ra), record_key(&b, &rb));
    }
}
