use blake3::Hasher;

use crate::{Digest32, RecordKey};

/// Key over `lower(host) | upper(cve) | lower(path)`. A missing CVE hashes as
/// the empty string.
pub fn compute_record_key(host: &str, cve: Option<&str>, path: &str) -> RecordKey {
    let mut hasher = Hasher::new();
    hasher.update(host.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(cve.unwrap_or("").trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(path.trim().to_lowercase().as_bytes());
    RecordKey::from_digest(Digest32::from_bytes(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_ignores_case_of_host_cve_and_path() {
        let a = compute_record_key("SRV01", Some("cve-2021-44228"), "C:\\App\\Log4j.jar");
        let b = compute_record_key("srv01 ", Some("CVE-2021-44228"), "c:\\app\\log4j.jar");
        assert_eq!(a, b);
    }

    #[test]
    fn record_key_separates_fields() {
        let a = compute_record_key("ab", Some("c"), "d");
        let b = compute_record_key("a", Some("bc"), "d");
        assert_ne!(a, b);
    }

    #[test]
    fn missing_cve_equals_blank_cve() {
        assert_eq!(
            compute_record_key("h", None, "p"),
            compute_record_key("h", Some(""), "p")
        );
    }
}
