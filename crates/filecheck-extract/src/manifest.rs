//! JAR manifest attribute parsing.
//!
//! `main_attributes` follows the manifest format strictly: the main section
//! ends at the first blank line, continuation lines start with exactly one
//! space, and every other line must be `Name: value`. `scan_attribute` is
//! the lenient fallback for manifests that break those rules.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    InvalidHeader { line: usize },
    OrphanContinuation { line: usize },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeader { line } => write!(f, "invalid manifest header on line {line}"),
            Self::OrphanContinuation { line } => {
                write!(f, "continuation without a header on line {line}")
            }
        }
    }
}

impl std::error::Error for ManifestError {}

/// Main-section attributes in file order. Names keep their original case.
pub fn main_attributes(text: &str) -> Result<Vec<(String, String)>, ManifestError> {
    let mut attrs = Vec::<(String, String)>::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.is_empty() {
            break;
        }

        if let Some(rest) = line.strip_prefix(' ') {
            let Some((_, value)) = attrs.last_mut() else {
                return Err(ManifestError::OrphanContinuation { line: line_no });
            };
            value.push_str(rest);
            continue;
        }

        let Some((name, value)) = line.split_once(": ") else {
            return Err(ManifestError::InvalidHeader { line: line_no });
        };
        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ManifestError::InvalidHeader { line: line_no });
        }
        attrs.push((name.to_string(), value.to_string()));
    }
    Ok(attrs)
}

pub(crate) fn lookup<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Line-oriented search of the whole manifest text. A line starting with a
/// space or a tab continues the previous logical line.
pub fn scan_attribute(text: &str, name: &str) -> Option<String> {
    let mut logical = Vec::<String>::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix([' ', '\t'])
            && let Some(current) = logical.last_mut()
        {
            current.push_str(rest);
            continue;
        }
        logical.push(line.to_string());
    }

    logical.iter().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if !key.trim().eq_ignore_ascii_case(name) {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_joins_space_continuations() {
        let text = "Manifest-Version: 1.0\r\nImplementation-Version: 3.2.\r\n 14-final\r\n\r\nName: a\r\n";
        let attrs = main_attributes(text).expect("valid manifest");
        assert_eq!(lookup(&attrs, "implementation-version"), Some("3.2.14-final"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn strict_parse_rejects_tab_continuation() {
        let text = "Manifest-Version: 1.0\nImplementation-Version: 2.\n\t4\n";
        assert_eq!(
            main_attributes(text),
            Err(ManifestError::InvalidHeader { line: 3 })
        );
    }

    #[test]
    fn strict_parse_stops_at_main_section_end() {
        let text = "Manifest-Version: 1.0\n\nName: x\nImplementation-Version: 9\n";
        let attrs = main_attributes(text).expect("valid manifest");
        assert_eq!(lookup(&attrs, "Implementation-Version"), None);
    }

    #[test]
    fn lenient_scan_accepts_tabs_and_later_sections() {
        let text = "Manifest-Version: 1.0\nImplementation-Version: 2.\n\t4.1\n";
        assert_eq!(
            scan_attribute(text, "Implementation-Version").as_deref(),
            Some("2.4.1")
        );

        let text = "Manifest-Version: 1.0\n\nName: x\nimplementation-version:7.0\n";
        assert_eq!(
            scan_attribute(text, "Implementation-Version").as_deref(),
            Some("7.0")
        );
    }

    #[test]
    fn lenient_scan_skips_empty_values() {
        let text = "Implementation-Version: \nBundle-Version: 1\n";
        assert_eq!(scan_attribute(text, "Implementation-Version"), None);
        assert_eq!(scan_attribute(text, "Bundle-Version").as_deref(), Some("1"));
    }
}
