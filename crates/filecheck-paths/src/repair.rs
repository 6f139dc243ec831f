use std::collections::HashSet;

use filecheck_domain::{Failure, ReasonCode, RepairOutcome, RepairRules};

const PLACEHOLDERS: [&str; 3] = ["n/a", "n\\a", "na"];
const PROGRAM_FILES_TRAILING_SPACE: &str = "c:\\program files ";
const PROGRAM_FILES_X86: &str = "c:\\program files (x86)";

/// Heuristic repair of path strings damaged by upstream data entry.
///
/// Pure: the same input and rules always produce the same outcome, and
/// feeding `repaired_path` back in returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct PathRepairer {
    rules: RepairRules,
}

impl PathRepairer {
    pub fn new(rules: RepairRules) -> Self {
        Self { rules }
    }

    pub fn repair(&self, raw: &str, is_windows: bool) -> RepairOutcome {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RepairOutcome::invalid(
                raw,
                false,
                Failure::new(ReasonCode::EmptyPath, "empty path"),
            );
        }

        if PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p)) {
            return RepairOutcome::invalid(
                raw,
                false,
                Failure::new(ReasonCode::PlaceholderPath, "Path marked as N/A"),
            );
        }

        let (candidate, was_repaired) = match self.fixed_point(trimmed, is_windows) {
            Some(repaired) => (repaired, true),
            None => (trimmed.to_string(), false),
        };

        if self.rules.invalid_path_detection
            && let Some(reason) = self.disallowed_pattern(&candidate, is_windows)
        {
            return RepairOutcome::invalid(
                if was_repaired { candidate.as_str() } else { raw },
                was_repaired,
                reason,
            );
        }

        if was_repaired {
            RepairOutcome::repaired(candidate)
        } else {
            RepairOutcome::untouched(raw)
        }
    }

    /// Applies repair steps until the path stops changing. `None` when no step
    /// applies, or when the steps cycle back to a path already produced; a
    /// cycle leaves the input as it was.
    fn fixed_point(&self, start: &str, is_windows: bool) -> Option<String> {
        let mut seen = HashSet::from([start.to_string()]);
        let mut candidate = start.to_string();
        while let Some(next) = self.repair_step(&candidate, is_windows) {
            if next == candidate {
                break;
            }
            if !seen.insert(next.clone()) {
                tracing::warn!(
                    target: "filecheck.paths",
                    path = start,
                    "repair rules cycle for this path; left unrepaired"
                );
                return None;
            }
            candidate = next;
        }
        (candidate != start).then_some(candidate)
    }

    /// One pass of the ordered rules; the first rule that changes the path wins.
    fn repair_step(&self, path: &str, is_windows: bool) -> Option<String> {
        if let Some(replacement) = self.rules.replacements.lookup(path, is_windows) {
            return Some(replacement.to_string());
        }
        if let Some(truncated) = self.truncate_at_marker(path) {
            return Some(truncated);
        }
        truncate_filename_at_space(path)
    }

    fn truncate_at_marker(&self, path: &str) -> Option<String> {
        let lower = path.to_ascii_lowercase();
        let cut = self
            .rules
            .marker_tokens
            .iter()
            .filter_map(|token| lower.find(&format!(" {}", token.to_ascii_lowercase())))
            .min()?;
        let truncated = path[..cut].trim_end();
        if truncated.is_empty() {
            return None;
        }
        Some(truncated.to_string())
    }

    fn disallowed_pattern(&self, path: &str, is_windows: bool) -> Option<Failure> {
        let lower = path.to_ascii_lowercase();

        if let Some(token) = self
            .rules
            .marker_tokens
            .iter()
            .find(|t| lower.contains(&t.to_ascii_lowercase()))
        {
            return Some(Failure::new(
                ReasonCode::DisallowedPattern,
                format!("path contains marker token {token}"),
            ));
        }

        if lower.starts_with(PROGRAM_FILES_TRAILING_SPACE) && !lower.starts_with(PROGRAM_FILES_X86)
        {
            return Some(Failure::new(
                ReasonCode::DisallowedPattern,
                "trailing space after Program Files",
            ));
        }

        if is_windows && lower.ends_with(".jar") {
            let (_, file_name) = split_file_name(path);
            if file_name.contains(' ') {
                return Some(Failure::new(
                    ReasonCode::DisallowedPattern,
                    format!("JAR filename contains spaces: {file_name}"),
                ));
            }
        }

        None
    }
}

/// Splits at the last `/` or `\`. A path without a separator is all file name.
pub(crate) fn split_file_name(path: &str) -> (&str, &str) {
    match path.rfind(['/', '\\']) {
        Some(idx) => (&path[..=idx], &path[idx + 1..]),
        None => ("", path),
    }
}

fn truncate_filename_at_space(path: &str) -> Option<String> {
    let (dir, file_name) = split_file_name(path);
    if !file_name.contains('.') {
        return None;
    }
    match file_name.find(' ') {
        Some(space) if space > 0 => Some(format!("{dir}{}", file_name[..space].trim_end())),
        _ => None,
    }
}
