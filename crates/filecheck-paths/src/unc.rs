use filecheck_domain::{Failure, ReasonCode};

/// `\\host\X$\rest` for a drive-letter path; pre-formed UNC paths pass through.
pub fn to_unc(host: &str, local_path: &str) -> Result<String, Failure> {
    let path = local_path.trim();
    if path.starts_with("\\\\") {
        return Ok(path.to_string());
    }

    let host = host.trim();
    if host.is_empty() {
        return Err(invalid_source("missing host name"));
    }

    let mut chars = path.chars();
    let (Some(letter), Some(':')) = (chars.next(), chars.next()) else {
        return Err(invalid_source(path));
    };
    if !letter.is_ascii_alphabetic() {
        return Err(invalid_source(path));
    }

    let rest = chars.as_str().replace('/', "\\");
    Ok(format!("\\\\{host}\\{letter}${rest}"))
}

fn invalid_source(detail: &str) -> Failure {
    Failure::new(
        ReasonCode::InvalidUncSource,
        format!("invalid UNC source path: {detail}"),
    )
}
