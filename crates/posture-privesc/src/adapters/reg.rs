//! Parsing `reg query <key> /v <value>` output.

use posture_core::SourceError;

/// Extract a `REG_DWORD` value. `Ok(None)` if the value is not listed.
pub fn parse_dword(output: &str, value: &str) -> Result<Option<u32>, SourceError> {
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, kind, data, ..] = fields.as_slice() else {
            continue;
        };
        if !name.eq_ignore_ascii_case(value) {
            continue;
        }
        if *kind != "REG_DWORD" {
            return Err(SourceError::Malformed(format!(
                "{value} is {kind}, expected REG_DWORD"
            )));
        }
        let parsed = data
            .strip_prefix("0x")
            .or_else(|| data.strip_prefix("0X"))
            .map_or_else(|| data.parse(), |hex| u32::from_str_radix(hex, 16));
        return parsed
            .map(Some)
            .map_err(|e| SourceError::Malformed(format!("{value}={data}: {e}")));
    }
    Ok(None)
}

/// Map a failed reg query to an outcome. A missing key or value is not an error.
pub fn classify_failure(key: &str, text: &str) -> Result<Option<u32>, SourceError> {
    let lower = text.to_lowercase();
    if lower.contains("unable to find") {
        Ok(None)
    } else if lower.contains("access is denied") {
        Err(SourceError::AccessDenied(key.to_string()))
    } else {
        Err(SourceError::Unavailable(format!("reg query {key}: {}", text.trim())))
    }
}
