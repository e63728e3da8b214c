//! Service inventory through `Get-CimInstance Win32_Service`.

use posture_core::{ServiceRecord, SourceError, StartMode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Command emitting the service list as compact JSON.
pub const SERVICE_QUERY: &str = "Get-CimInstance -ClassName Win32_Service | \
     Select-Object Name,PathName,StartMode | ConvertTo-Json -Compress";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CimService {
    name: Option<String>,
    path_name: Option<String>,
    start_mode: Option<String>,
}

/// Parse `ConvertTo-Json` output into service records.
///
/// PowerShell emits a bare object when there is a single service and
/// nothing at all when there are none. Records without a name or path
/// (kernel drivers, broken registrations) are dropped individually.
pub fn parse_services(json: &str) -> Result<Vec<ServiceRecord>, SourceError> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(SourceError::Malformed(format!(
                "expected service list, got {other}"
            )))
        }
    };

    let mut services = Vec::with_capacity(items.len());
    for item in items {
        let raw: CimService = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "skipping malformed service record");
                continue;
            }
        };
        let (Some(name), Some(path)) = (raw.name, raw.path_name) else {
            continue;
        };
        if name.trim().is_empty() || path.trim().is_empty() {
            continue;
        }
        let start_mode = raw
            .start_mode
            .as_deref()
            .map_or(StartMode::Unknown, StartMode::from);
        services.push(ServiceRecord::new(name, path, start_mode));
    }

    Ok(services)
}
