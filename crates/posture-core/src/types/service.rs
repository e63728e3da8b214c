use serde::{Deserialize, Serialize};

/// One installed service as reported by the service inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service name
    pub name: String,

    /// Raw command line the service manager launches, quotes and arguments included
    pub executable_path: String,

    /// How the service is started
    #[serde(default)]
    pub start_mode: StartMode,
}

impl ServiceRecord {
    /// Create a service record
    pub fn new(
        name: impl Into<String>,
        executable_path: impl Into<String>,
        start_mode: StartMode,
    ) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
            start_mode,
        }
    }
}

/// Service start mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum StartMode {
    /// Started by the service manager at boot
    Auto,
    /// Started on demand
    Manual,
    /// Cannot be started
    Disabled,
    /// Anything the source reported that we do not recognise
    #[default]
    Unknown,
}

impl StartMode {
    /// Returns true for services that run without interactive invocation
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl From<&str> for StartMode {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "automatic" => Self::Auto,
            "manual" => Self::Manual,
            "disabled" => Self::Disabled,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for StartMode {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for StartMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Manual => write!(f, "Manual"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
