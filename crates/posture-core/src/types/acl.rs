use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filesystem access right, collapsed to the classes the detector cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Right {
    /// Read data or attributes
    Read,
    /// Write or append data
    Write,
    /// Modify (write + delete)
    Modify,
    /// Full control, including changing permissions and ownership
    FullControl,
    /// Execute / traverse
    Execute,
    /// Any other special permission
    Other,
}

impl Right {
    /// Returns true if holding this right lets the principal replace the file
    #[must_use]
    pub const fn is_write_class(&self) -> bool {
        matches!(self, Self::Modify | Self::FullControl)
    }
}

impl std::fmt::Display for Right {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "Read"),
            Self::Write => write!(f, "Write"),
            Self::Modify => write!(f, "Modify"),
            Self::FullControl => write!(f, "FullControl"),
            Self::Execute => write!(f, "Execute"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// One discretionary access-control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    /// Principal the entry applies to (e.g. `BUILTIN\Users`)
    pub identity: String,

    /// Rights granted to the principal
    #[serde(default)]
    pub rights: BTreeSet<Right>,
}

impl AccessControlEntry {
    /// Create an entry from an identity and any collection of rights
    pub fn new(identity: impl Into<String>, rights: impl IntoIterator<Item = Right>) -> Self {
        Self {
            identity: identity.into(),
            rights: rights.into_iter().collect(),
        }
    }

    /// Returns true if the entry grants Modify or FullControl
    #[must_use]
    pub fn grants_write_class(&self) -> bool {
        self.rights.iter().any(Right::is_write_class)
    }

    /// Rights rendered as `Modify|Read`
    #[must_use]
    pub fn rights_label(&self) -> String {
        self.rights
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// All entries for one path; order is irrelevant for evaluation
pub type AccessControlList = Vec<AccessControlEntry>;
