//! Core types for declarative apply

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A mutating operation against a remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a resource that does not exist yet
    Create,
    /// Modify an existing resource
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Ownership of a target resource relative to the caller
///
/// Always derived for the current invocation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The caller is the recorded owner
    Own,
    /// Someone else owns the resource
    Shared,
    /// Owner or caller identity is not available
    Unknown,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => write!(f, "own"),
            Self::Shared => write!(f, "shared"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Policy tier bounding which mutating operations are permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SafetyLevel {
    #[serde(rename = "readonly")]
    ReadOnly,
    #[serde(rename = "readwrite-mine")]
    ReadWriteMine,
    #[serde(rename = "readwrite-all")]
    ReadWriteAll,
    #[serde(rename = "dangerously-unrestricted")]
    DangerouslyUnrestricted,
}

impl SafetyLevel {
    /// All levels, most restrictive first
    pub const ALL: [SafetyLevel; 4] = [
        Self::ReadOnly,
        Self::ReadWriteMine,
        Self::ReadWriteAll,
        Self::DangerouslyUnrestricted,
    ];

    /// Config/CLI spelling of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "readonly",
            Self::ReadWriteMine => "readwrite-mine",
            Self::ReadWriteAll => "readwrite-all",
            Self::DangerouslyUnrestricted => "dangerously-unrestricted",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown safety level '{}' (expected one of: readonly, readwrite-mine, readwrite-all, dangerously-unrestricted)",
                    s
                )
            })
    }
}

/// What a live apply did to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Updated => write!(f, "Updated"),
        }
    }
}

/// Terminal result of reconciling one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub action: Action,
    /// Resource type label (e.g. "dashboard", "bucket")
    pub resource_type: String,
    /// Final identity as reported by the remote system
    pub id: String,
    /// Display name, when the resource has one
    pub name: String,
    /// Non-fatal structural concerns collected along the way
    pub warnings: Vec<String>,
}

impl ApplyOutcome {
    pub fn new(
        action: Action,
        resource_type: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type: resource_type.into(),
            id: id.into(),
            name: name.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_created(&self) -> bool {
        matches!(self.action, Action::Created)
    }
}

/// What a dry run expects apply to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    Update { id: String },
    /// The existence check failed, so the outcome cannot be predicted
    Undetermined { reason: String },
}

/// Dry-run result for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub resource_type: String,
    pub name: String,
    pub planned: PlannedAction,
    /// Set when the safety policy would reject the planned operation
    pub denied: Option<String>,
    /// Rendered positional diff, when requested and available
    pub diff: Option<String>,
    pub warnings: Vec<String>,
}

impl Preview {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        let label = if self.name.is_empty() {
            self.resource_type.clone()
        } else {
            format!("{} \"{}\"", self.resource_type, self.name)
        };
        match &self.planned {
            PlannedAction::Create => format!("Would create {}", label),
            PlannedAction::Update { id } => format!("Would update {} ({})", label, id),
            PlannedAction::Undetermined { .. } => {
                format!("Would create or update {} (current state unknown)", label)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_level_parse() {
        assert_eq!(
            "readwrite-mine".parse::<SafetyLevel>().unwrap(),
            SafetyLevel::ReadWriteMine
        );
        assert_eq!(
            "ReadWrite_All".parse::<SafetyLevel>().unwrap(),
            SafetyLevel::ReadWriteAll
        );
        assert!("superuser".parse::<SafetyLevel>().is_err());
    }

    #[test]
    fn test_safety_level_round_trips_through_display() {
        for level in SafetyLevel::ALL {
            assert_eq!(level.to_string().parse::<SafetyLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_preview_summary() {
        let mut preview = Preview {
            resource_type: "dashboard".into(),
            name: "Ops".into(),
            planned: PlannedAction::Create,
            denied: None,
            diff: None,
            warnings: vec![],
        };
        assert_eq!(preview.summary(), "Would create dashboard \"Ops\"");

        preview.planned = PlannedAction::Update { id: "abc".into() };
        assert_eq!(preview.summary(), "Would update dashboard \"Ops\" (abc)");

        preview.planned = PlannedAction::Undetermined {
            reason: "HTTP 500".into(),
        };
        assert!(preview.summary().contains("current state unknown"));
    }
}
