//! Apply error taxonomy
//!
//! Input and policy errors are raised before any mutating call. Remote errors
//! carry a translated message instead of a bare status code.

use apiclient::ErrorCategory;
use declarative::{Operation, SafetyError};
use serde_json::Value;
use std::fmt;

use crate::resource::ResourceKind;

/// Typed apply failure, carried inside `anyhow::Error`
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Malformed encoding, unresolved variables, bad flags
    #[error("{0}")]
    Input(String),

    /// No classification rule matched
    #[error("could not determine resource type of document: {}", snippet(.document))]
    Unclassifiable { document: Value },

    /// A required field is absent or empty
    #[error("invalid {kind}: missing required field(s): {}", .fields.join(", "))]
    MissingField {
        kind: ResourceKind,
        fields: Vec<&'static str>,
    },

    /// Safety gate denial
    #[error(transparent)]
    Policy(#[from] SafetyError),

    /// The remote call failed
    #[error("failed to {operation} {kind} '{target}': {message}")]
    Remote {
        kind: ResourceKind,
        operation: RemoteStep,
        target: String,
        message: String,
        status: Option<u16>,
    },
}

/// Which remote step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStep {
    Read,
    Lookup,
    Write(Operation),
}

impl fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Lookup => write!(f, "look up"),
            Self::Write(op) => write!(f, "{}", op),
        }
    }
}

impl ApplyError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Translate a transport failure into a domain message
    pub fn remote(
        kind: ResourceKind,
        step: RemoteStep,
        target: impl Into<String>,
        err: &apiclient::Error,
    ) -> Self {
        let target = target.into();
        let detail = err.detail();
        let message = match (err.category(), step) {
            (ErrorCategory::Conflict, RemoteStep::Write(Operation::Create)) => {
                format!("{} already exists ({})", kind, detail)
            }
            (ErrorCategory::Conflict | ErrorCategory::PreconditionFailed, _) => format!(
                "version conflict: the {} changed since it was read; re-run apply ({})",
                kind, detail
            ),
            (ErrorCategory::Forbidden, _) => format!(
                "permission denied: the {} is read-only for this token or user ({})",
                kind, detail
            ),
            (ErrorCategory::NotFound, _) => format!("{} not found ({})", kind, detail),
            (ErrorCategory::BadRequest, _) => format!("rejected by the API: {}", detail),
            (category, _) => format!("{}: {}", category.description(), detail),
        };

        Self::Remote {
            kind,
            operation: step,
            target,
            message,
            status: err.status_code(),
        }
    }

    /// True for failures raised before any network call
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::Unclassifiable { .. } | Self::MissingField { .. }
        )
    }
}

fn snippet(document: &Value) -> String {
    let text = document.to_string();
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text
    }
}
