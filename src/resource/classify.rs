//! Resource classification
//!
//! Maps a canonical document to exactly one [`ResourceKind`]. The rules are
//! an ordered list evaluated first-match-wins; later rules rely on earlier
//! ones having claimed their field combinations, so the order in [`RULES`]
//! is part of the contract.

use serde_json::Value;
use std::borrow::Cow;

use super::extract::content_of;
use super::{ResourceKind, get_ci};
use crate::error::ApplyError;

/// Settings schema of Azure connections
pub const AZURE_CONNECTION_SCHEMA: &str = "builtin:hyperscaler-authentication.connections.azure";
/// Settings schema of GCP connections
pub const GCP_CONNECTION_SCHEMA: &str = "builtin:hyperscaler-authentication.connections.gcp";
/// Scope reserved for Azure monitoring configurations
pub const AZURE_MONITORING_SCOPE: &str = "integration-azure";
/// Scope reserved for GCP monitoring configurations
pub const GCP_MONITORING_SCOPE: &str = "integration-gcp";

/// One classification rule
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Value) -> Option<ResourceKind>,
}

/// Classification rules in evaluation order
pub const RULES: &[Rule] = &[
    Rule {
        name: "connection-list",
        matches: connection_list,
    },
    Rule {
        name: "connection",
        matches: connection,
    },
    Rule {
        name: "monitoring-scope",
        matches: monitoring_scope,
    },
    Rule {
        name: "explicit-type",
        matches: explicit_type,
    },
    Rule {
        name: "workflow",
        matches: workflow,
    },
    Rule {
        name: "metadata-default",
        matches: metadata_default,
    },
    Rule {
        name: "document-marker",
        matches: document_marker,
    },
    Rule {
        name: "slo",
        matches: slo,
    },
    Rule {
        name: "bucket",
        matches: bucket,
    },
    Rule {
        name: "settings",
        matches: settings,
    },
];

/// Classify a document, failing when no rule matches
pub fn classify(document: &Value) -> Result<ResourceKind, ApplyError> {
    for rule in RULES {
        match (rule.matches)(document) {
            Some(kind) => {
                log::debug!("Classified document as {} (rule '{}')", kind, rule.name);
                return Ok(kind);
            }
            None => log::trace!("Rule '{}' did not match", rule.name),
        }
    }
    Err(ApplyError::Unclassifiable {
        document: document.clone(),
    })
}

/// Connection kind for a schema identifier
pub fn connection_kind(schema_id: &str) -> Option<ResourceKind> {
    match schema_id {
        AZURE_CONNECTION_SCHEMA => Some(ResourceKind::AzureConnection),
        GCP_CONNECTION_SCHEMA => Some(ResourceKind::GcpConnection),
        _ => None,
    }
}

/// Schema identifier of a document, matched case-insensitively on the key
pub fn schema_id(document: &Value) -> Option<&str> {
    get_ci(document, "schemaId").and_then(Value::as_str)
}

fn has(document: &Value, key: &str) -> bool {
    document.get(key).is_some_and(|v| !v.is_null())
}

/// Document itself, its `content`, or a doubly nested `content`
///
/// String-encoded `content` is decoded the same way extraction decodes it.
fn content_levels(document: &Value) -> Vec<Cow<'_, Value>> {
    let mut levels = vec![Cow::Borrowed(document)];
    while levels.len() < 3 {
        let Some(next) = levels.last().and_then(|level| content_of(level)) else {
            break;
        };
        levels.push(Cow::Owned(next));
    }
    levels
}

fn connection_list(document: &Value) -> Option<ResourceKind> {
    let first = document.as_array()?.first()?;
    connection_kind(schema_id(first)?)
}

fn connection(document: &Value) -> Option<ResourceKind> {
    connection_kind(schema_id(document)?)
}

fn monitoring_scope(document: &Value) -> Option<ResourceKind> {
    match document.get("scope")?.as_str()? {
        AZURE_MONITORING_SCOPE => Some(ResourceKind::AzureMonitoringConfig),
        GCP_MONITORING_SCOPE => Some(ResourceKind::GcpMonitoringConfig),
        _ => None,
    }
}

fn explicit_type(document: &Value) -> Option<ResourceKind> {
    match document.get("type")?.as_str()? {
        "dashboard" => Some(ResourceKind::Dashboard),
        "notebook" => Some(ResourceKind::Notebook),
        _ => None,
    }
}

fn workflow(document: &Value) -> Option<ResourceKind> {
    (has(document, "tasks") && has(document, "trigger")).then_some(ResourceKind::Workflow)
}

fn metadata_default(document: &Value) -> Option<ResourceKind> {
    if has(document, "metadata") && !has(document, "type") {
        log::info!("Document has 'metadata' but no 'type'; assuming dashboard");
        return Some(ResourceKind::Dashboard);
    }
    None
}

fn document_marker(document: &Value) -> Option<ResourceKind> {
    for level in content_levels(document) {
        if has(&level, "tiles") {
            return Some(ResourceKind::Dashboard);
        }
        if has(&level, "sections") {
            return Some(ResourceKind::Notebook);
        }
    }
    None
}

fn slo(document: &Value) -> Option<ResourceKind> {
    (has(document, "criteria") && has(document, "name") && !has(document, "tasks"))
        .then_some(ResourceKind::Slo)
}

fn bucket(document: &Value) -> Option<ResourceKind> {
    (has(document, "bucketName") && has(document, "table")).then_some(ResourceKind::Bucket)
}

fn settings(document: &Value) -> Option<ResourceKind> {
    (schema_id(document).is_some() && has(document, "scope") && has(document, "value"))
        .then_some(ResourceKind::SettingsObject)
}
