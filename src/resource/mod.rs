//! Resource trait and kinds for declarative platform configuration
//!
//! Every declared document becomes one or more typed Resources with:
//! - An existence check (current state, read-only)
//! - A desired payload (what apply sends and what diffs compare)
//! - Create and update calls with kind-specific identity and versioning
//!
//! The shared driver in `engine::executor` decides create vs update and runs
//! the safety gate in between; implementations only issue their own calls.

use anyhow::Result;
use apiclient::Transport;
use declarative::{ApplyContext, ApplyOutcome};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::error::ApplyError;

pub mod bucket;
pub mod classify;
pub mod connection;
pub mod document;
pub mod extract;
pub mod monitoring;
pub mod settings;
pub mod slo;
pub mod workflow;

pub use bucket::Bucket;
pub use connection::Connection;
pub use document::Document;
pub use monitoring::MonitoringConfig;
pub use settings::SettingsObject;
pub use slo::Slo;
pub use workflow::Workflow;

/// Closed set of resource kinds the classifier can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Workflow,
    Dashboard,
    Notebook,
    Slo,
    Bucket,
    SettingsObject,
    AzureConnection,
    AzureMonitoringConfig,
    GcpConnection,
    GcpMonitoringConfig,
    Unknown,
}

impl ResourceKind {
    /// Short machine label (used in outcomes and logs)
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Dashboard => "dashboard",
            Self::Notebook => "notebook",
            Self::Slo => "slo",
            Self::Bucket => "bucket",
            Self::SettingsObject => "settings",
            Self::AzureConnection => "azure_connection",
            Self::AzureMonitoringConfig => "azure_monitoring_config",
            Self::GcpConnection => "gcp_connection",
            Self::GcpMonitoringConfig => "gcp_monitoring_config",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Workflow => "workflow",
            Self::Dashboard => "dashboard",
            Self::Notebook => "notebook",
            Self::Slo => "SLO",
            Self::Bucket => "bucket",
            Self::SettingsObject => "settings object",
            Self::AzureConnection => "Azure connection",
            Self::AzureMonitoringConfig => "Azure monitoring config",
            Self::GcpConnection => "GCP connection",
            Self::GcpMonitoringConfig => "GCP monitoring config",
            Self::Unknown => "unknown resource",
        };
        f.write_str(label)
    }
}

/// A resource as observed by the existence check
#[derive(Debug, Clone, PartialEq)]
pub struct Existing {
    /// Identity to address the update to
    pub id: String,
    /// Optimistic-locking version observed at this read
    pub version: Option<String>,
    /// Recorded owner, if the API exposes one
    pub owner: Option<String>,
    /// Body returned by the read
    pub body: Value,
}

impl Existing {
    /// Build from a read response, picking version and owner by field name
    pub fn from_body(id: impl Into<String>, body: Value, version_field: &str) -> Self {
        Self {
            id: id.into(),
            version: scalar(&body, version_field),
            owner: scalar(&body, "owner"),
            body,
        }
    }
}

/// Result of an existence check
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteState {
    Absent,
    Present(Existing),
}

/// Core trait for all declarable resources
pub trait Resource: fmt::Debug {
    /// Kind this resource was classified as
    fn kind(&self) -> ResourceKind;

    /// Human-readable name (may be empty)
    fn name(&self) -> String;

    /// Structural warnings collected while building the resource
    fn warnings(&self) -> &[String] {
        &[]
    }

    /// Existence check; must only issue read calls
    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState>;

    /// Payload as declared, in the shape compared by diffs
    fn desired_state(&self) -> Value;

    /// Payload an update of `existing` would send, in the shape compared by diffs
    ///
    /// Kinds that fill fields in from the deployed resource override this.
    fn desired_state_for(&self, _existing: &Existing) -> Value {
        self.desired_state()
    }

    /// Remote payload in the same shape as [`Resource::desired_state`]
    ///
    /// Defaults to the body captured by the existence check.
    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(existing.body.clone())
    }

    /// Create the resource (safety gate already passed)
    fn create(&self, ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome>;

    /// Update the resource found by the existence check (safety gate already passed)
    fn update(
        &self,
        ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome>;
}

/// Version observed by the existence check, required for a locked update
pub fn require_version<'a>(kind: ResourceKind, existing: &'a Existing) -> Result<&'a str> {
    existing.version.as_deref().ok_or_else(|| {
        ApplyError::input(format!(
            "{} '{}' carries no version; refusing to update without optimistic locking",
            kind, existing.id
        ))
        .into()
    })
}

/// Identity of a created resource: the response `id`, else the id the create sent
pub fn created_id(response: &Value, sent: Option<&str>) -> apiclient::Result<String> {
    text(response, "id")
        .or_else(|| sent.map(str::to_string))
        .ok_or_else(|| apiclient::Error::InvalidResponse("create response carries no id".to_string()))
}

/// Walk a paged `items` listing until `matches` accepts an item
///
/// The first page is requested with `query`; later pages only with the
/// `nextPageKey` the previous page returned.
pub fn find_in_pages(
    api: &dyn Transport,
    path: &str,
    query: &[(&str, &str)],
    matches: impl Fn(&Value) -> bool,
) -> apiclient::Result<Option<Value>> {
    let mut page = api.get_with(path, query)?;
    loop {
        let found = page
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|item| matches(item));
        if let Some(item) = found {
            return Ok(Some(item.clone()));
        }

        let Some(next) = text(&page, "nextPageKey") else {
            return Ok(None);
        };
        page = api.get_with(path, &[("nextPageKey", next.as_str())])?;
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap_or_else(|e| panic!("invalid UUID pattern: {}", e))
});

/// Whether a string is shaped like a UUID
pub fn is_uuid(s: &str) -> bool {
    UUID.is_match(s)
}

/// Read a string or number field as a string
pub fn scalar(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a non-empty string field
pub fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Copy of an object without the given keys
pub fn without(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let filtered: Map<String, Value> = map
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Value::Object(filtered)
        }
        other => other.clone(),
    }
}

/// Case-insensitive key lookup
pub fn get_ci<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Label used in messages: the name when known, else the id, else "(new)"
pub fn label(name: &str, id: Option<&str>) -> String {
    if !name.is_empty() {
        name.to_string()
    } else {
        id.unwrap_or("(new)").to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for reconciler tests

    use declarative::Reporter;

    /// Reporter that keeps everything it is told
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub started: Vec<String>,
        pub notes: Vec<String>,
        pub warnings: Vec<String>,
        pub diffs: Vec<String>,
    }

    impl Reporter for Recorder {
        fn on_resource_start(&mut self, resource_type: &str, name: &str) {
            self.started.push(format!("{} {}", resource_type, name));
        }
        fn on_note(&mut self, message: &str) {
            self.notes.push(message.to_string());
        }
        fn on_warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
        fn on_diff(&mut self, diff: &str) {
            self.diffs.push(diff.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(is_uuid("123E4567-E89B-12D3-A456-426614174000"));
        assert!(!is_uuid("my-dashboard"));
        assert!(!is_uuid("123e4567e89b12d3a456426614174000"));
        assert!(!is_uuid(" 123e4567-e89b-12d3-a456-426614174000"));
    }

    #[test]
    fn test_scalar_reads_numbers_and_strings() {
        let v = json!({"a": 3, "b": "x", "c": "", "d": true});
        assert_eq!(scalar(&v, "a"), Some("3".to_string()));
        assert_eq!(scalar(&v, "b"), Some("x".to_string()));
        assert_eq!(scalar(&v, "c"), None);
        assert_eq!(scalar(&v, "d"), None);
        assert_eq!(scalar(&v, "missing"), None);
    }

    #[test]
    fn test_without_drops_keys() {
        let v = json!({"id": "1", "name": "n", "version": 2});
        assert_eq!(without(&v, &["id", "version"]), json!({"name": "n"}));
    }

    #[test]
    fn test_get_ci() {
        let v = json!({"SchemaID": "builtin:x"});
        assert_eq!(get_ci(&v, "schemaId"), Some(&json!("builtin:x")));
        assert_eq!(get_ci(&json!([1]), "schemaId"), None);
    }

    #[test]
    fn test_created_id() {
        assert_eq!(created_id(&json!({"id": "a"}), Some("b")).unwrap(), "a");
        assert_eq!(created_id(&json!({}), Some("b")).unwrap(), "b");
        let err = created_id(&json!({"id": ""}), None).unwrap_err();
        assert!(matches!(err, apiclient::Error::InvalidResponse(_)));
    }

    #[test]
    fn test_existing_from_body() {
        let existing = Existing::from_body("d1", json!({"version": 7, "owner": "u1"}), "version");
        assert_eq!(existing.version.as_deref(), Some("7"));
        assert_eq!(existing.owner.as_deref(), Some("u1"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ResourceKind::SettingsObject.to_string(), "settings object");
        assert_eq!(ResourceKind::GcpConnection.resource_type(), "gcp_connection");
    }
}
