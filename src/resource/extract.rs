//! Content extraction for dashboards and notebooks
//!
//! Documents arrive in several shapes: the envelope produced by a previous
//! `get` (`{id, name, type, content: {...}}`), a bare payload, or an envelope
//! whose `content` was pasted inside another `content`. Extraction recovers
//! the payload and reports anything odd as a warning. It never fails; the
//! remote API is the final validator.

use serde_json::Value;

use super::{ResourceKind, text};

/// Payload recovered from a document
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub payload: Value,
    pub name: String,
    pub description: Option<String>,
    pub warnings: Vec<String>,
}

/// Whether a payload carries the marker fields of `kind`
pub fn has_marker(payload: &Value, kind: ResourceKind) -> bool {
    match kind {
        ResourceKind::Notebook => payload.get("sections").is_some(),
        _ => payload.get("tiles").is_some() && payload.get("version").is_some(),
    }
}

fn marker_fields(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Notebook => "'sections'",
        _ => "'tiles' and 'version'",
    }
}

/// Recover the payload, name and description of a dashboard or notebook
pub fn extract(document: &Value, kind: ResourceKind) -> Extracted {
    let mut warnings = Vec::new();

    let payload = match content_of(document) {
        Some(content) => {
            let payload = match content_of(&content) {
                Some(inner) => {
                    warnings.push(format!(
                        "{} content is double-nested (content.content); using the inner object",
                        kind
                    ));
                    inner
                }
                None => content,
            };
            if !has_marker(&payload, kind) {
                warnings.push(format!(
                    "{} content is missing {}; the API may reject it",
                    kind,
                    marker_fields(kind)
                ));
            }
            payload
        }
        None => {
            if !has_marker(document, kind) {
                warnings.push(format!(
                    "document has no 'content' and is missing {}; sending it as-is",
                    marker_fields(kind)
                ));
            }
            document.clone()
        }
    };

    let name = text(document, "name")
        .or_else(|| document.get("metadata").and_then(|m| text(m, "name")))
        .unwrap_or_else(|| {
            warnings.push(format!("{} has no name; using 'Untitled {}'", kind, kind));
            format!("Untitled {}", kind)
        });

    Extracted {
        payload,
        name,
        description: text(document, "description"),
        warnings,
    }
}

/// `content` as an object, accepting the JSON-string form some exports use
pub(crate) fn content_of(value: &Value) -> Option<Value> {
    match value.get("content")? {
        Value::Object(_) => value.get("content").cloned(),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(Value::is_object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dashboard_payload() -> Value {
        json!({"tiles": {"0": {"type": "markdown"}}, "version": 15})
    }

    #[test]
    fn test_envelope_content_is_unwrapped() {
        let doc = json!({"id": "d1", "name": "Ops", "type": "dashboard", "content": dashboard_payload()});
        let out = extract(&doc, ResourceKind::Dashboard);
        assert_eq!(out.payload, dashboard_payload());
        assert_eq!(out.name, "Ops");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_double_nested_matches_single_nested_with_warning() {
        let once = json!({"name": "Ops", "content": dashboard_payload()});
        let twice = json!({"name": "Ops", "content": {"content": dashboard_payload()}});

        let a = extract(&once, ResourceKind::Dashboard);
        let b = extract(&twice, ResourceKind::Dashboard);

        assert_eq!(a.payload, b.payload);
        assert!(a.warnings.is_empty());
        assert_eq!(b.warnings.len(), 1);
        assert!(b.warnings[0].contains("double-nested"));
    }

    #[test]
    fn test_missing_marker_warns_but_proceeds() {
        let doc = json!({"name": "n", "content": {"cells": []}});
        let out = extract(&doc, ResourceKind::Notebook);
        assert_eq!(out.payload, json!({"cells": []}));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("sections"));
    }

    #[test]
    fn test_bare_payload_with_marker_is_accepted() {
        let doc = json!({"tiles": [{"name": "t"}], "version": "1"});
        let out = extract(&doc, ResourceKind::Dashboard);
        assert_eq!(out.payload, doc);
        // Only the missing name is reported
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.name, "Untitled dashboard");
    }

    #[test]
    fn test_bare_document_without_marker_is_sent_as_is() {
        let doc = json!({"name": "n", "metadata": {}});
        let out = extract(&doc, ResourceKind::Dashboard);
        assert_eq!(out.payload, doc);
        assert!(out.warnings[0].contains("no 'content'"));
    }

    #[test]
    fn test_dashboard_marker_needs_version() {
        let doc = json!({"name": "n", "content": {"tiles": {}}});
        let out = extract(&doc, ResourceKind::Dashboard);
        assert!(out.warnings[0].contains("'version'"));
    }

    #[test]
    fn test_string_content_is_parsed() {
        let doc = json!({"name": "n", "content": "{\"sections\": []}"});
        let out = extract(&doc, ResourceKind::Notebook);
        assert_eq!(out.payload, json!({"sections": []}));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_name_and_description() {
        let doc = json!({"metadata": {"name": "From metadata"}, "description": "d", "content": dashboard_payload()});
        let out = extract(&doc, ResourceKind::Dashboard);
        assert_eq!(out.name, "From metadata");
        assert_eq!(out.description.as_deref(), Some("d"));
    }
}
