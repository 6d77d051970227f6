//! Settings resource - generic settings 2.0 objects
//!
//! Object IDs are assigned by the service. A supplied `objectId` that is not
//! found therefore produces a new object with a fresh ID, never the supplied
//! one.

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::{Value, json};

use super::classify::schema_id;
use super::{Existing, RemoteState, Resource, ResourceKind, require_version, text};
use crate::error::{ApplyError, RemoteStep};

pub(crate) const SETTINGS_OBJECTS_PATH: &str =
    "/platform/classic/environment-api/v2/settings/objects";

pub(crate) fn object_path(object_id: &str) -> String {
    format!("{}/{}", SETTINGS_OBJECTS_PATH, object_id)
}

/// Object ID from a settings create response
///
/// Creates answer with one result per posted object; a failed element
/// carries its own `code` and `error` even when the request succeeded.
pub(crate) fn created_object_id(response: &Value) -> apiclient::Result<String> {
    let first = response
        .as_array()
        .and_then(|items| items.first())
        .unwrap_or(response);

    if let Some(error) = first.get("error") {
        let code = first
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(400);
        let message = text(error, "message").unwrap_or_else(|| error.to_string());
        return Err(apiclient::Error::status(code, message));
    }

    text(first, "objectId").ok_or_else(|| {
        apiclient::Error::InvalidResponse("create response carries no objectId".to_string())
    })
}

/// A generic settings object
#[derive(Debug, Clone)]
pub struct SettingsObject {
    pub object_id: Option<String>,
    pub schema_id: String,
    pub scope: String,
    value: Value,
}

impl SettingsObject {
    /// Validate and build; all missing fields are reported together
    pub fn from_document(document: &Value) -> Result<Self, ApplyError> {
        let schema = schema_id(document).filter(|s| !s.is_empty());
        let scope = text(document, "scope");
        let value = document.get("value").filter(|v| !v.is_null());

        let mut missing = Vec::new();
        if schema.is_none() {
            missing.push("schemaId");
        }
        if scope.is_none() {
            missing.push("scope");
        }
        if value.is_none() {
            missing.push("value");
        }

        match (schema, scope, value) {
            (Some(schema), Some(scope), Some(value)) => Ok(Self {
                object_id: text(document, "objectId"),
                schema_id: schema.to_string(),
                scope,
                value: value.clone(),
            }),
            _ => Err(ApplyError::MissingField {
                kind: ResourceKind::SettingsObject,
                fields: missing,
            }),
        }
    }

    fn target(&self) -> String {
        self.object_id
            .clone()
            .unwrap_or_else(|| format!("{} @ {}", self.schema_id, self.scope))
    }
}

impl Resource for SettingsObject {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SettingsObject
    }

    fn name(&self) -> String {
        self.schema_id.clone()
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        let Some(object_id) = &self.object_id else {
            return Ok(RemoteState::Absent);
        };

        match api.get(&object_path(object_id)) {
            Ok(body) => Ok(RemoteState::Present(Existing::from_body(
                object_id.clone(),
                body,
                "schemaVersion",
            ))),
            Err(e) if e.is_not_found() => Ok(RemoteState::Absent),
            Err(e) => Err(
                ApplyError::remote(self.kind(), RemoteStep::Read, object_id.clone(), &e).into(),
            ),
        }
    }

    fn desired_state(&self) -> Value {
        self.value.clone()
    }

    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(existing.body.get("value").cloned().unwrap_or(Value::Null))
    }

    fn create(&self, ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        if let Some(object_id) = &self.object_id {
            ctx.note(&format!(
                "settings object '{}' not found; creating a new object (the service assigns the ID)",
                object_id
            ));
        }

        let body = json!([{
            "schemaId": self.schema_id,
            "scope": self.scope,
            "value": self.value,
        }]);
        let object_id = api
            .post(SETTINGS_OBJECTS_PATH, body)
            .and_then(|response| created_object_id(&response))
            .map_err(|e| {
                ApplyError::remote(
                    self.kind(),
                    RemoteStep::Write(Operation::Create),
                    self.target(),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind().resource_type(),
            object_id,
            self.schema_id.clone(),
        ))
    }

    fn update(
        &self,
        _ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        let schema_version = require_version(self.kind(), existing)?;

        let body = json!({"value": self.value, "schemaVersion": schema_version});
        api.put(&object_path(&existing.id), &[], body).map_err(|e| {
            ApplyError::remote(
                self.kind(),
                RemoteStep::Write(Operation::Update),
                existing.id.clone(),
                &e,
            )
        })?;

        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind().resource_type(),
            existing.id.clone(),
            self.schema_id.clone(),
        ))
    }
}
