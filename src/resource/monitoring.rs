//! Monitoring config resource - Azure and GCP extension monitoring configurations
//!
//! The `value.description` doubles as the configuration's name for lookup.
//! A payload without `value.version` keeps the version already deployed,
//! or the extension's active environment version for a new configuration.

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::{Value, json};

use super::settings::created_object_id;
use super::{Existing, RemoteState, Resource, ResourceKind, find_in_pages, text};
use crate::error::{ApplyError, RemoteStep};

/// Extension serving Azure monitoring
pub const AZURE_EXTENSION: &str = "com.dynatrace.extension.da-azure";
/// Extension serving GCP monitoring
pub const GCP_EXTENSION: &str = "com.dynatrace.extension.da-gcp";

const EXTENSIONS_PATH: &str = "/platform/extensions/v2/extensions";

/// An Azure or GCP monitoring configuration
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    kind: ResourceKind,
    pub object_id: Option<String>,
    pub description: String,
    pub scope: String,
    value: Value,
}

impl MonitoringConfig {
    /// Build from a document; `kind` is AzureMonitoringConfig or GcpMonitoringConfig
    pub fn from_document(document: &Value, kind: ResourceKind) -> Result<Self, ApplyError> {
        let value = document
            .get("value")
            .filter(|v| v.is_object())
            .ok_or(ApplyError::MissingField {
                kind,
                fields: vec!["value"],
            })?;
        let description = text(value, "description").ok_or(ApplyError::MissingField {
            kind,
            fields: vec!["value.description"],
        })?;

        Ok(Self {
            kind,
            object_id: text(document, "objectId"),
            description,
            scope: text(document, "scope").unwrap_or_default(),
            value: value.clone(),
        })
    }

    fn extension(&self) -> &'static str {
        match self.kind {
            ResourceKind::GcpMonitoringConfig => GCP_EXTENSION,
            _ => AZURE_EXTENSION,
        }
    }

    fn configs_path(&self) -> String {
        format!("{}/{}/monitoring-configurations", EXTENSIONS_PATH, self.extension())
    }

    fn config_path(&self, id: &str) -> String {
        format!("{}/{}", self.configs_path(), id)
    }

    fn lookup(&self, api: &dyn Transport) -> Result<Option<Existing>> {
        let found = find_in_pages(api, &self.configs_path(), &[], |item| {
            item.get("value")
                .and_then(|v| text(v, "description"))
                .as_deref()
                == Some(self.description.as_str())
        })
        .map_err(|e| {
            ApplyError::remote(self.kind, RemoteStep::Lookup, self.description.clone(), &e)
        })?;

        Ok(found.map(|item| {
            let object_id = text(&item, "objectId").unwrap_or_default();
            log::info!(
                "Found existing {} '{}' ({}) by description",
                self.kind,
                self.description,
                object_id
            );
            Existing::from_body(object_id, item, "version")
        }))
    }

    fn has_version(&self) -> bool {
        self.value.get("version").is_some_and(|v| !v.is_null())
    }

    /// Version of the deployed configuration, if the read exposed one
    fn deployed_version(existing: &Existing) -> Option<String> {
        existing.body.get("value").and_then(|v| text(v, "version"))
    }

    fn value_at(&self, version: String) -> Value {
        let mut value = self.value.clone();
        if let Some(map) = value.as_object_mut() {
            map.insert("version".to_string(), Value::String(version));
        }
        value
    }

    /// The value to send, with `version` filled in when the payload omits it
    fn value_with_version(
        &self,
        ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: Option<&Existing>,
    ) -> Result<Value> {
        if self.has_version() {
            return Ok(self.value.clone());
        }

        let version = match existing.and_then(Self::deployed_version) {
            Some(version) => {
                ctx.note(&format!(
                    "{} '{}' has no version; keeping deployed version {}",
                    self.kind, self.description, version
                ));
                version
            }
            None => {
                let path = format!("{}/{}/environmentConfiguration", EXTENSIONS_PATH, self.extension());
                let config = api.get(&path).map_err(|e| {
                    ApplyError::remote(self.kind, RemoteStep::Read, self.extension(), &e)
                })?;
                let version = text(&config, "version").ok_or_else(|| {
                    ApplyError::input(format!(
                        "{} '{}' has no version and extension {} has no active environment configuration",
                        self.kind,
                        self.description,
                        self.extension()
                    ))
                })?;
                ctx.note(&format!(
                    "{} '{}' has no version; using active extension version {}",
                    self.kind, self.description, version
                ));
                version
            }
        };

        Ok(self.value_at(version))
    }
}

impl Resource for MonitoringConfig {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn name(&self) -> String {
        self.description.clone()
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        let Some(object_id) = &self.object_id else {
            return Ok(match self.lookup(api)? {
                Some(existing) => RemoteState::Present(existing),
                None => RemoteState::Absent,
            });
        };

        match api.get(&self.config_path(object_id)) {
            Ok(body) => Ok(RemoteState::Present(Existing::from_body(
                object_id.clone(),
                body,
                "version",
            ))),
            Err(e) if e.is_not_found() => Ok(RemoteState::Absent),
            Err(e) => Err(
                ApplyError::remote(self.kind, RemoteStep::Read, object_id.clone(), &e).into(),
            ),
        }
    }

    fn desired_state(&self) -> Value {
        self.value.clone()
    }

    fn desired_state_for(&self, existing: &Existing) -> Value {
        match Self::deployed_version(existing) {
            Some(version) if !self.has_version() => self.value_at(version),
            _ => self.value.clone(),
        }
    }

    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(existing.body.get("value").cloned().unwrap_or(Value::Null))
    }

    fn create(&self, ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        let value = self.value_with_version(ctx, api, None)?;
        let body = json!([{"scope": self.scope, "value": value}]);

        let object_id = api
            .post(&self.configs_path(), body)
            .and_then(|response| created_object_id(&response))
            .map_err(|e| {
                ApplyError::remote(
                    self.kind,
                    RemoteStep::Write(Operation::Create),
                    self.description.clone(),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind.resource_type(),
            object_id,
            self.description.clone(),
        ))
    }

    fn update(
        &self,
        ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        let value = self.value_with_version(ctx, api, Some(existing))?;
        let body = json!({"scope": self.scope, "value": value});

        api.put(&self.config_path(&existing.id), &[], body)
            .map_err(|e| {
                ApplyError::remote(
                    self.kind,
                    RemoteStep::Write(Operation::Update),
                    self.description.clone(),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind.resource_type(),
            existing.id.clone(),
            self.description.clone(),
        ))
    }
}
