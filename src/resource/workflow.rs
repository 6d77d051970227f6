//! Workflow resource - automation workflows

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::Value;

use super::{Existing, RemoteState, Resource, ResourceKind, created_id, label, text, without};
use crate::error::{ApplyError, RemoteStep};

const WORKFLOWS_PATH: &str = "/platform/automation/v1/workflows";

/// Fields the service manages; never sent, never diffed
const SERVER_FIELDS: &[&str] = &[
    "id",
    "owner",
    "ownerType",
    "actor",
    "lastExecution",
    "modificationInfo",
    "version",
];

/// An automation workflow
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Supplied identity, if any
    pub id: Option<String>,
    pub title: String,
    payload: Value,
}

impl Workflow {
    pub fn from_document(document: &Value) -> Self {
        Self {
            id: text(document, "id"),
            title: text(document, "title").unwrap_or_default(),
            payload: without(document, SERVER_FIELDS),
        }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", WORKFLOWS_PATH, id)
    }

    fn target(&self) -> String {
        label(&self.title, self.id.as_deref())
    }
}

impl Resource for Workflow {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Workflow
    }

    fn name(&self) -> String {
        self.title.clone()
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        let Some(id) = &self.id else {
            return Ok(RemoteState::Absent);
        };

        match api.get(&Self::path(id)) {
            Ok(body) => Ok(RemoteState::Present(Existing::from_body(
                id.clone(),
                body,
                "version",
            ))),
            Err(e) if e.is_not_found() => Ok(RemoteState::Absent),
            Err(e) => Err(ApplyError::remote(self.kind(), RemoteStep::Read, id.clone(), &e).into()),
        }
    }

    fn desired_state(&self) -> Value {
        self.payload.clone()
    }

    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(without(&existing.body, SERVER_FIELDS))
    }

    fn create(&self, _ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        let mut body = self.payload.clone();
        if let (Some(id), Some(map)) = (&self.id, body.as_object_mut()) {
            map.insert("id".to_string(), Value::String(id.clone()));
        }

        let (created, id) = api
            .post(WORKFLOWS_PATH, body)
            .and_then(|created| {
                let id = created_id(&created, self.id.as_deref())?;
                Ok((created, id))
            })
            .map_err(|e| {
                ApplyError::remote(
                    self.kind(),
                    RemoteStep::Write(Operation::Create),
                    self.target(),
                    &e,
                )
            })?;

        let title = text(&created, "title").unwrap_or_else(|| self.title.clone());
        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind().resource_type(),
            id,
            title,
        ))
    }

    fn update(
        &self,
        _ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        let updated = api
            .put(&Self::path(&existing.id), &[], self.payload.clone())
            .map_err(|e| {
                ApplyError::remote(
                    self.kind(),
                    RemoteStep::Write(Operation::Update),
                    existing.id.clone(),
                    &e,
                )
            })?;

        let title = text(&updated, "title").unwrap_or_else(|| self.title.clone());
        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind().resource_type(),
            existing.id.clone(),
            title,
        ))
    }
}
