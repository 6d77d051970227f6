//! Document resource - dashboards and notebooks
//!
//! The existence check reads only the metadata endpoint, which carries the
//! optimistic-locking version and owner. Full content is fetched only when a
//! diff is requested.

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::{Map, Value, json};

use super::extract::extract;
use super::{
    Existing, RemoteState, Resource, ResourceKind, created_id, is_uuid, require_version, text,
};
use crate::error::{ApplyError, RemoteStep};

const DOCUMENTS_PATH: &str = "/platform/document/v1/documents";

/// A dashboard or notebook
#[derive(Debug, Clone)]
pub struct Document {
    kind: ResourceKind,
    /// Supplied identity, if any
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    payload: Value,
    warnings: Vec<String>,
}

impl Document {
    /// Build from a classified document; `kind` is Dashboard or Notebook
    pub fn from_document(document: &Value, kind: ResourceKind) -> Self {
        let extracted = extract(document, kind);
        Self {
            kind,
            id: text(document, "id"),
            name: extracted.name,
            description: extracted.description,
            payload: extracted.payload,
            warnings: extracted.warnings,
        }
    }

    fn metadata_path(id: &str) -> String {
        format!("{}/{}/metadata", DOCUMENTS_PATH, id)
    }

    fn content_path(id: &str) -> String {
        format!("{}/{}/content", DOCUMENTS_PATH, id)
    }

    fn document_type(&self) -> &'static str {
        match self.kind {
            ResourceKind::Notebook => "notebook",
            _ => "dashboard",
        }
    }

    fn write_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(self.name));
        body.insert("type".to_string(), json!(self.document_type()));
        if let Some(description) = &self.description {
            body.insert("description".to_string(), json!(description));
        }
        body.insert("content".to_string(), self.payload.clone());
        body
    }

    fn write_error(&self, op: Operation, target: &str, err: &apiclient::Error) -> ApplyError {
        ApplyError::remote(self.kind, RemoteStep::Write(op), target, err)
    }
}

impl Resource for Document {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        let Some(id) = &self.id else {
            return Ok(RemoteState::Absent);
        };

        match api.get(&Self::metadata_path(id)) {
            Ok(metadata) => Ok(RemoteState::Present(Existing::from_body(
                id.clone(),
                metadata,
                "version",
            ))),
            Err(e) if e.is_not_found() => Ok(RemoteState::Absent),
            Err(e) => Err(ApplyError::remote(self.kind, RemoteStep::Read, id.clone(), &e).into()),
        }
    }

    fn desired_state(&self) -> Value {
        self.payload.clone()
    }

    fn current_content(&self, api: &dyn Transport, existing: &Existing) -> Result<Value> {
        api.get(&Self::content_path(&existing.id)).map_err(|e| {
            ApplyError::remote(self.kind, RemoteStep::Read, existing.id.clone(), &e).into()
        })
    }

    fn create(&self, ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        let mut body = self.write_body();
        let mut sent_id = None;
        if let Some(id) = &self.id {
            if is_uuid(id) {
                ctx.note(&format!(
                    "{} '{}' not found; UUID-shaped IDs cannot be chosen on create, so the {} will get a new ID",
                    self.kind, id, self.kind
                ));
            } else {
                body.insert("id".to_string(), json!(id));
                sent_id = Some(id.as_str());
            }
        }

        let created = api
            .post(DOCUMENTS_PATH, Value::Object(body))
            .map_err(|e| self.write_error(Operation::Create, &self.name, &e))?;

        let id = created_id(&created, sent_id)
            .map_err(|e| self.write_error(Operation::Create, &self.name, &e))?;
        let name = text(&created, "name").unwrap_or_else(|| self.name.clone());
        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind.resource_type(),
            id,
            name,
        ))
    }

    fn update(
        &self,
        _ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        let version = require_version(self.kind(), existing)?;

        let mut body = self.write_body();
        body.remove("type");
        api.patch(
            &format!("{}/{}", DOCUMENTS_PATH, existing.id),
            &[("optimistic-locking-version", version)],
            Value::Object(body),
        )
        .map_err(|e| self.write_error(Operation::Update, &existing.id, &e))?;

        // Re-read for the canonical name; the update already succeeded
        let name = match api.get(&Self::metadata_path(&existing.id)) {
            Ok(metadata) => text(&metadata, "name").unwrap_or_else(|| self.name.clone()),
            Err(e) => {
                log::debug!("Could not re-read {} metadata: {}", existing.id, e);
                self.name.clone()
            }
        };

        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind.resource_type(),
            existing.id.clone(),
            name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::Recorder;
    use apiclient::{Method, MockTransport};
    use serde_json::json;

    const UUID_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn dashboard(id: Option<&str>) -> Document {
        let mut doc = json!({"name": "Ops", "type": "dashboard", "content": {"tiles": {}, "version": 15}});
        if let Some(id) = id {
            doc["id"] = json!(id);
        }
        Document::from_document(&doc, ResourceKind::Dashboard)
    }

    #[test]
    fn test_existence_check_reads_metadata_only() {
        let api = MockTransport::new();
        api.respond(
            Method::Get,
            format!("{}/d1/metadata", DOCUMENTS_PATH),
            json!({"id": "d1", "name": "Ops", "version": 4, "owner": "u1"}),
        );
        let state = dashboard(Some("d1")).current_state(&api).unwrap();
        let RemoteState::Present(existing) = state else {
            panic!("expected present");
        };
        assert_eq!(existing.version.as_deref(), Some("4"));
        assert_eq!(existing.owner.as_deref(), Some("u1"));
        assert_eq!(api.calls().len(), 1);
        assert!(api.calls()[0].path.ends_with("/metadata"));
    }

    #[test]
    fn test_create_discards_uuid_id_with_note() {
        let api = MockTransport::new();
        api.respond(Method::Post, DOCUMENTS_PATH, json!({"id": "new-id", "name": "Ops"}));
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let outcome = dashboard(Some(UUID_ID)).create(&mut ctx, &api).unwrap();
        drop(ctx);

        assert_eq!(outcome.id, "new-id");
        let body = api.last(Method::Post).unwrap().body.unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["type"], "dashboard");
        assert_eq!(recorder.notes.len(), 1);
        assert!(recorder.notes[0].contains(UUID_ID));
    }

    #[test]
    fn test_create_keeps_non_uuid_id() {
        let api = MockTransport::new();
        api.respond(Method::Post, DOCUMENTS_PATH, json!({"id": "my-dash"}));
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);
        dashboard(Some("my-dash")).create(&mut ctx, &api).unwrap();
        drop(ctx);

        let body = api.last(Method::Post).unwrap().body.unwrap();
        assert_eq!(body["id"], "my-dash");
        assert!(recorder.notes.is_empty());
    }

    #[test]
    fn test_create_response_without_id_is_an_error() {
        let api = MockTransport::new();
        api.respond(Method::Post, DOCUMENTS_PATH, json!({}));
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let err = dashboard(Some(UUID_ID)).create(&mut ctx, &api).unwrap_err();

        let Some(ApplyError::Remote { message, .. }) = err.downcast_ref::<ApplyError>() else {
            panic!("expected a remote error, got {:#}", err);
        };
        assert!(message.contains("no id"));
    }

    #[test]
    fn test_create_response_without_id_falls_back_to_sent_id() {
        let api = MockTransport::new();
        api.respond(Method::Post, DOCUMENTS_PATH, json!({}));
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let outcome = dashboard(Some("my-dash")).create(&mut ctx, &api).unwrap();

        assert_eq!(outcome.id, "my-dash");
    }

    #[test]
    fn test_update_sends_observed_version() {
        let api = MockTransport::new();
        api.respond(Method::Patch, format!("{}/d1", DOCUMENTS_PATH), json!({}));
        api.respond(
            Method::Get,
            format!("{}/d1/metadata", DOCUMENTS_PATH),
            json!({"id": "d1", "name": "Ops (renamed)", "version": 5}),
        );
        let existing = Existing::from_body("d1", json!({"version": 4}), "version");
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let outcome = dashboard(Some("d1"))
            .update(&mut ctx, &api, &existing)
            .unwrap();

        let patch = api.last(Method::Patch).unwrap();
        assert_eq!(patch.query_value("optimistic-locking-version"), Some("4"));
        assert_eq!(patch.body.unwrap()["content"]["version"], 15);
        assert_eq!(outcome.name, "Ops (renamed)");
    }

    #[test]
    fn test_stale_version_fails_loudly() {
        let api = MockTransport::new();
        api.fail(Method::Patch, format!("{}/d1", DOCUMENTS_PATH), 409, "version mismatch");
        let existing = Existing::from_body("d1", json!({"version": 4}), "version");
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let err = dashboard(Some("d1"))
            .update(&mut ctx, &api, &existing)
            .unwrap_err();
        assert!(err.to_string().contains("version conflict"));
    }

    #[test]
    fn test_update_without_version_is_refused() {
        let api = MockTransport::new();
        let existing = Existing::from_body("d1", json!({}), "version");
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);
        assert!(dashboard(Some("d1")).update(&mut ctx, &api, &existing).is_err());
        assert!(api.mutations().is_empty());
    }
}
