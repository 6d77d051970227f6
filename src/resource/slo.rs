//! SLO resource - service-level objectives

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::Value;

use super::{
    Existing, RemoteState, Resource, ResourceKind, created_id, label, require_version, text,
    without,
};
use crate::error::{ApplyError, RemoteStep};

const SLOS_PATH: &str = "/platform/slo/v1/slos";

const SERVER_FIELDS: &[&str] = &["id", "version"];

#[derive(Debug, Clone)]
pub struct Slo {
    pub id: Option<String>,
    pub name: String,
    payload: Value,
}

impl Slo {
    pub fn from_document(document: &Value) -> Self {
        Self {
            id: text(document, "id"),
            name: text(document, "name").unwrap_or_default(),
            payload: without(document, SERVER_FIELDS),
        }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", SLOS_PATH, id)
    }
}

impl Resource for Slo {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Slo
    }

    fn name(&self) -> String {
        self.name.clone()
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
            .post(SLOS_PATH, body)
            .and_then(|created| {
                let id = created_id(&created, self.id.as_deref())?;
                Ok((created, id))
            })
            .map_err(|e| {
                ApplyError::remote(
                    self.kind(),
                    RemoteStep::Write(Operation::Create),
                    label(&self.name, self.id.as_deref()),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind().resource_type(),
            id,
            text(&created, "name").unwrap_or_else(|| self.name.clone()),
        ))
    }

    fn update(
        &self,
        _ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        let version = require_version(self.kind(), existing)?;

        api.put(
            &Self::path(&existing.id),
            &[("optimistic-locking-version", version)],
            self.payload.clone(),
        )
        .map_err(|e| {
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
            self.name.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiclient::{Method, MockTransport};
    use declarative::NoReport;
    use serde_json::json;

    fn slo() -> Slo {
        Slo::from_document(&json!({
            "id": "slo-1",
            "version": "stale",
            "name": "Availability",
            "criteria": [{"target": 99.5}]
        }))
    }

    #[test]
    fn test_update_uses_version_from_read() {
        let api = MockTransport::new();
        api.respond(
            Method::Get,
            "/platform/slo/v1/slos/slo-1",
            json!({"id": "slo-1", "version": "v7", "name": "Availability"}),
        );
        api.respond(Method::Put, "/platform/slo/v1/slos/slo-1", Value::Null);

        let resource = slo();
        let RemoteState::Present(existing) = resource.current_state(&api).unwrap() else {
            panic!("expected present");
        };
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        let outcome = resource.update(&mut ctx, &api, &existing).unwrap();

        assert!(!outcome.is_created());
        let put = api.last(Method::Put).unwrap();
        assert_eq!(put.query_value("optimistic-locking-version"), Some("v7"));
        let body = put.body.unwrap();
        assert!(body.get("version").is_none());
        assert!(body.get("id").is_none());
    }

    #[test]
    fn test_missing_slo_is_created_with_supplied_id() {
        let api = MockTransport::new();
        api.respond(Method::Post, SLOS_PATH, json!({"id": "slo-1"}));
        let resource = slo();
        assert_eq!(resource.current_state(&api).unwrap(), RemoteState::Absent);

        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        let outcome = resource.create(&mut ctx, &api).unwrap();
        assert!(outcome.is_created());
        assert_eq!(api.last(Method::Post).unwrap().body.unwrap()["id"], "slo-1");
    }

    #[test]
    fn test_create_keeps_sent_id_when_response_has_none() {
        let api = MockTransport::new();
        api.respond(Method::Post, SLOS_PATH, json!({}));
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        let outcome = slo().create(&mut ctx, &api).unwrap();
        assert_eq!(outcome.id, "slo-1");
    }

    #[test]
    fn test_conflict_on_update_is_version_conflict() {
        let api = MockTransport::new();
        api.fail(Method::Put, "/platform/slo/v1/slos/slo-1", 409, "stale");
        let existing = Existing::from_body("slo-1", json!({"version": "v1"}), "version");
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        let err = slo().update(&mut ctx, &api, &existing).unwrap_err();
        assert!(err.to_string().contains("version conflict"));
    }
}
