//! Bucket resource - Grail storage bucket definitions
//!
//! The bucket name is the identity; there is no separate ID. Only
//! `displayName` and `retentionDays` can change after creation, so updates
//! send that subset.

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::{Map, Value};

use super::{Existing, RemoteState, Resource, ResourceKind, require_version, text, without};
use crate::error::{ApplyError, RemoteStep};

const BUCKETS_PATH: &str = "/platform/storage/management/v1/bucket-definitions";

/// Fields accepted by a bucket update
const MUTABLE_FIELDS: &[&str] = &["displayName", "retentionDays"];

const SERVER_FIELDS: &[&str] = &["version", "status", "updatable", "metricInterval"];

#[derive(Debug, Clone)]
pub struct Bucket {
    pub bucket_name: String,
    payload: Value,
}

impl Bucket {
    pub fn from_document(document: &Value) -> Result<Self, ApplyError> {
        let bucket_name = text(document, "bucketName").ok_or(ApplyError::MissingField {
            kind: ResourceKind::Bucket,
            fields: vec!["bucketName"],
        })?;
        Ok(Self {
            bucket_name,
            payload: without(document, SERVER_FIELDS),
        })
    }

    fn path(&self) -> String {
        format!("{}/{}", BUCKETS_PATH, self.bucket_name)
    }

    /// The reduced body sent on update
    fn update_body(&self) -> Value {
        let mut body = Map::new();
        for field in MUTABLE_FIELDS {
            if let Some(v) = self.payload.get(*field) {
                body.insert((*field).to_string(), v.clone());
            }
        }
        Value::Object(body)
    }

    fn display_name(&self) -> String {
        text(&self.payload, "displayName").unwrap_or_else(|| self.bucket_name.clone())
    }
}

impl Resource for Bucket {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Bucket
    }

    fn name(&self) -> String {
        self.display_name()
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        match api.get(&self.path()) {
            Ok(body) => Ok(RemoteState::Present(Existing::from_body(
                self.bucket_name.clone(),
                body,
                "version",
            ))),
            Err(e) if e.is_not_found() => Ok(RemoteState::Absent),
            Err(e) => Err(ApplyError::remote(
                self.kind(),
                RemoteStep::Read,
                self.bucket_name.clone(),
                &e,
            )
            .into()),
        }
    }

    fn desired_state(&self) -> Value {
        self.payload.clone()
    }

    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(without(&existing.body, SERVER_FIELDS))
    }

    fn create(&self, _ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        api.post(BUCKETS_PATH, self.payload.clone()).map_err(|e| {
            ApplyError::remote(
                self.kind(),
                RemoteStep::Write(Operation::Create),
                self.bucket_name.clone(),
                &e,
            )
        })?;

        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind().resource_type(),
            self.bucket_name.clone(),
            self.display_name(),
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
            &self.path(),
            &[("optimistic-locking-version", version)],
            self.update_body(),
        )
        .map_err(|e| {
            ApplyError::remote(
                self.kind(),
                RemoteStep::Write(Operation::Update),
                self.bucket_name.clone(),
                &e,
            )
        })?;

        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind().resource_type(),
            self.bucket_name.clone(),
            self.display_name(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiclient::{Method, MockTransport};
    use declarative::NoReport;
    use serde_json::json;

    const PATH: &str = "/platform/storage/management/v1/bucket-definitions/logs_audit";

    fn bucket() -> Bucket {
        Bucket::from_document(&json!({
            "bucketName": "logs_audit",
            "table": "logs",
            "displayName": "Audit logs",
            "retentionDays": 35
        }))
        .unwrap()
    }

    #[test]
    fn test_existence_check_is_by_name() {
        let api = MockTransport::new();
        let state = bucket().current_state(&api).unwrap();
        assert_eq!(state, RemoteState::Absent);
        assert_eq!(api.calls()[0].path, PATH);
    }

    #[test]
    fn test_create_sends_full_payload() {
        let api = MockTransport::new();
        api.respond(Method::Post, BUCKETS_PATH, json!({}));
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        let outcome = bucket().create(&mut ctx, &api).unwrap();

        assert_eq!(outcome.id, "logs_audit");
        let body = api.last(Method::Post).unwrap().body.unwrap();
        assert_eq!(body["table"], "logs");
        assert_eq!(body["bucketName"], "logs_audit");
    }

    #[test]
    fn test_update_sends_reduced_subset() {
        let api = MockTransport::new();
        api.respond(Method::Put, PATH, json!({}));
        let existing = Existing::from_body("logs_audit", json!({"version": 3}), "version");
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);
        bucket().update(&mut ctx, &api, &existing).unwrap();

        let put = api.last(Method::Put).unwrap();
        assert_eq!(put.query_value("optimistic-locking-version"), Some("3"));
        assert_eq!(
            put.body.unwrap(),
            json!({"displayName": "Audit logs", "retentionDays": 35})
        );
    }

    #[test]
    fn test_missing_bucket_name_is_rejected() {
        let err = Bucket::from_document(&json!({"bucketName": "", "table": "logs"})).unwrap_err();
        assert!(err.to_string().contains("bucketName"));
    }
}
