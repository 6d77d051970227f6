//! Connection resource - Azure and GCP hyperscaler authentication
//!
//! Connections are settings objects under a fixed schema. Without an
//! `objectId` the existing object is looked up by `value.name` and
//! `value.type`, so re-applying an exported file updates instead of
//! creating a duplicate.

use anyhow::Result;
use apiclient::Transport;
use declarative::{Action, ApplyContext, ApplyOutcome, Operation};
use serde_json::{Value, json};

use super::classify::{AZURE_CONNECTION_SCHEMA, GCP_CONNECTION_SCHEMA, connection_kind, schema_id};
use super::settings::{SETTINGS_OBJECTS_PATH, created_object_id, object_path};
use super::{Existing, RemoteState, Resource, ResourceKind, find_in_pages, text};
use crate::error::{ApplyError, RemoteStep};

const LOOKUP_PAGE_SIZE: &str = "500";

/// An Azure or GCP connection
#[derive(Debug, Clone)]
pub struct Connection {
    kind: ResourceKind,
    pub object_id: Option<String>,
    pub name: String,
    pub connection_type: Option<String>,
    value: Value,
}

impl Connection {
    /// Build one connection; `kind` is AzureConnection or GcpConnection
    ///
    /// Without an `objectId` the connection is identified by name and type,
    /// so both are required.
    pub fn from_document(document: &Value, kind: ResourceKind) -> Result<Self, ApplyError> {
        let value = document
            .get("value")
            .filter(|v| v.is_object())
            .ok_or(ApplyError::MissingField {
                kind,
                fields: vec!["value"],
            })?;
        let object_id = text(document, "objectId");
        let connection_type = text(value, "type");

        let mut missing = Vec::new();
        let name = text(value, "name");
        if name.is_none() {
            missing.push("value.name");
        }
        if object_id.is_none() && connection_type.is_none() {
            missing.push("value.type");
        }
        let Some(name) = name.filter(|_| missing.is_empty()) else {
            return Err(ApplyError::MissingField {
                kind,
                fields: missing,
            });
        };

        Ok(Self {
            kind,
            object_id,
            name,
            connection_type,
            value: value.clone(),
        })
    }

    /// Build every connection of a list; all elements must share one schema
    pub fn from_list(documents: &Value, kind: ResourceKind) -> Result<Vec<Self>, ApplyError> {
        let items = documents
            .as_array()
            .ok_or_else(|| ApplyError::input(format!("expected a list of {}s", kind)))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_kind = schema_id(item).and_then(connection_kind);
                if item_kind != Some(kind) {
                    return Err(ApplyError::input(format!(
                        "element {} of the connection list is not a {} (schemaId: {}); a list must not mix connection schemas",
                        i,
                        kind,
                        schema_id(item).unwrap_or("<missing>")
                    )));
                }
                Self::from_document(item, kind)
            })
            .collect()
    }

    fn schema(&self) -> &'static str {
        match self.kind {
            ResourceKind::GcpConnection => GCP_CONNECTION_SCHEMA,
            _ => AZURE_CONNECTION_SCHEMA,
        }
    }

    fn is_same(&self, value: &Value) -> bool {
        text(value, "name").as_deref() == Some(self.name.as_str())
            && text(value, "type") == self.connection_type
    }

    /// Find an existing connection by name and type
    fn lookup(&self, api: &dyn Transport) -> Result<Option<Existing>> {
        let found = find_in_pages(
            api,
            SETTINGS_OBJECTS_PATH,
            &[
                ("schemaIds", self.schema()),
                ("fields", "objectId,value,schemaVersion"),
                ("pageSize", LOOKUP_PAGE_SIZE),
            ],
            |item| item.get("value").is_some_and(|v| self.is_same(v)),
        )
        .map_err(|e| ApplyError::remote(self.kind, RemoteStep::Lookup, self.name.clone(), &e))?;

        Ok(found.map(|item| {
            let object_id = text(&item, "objectId").unwrap_or_default();
            log::info!(
                "Found existing {} '{}' ({}) by name",
                self.kind,
                self.name,
                object_id
            );
            Existing::from_body(object_id, item, "schemaVersion")
        }))
    }
}

impl Resource for Connection {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn current_state(&self, api: &dyn Transport) -> Result<RemoteState> {
        let Some(object_id) = &self.object_id else {
            return Ok(match self.lookup(api)? {
                Some(existing) => RemoteState::Present(existing),
                None => RemoteState::Absent,
            });
        };

        match api.get(&object_path(object_id)) {
            Ok(body) => Ok(RemoteState::Present(Existing::from_body(
                object_id.clone(),
                body,
                "schemaVersion",
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

    fn current_content(&self, _api: &dyn Transport, existing: &Existing) -> Result<Value> {
        Ok(existing.body.get("value").cloned().unwrap_or(Value::Null))
    }

    fn create(&self, ctx: &mut ApplyContext, api: &dyn Transport) -> Result<ApplyOutcome> {
        if let Some(object_id) = &self.object_id {
            ctx.note(&format!(
                "{} '{}' not found; creating a new connection (the service assigns the ID)",
                self.kind, object_id
            ));
        }

        let body = json!([{
            "schemaId": self.schema(),
            "scope": "environment",
            "value": self.value,
        }]);
        let object_id = api
            .post(SETTINGS_OBJECTS_PATH, body)
            .and_then(|response| created_object_id(&response))
            .map_err(|e| {
                ApplyError::remote(
                    self.kind,
                    RemoteStep::Write(Operation::Create),
                    self.name.clone(),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Created,
            self.kind.resource_type(),
            object_id,
            self.name.clone(),
        ))
    }

    fn update(
        &self,
        _ctx: &mut ApplyContext,
        api: &dyn Transport,
        existing: &Existing,
    ) -> Result<ApplyOutcome> {
        api.put(&object_path(&existing.id), &[], json!({"value": self.value}))
            .map_err(|e| {
                ApplyError::remote(
                    self.kind,
                    RemoteStep::Write(Operation::Update),
                    self.name.clone(),
                    &e,
                )
            })?;

        Ok(ApplyOutcome::new(
            Action::Updated,
            self.kind.resource_type(),
            existing.id.clone(),
            self.name.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::Recorder;
    use apiclient::{Method, MockTransport};
    use declarative::NoReport;

    fn azure(name: &str) -> Value {
        json!({
            "schemaId": AZURE_CONNECTION_SCHEMA,
            "value": {"name": name, "type": "federatedIdentityCredential", "federatedIdentityCredential": {}}
        })
    }

    #[test]
    fn test_lookup_by_name_and_type_turns_create_into_update() {
        let api = MockTransport::new();
        api.respond(
            Method::Get,
            SETTINGS_OBJECTS_PATH,
            json!({"items": [
                {"objectId": "other", "value": {"name": "prod", "type": "clientSecret"}},
                {"objectId": "obj-9", "value": {"name": "prod", "type": "federatedIdentityCredential"}}
            ]}),
        );
        let conn = Connection::from_document(&azure("prod"), ResourceKind::AzureConnection).unwrap();

        let RemoteState::Present(existing) = conn.current_state(&api).unwrap() else {
            panic!("expected present");
        };
        assert_eq!(existing.id, "obj-9");

        let lookup = &api.calls()[0];
        assert_eq!(lookup.query_value("schemaIds"), Some(AZURE_CONNECTION_SCHEMA));
    }

    #[test]
    fn test_lookup_miss_is_absent() {
        let api = MockTransport::new();
        api.respond(Method::Get, SETTINGS_OBJECTS_PATH, json!({"items": []}));
        let conn = Connection::from_document(&azure("new"), ResourceKind::AzureConnection).unwrap();
        assert_eq!(conn.current_state(&api).unwrap(), RemoteState::Absent);
    }

    #[test]
    fn test_create_and_update_bodies() {
        let api = MockTransport::new();
        api.respond(
            Method::Post,
            SETTINGS_OBJECTS_PATH,
            json!([{"code": 200, "objectId": "obj-1"}]),
        );
        api.respond(Method::Put, object_path("obj-1"), json!({}));
        let conn = Connection::from_document(&azure("prod"), ResourceKind::AzureConnection).unwrap();
        let mut report = NoReport;
        let mut ctx = ApplyContext::new(&mut report);

        let created = conn.create(&mut ctx, &api).unwrap();
        assert_eq!(created.id, "obj-1");
        let post = api.last(Method::Post).unwrap().body.unwrap();
        assert_eq!(post[0]["scope"], "environment");
        assert_eq!(post[0]["schemaId"], AZURE_CONNECTION_SCHEMA);

        let existing = Existing::from_body("obj-1", json!({}), "schemaVersion");
        conn.update(&mut ctx, &api, &existing).unwrap();
        let put = api.last(Method::Put).unwrap().body.unwrap();
        assert_eq!(put.as_object().unwrap().len(), 1);
        assert_eq!(put["value"]["name"], "prod");
    }

    #[test]
    fn test_list_yields_one_resource_per_element() {
        let list = json!([azure("a"), azure("b")]);
        let conns = Connection::from_list(&list, ResourceKind::AzureConnection).unwrap();
        assert_eq!(conns.len(), 2);
        assert_eq!(conns[1].name, "b");
    }

    #[test]
    fn test_list_mixing_schemas_is_rejected() {
        let list = json!([
            azure("a"),
            {"schemaId": GCP_CONNECTION_SCHEMA, "value": {"name": "g", "type": "serviceAccountImpersonation"}}
        ]);
        let err = Connection::from_list(&list, ResourceKind::AzureConnection).unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("mix"));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let doc = json!({"schemaId": GCP_CONNECTION_SCHEMA, "value": {"type": "x"}});
        let err = Connection::from_document(&doc, ResourceKind::GcpConnection).unwrap_err();
        assert!(err.to_string().contains("value.name"));
    }

    #[test]
    fn test_type_is_required_without_object_id() {
        let doc = json!({"schemaId": GCP_CONNECTION_SCHEMA, "value": {"name": "g"}});
        let err = Connection::from_document(&doc, ResourceKind::GcpConnection).unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("value.type"));

        let both = json!({"schemaId": GCP_CONNECTION_SCHEMA, "value": {}});
        let err = Connection::from_document(&both, ResourceKind::GcpConnection).unwrap_err();
        assert!(err.to_string().contains("value.name, value.type"));

        let addressed = json!({"schemaId": GCP_CONNECTION_SCHEMA, "objectId": "obj-1", "value": {"name": "g"}});
        assert!(Connection::from_document(&addressed, ResourceKind::GcpConnection).is_ok());
    }

    #[test]
    fn test_lookup_ignores_same_name_of_other_type() {
        let api = MockTransport::new();
        api.respond(
            Method::Get,
            SETTINGS_OBJECTS_PATH,
            json!({"items": [{"objectId": "other", "value": {"name": "prod", "type": "clientSecret"}}]}),
        );
        let conn = Connection::from_document(&azure("prod"), ResourceKind::AzureConnection).unwrap();
        assert_eq!(conn.current_state(&api).unwrap(), RemoteState::Absent);
    }

    #[test]
    fn test_missing_object_id_creates_with_note() {
        let api = MockTransport::new();
        api.respond(Method::Post, SETTINGS_OBJECTS_PATH, json!([{"objectId": "obj-new"}]));
        let mut doc = azure("prod");
        doc["objectId"] = json!("obj-gone");
        let conn = Connection::from_document(&doc, ResourceKind::AzureConnection).unwrap();
        let mut recorder = Recorder::default();
        let mut ctx = ApplyContext::new(&mut recorder);

        let outcome = conn.create(&mut ctx, &api).unwrap();
        drop(ctx);

        assert_eq!(outcome.id, "obj-new");
        assert_eq!(recorder.notes.len(), 1);
        assert!(recorder.notes[0].contains("obj-gone"));
    }
}
