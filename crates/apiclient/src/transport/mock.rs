//! In-memory transport for testing without network access.
//!
//! Routes are keyed by method and path (query ignored). Unrouted requests
//! answer 404, which is what an existence check against an empty
//! environment sees.

use crate::error::{Error, Result};
use crate::transport::{Method, Request, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A request seen by [`MockTransport`].
pub type RecordedCall = Request;

#[derive(Debug, Clone)]
enum Reply {
    Body(Value),
    Status(u16, String),
}

/// Mock transport recording every request.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockTransport {
    /// Create a mock with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON body.
    pub fn respond(&self, method: Method, path: impl Into<String>, body: Value) -> &Self {
        lock(&self.routes).insert((method, path.into()), Reply::Body(body));
        self
    }

    /// Answer `method path` with an error status.
    pub fn fail(
        &self,
        method: Method,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> &Self {
        lock(&self.routes).insert((method, path.into()), Reply::Status(status, message.into()));
        self
    }

    /// All requests in the order they were issued.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Requests that would have changed remote state.
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method.is_mutating())
            .collect()
    }

    /// The last request issued with `method`.
    pub fn last(&self, method: Method) -> Option<RecordedCall> {
        self.calls().into_iter().rev().find(|c| c.method == method)
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: Request) -> Result<Value> {
        let key = (request.method, request.path.clone());
        lock(&self.calls).push(request);

        match lock(&self.routes).get(&key) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status, message)) => Err(Error::status(*status, message.clone())),
            None => Err(Error::status(404, format!("no route for {} {}", key.0, key.1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unrouted_request_is_not_found() {
        let mock = MockTransport::new();
        let err = mock.get("/nothing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn test_routes_ignore_query() {
        let mock = MockTransport::new();
        mock.respond(Method::Put, "/a", json!({"ok": true}));
        let value = mock.put("/a", &[("v", "1")], json!({})).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(mock.last(Method::Put).unwrap().query_value("v"), Some("1"));
    }

    #[test]
    fn test_failure_route() {
        let mock = MockTransport::new();
        mock.fail(Method::Post, "/b", 409, "exists");
        let err = mock.post("/b", json!({})).unwrap_err();
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(mock.mutations().len(), 1);
    }
}
