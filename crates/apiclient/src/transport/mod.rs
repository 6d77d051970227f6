//! Transport trait and request types.
//!
//! The [`Transport`] trait abstracts how requests reach the API so the apply
//! engine can run against the real HTTP client or the in-memory
//! [`mock::MockTransport`].

pub mod http;
pub mod mock;

use crate::error::Result;
use serde_json::Value;
use std::fmt;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
}

impl Method {
    /// Whether the method changes remote state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// A request against a path relative to the environment URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Path starting with `/`.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body for mutating requests.
    pub body: Option<Value>,
}

impl Request {
    /// Create a request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Issues requests and returns decoded JSON bodies.
///
/// Non-success statuses come back as [`crate::Error::Status`]; an empty
/// success body decodes to `Value::Null`.
pub trait Transport {
    /// Execute a request.
    fn execute(&self, request: Request) -> Result<Value>;

    /// GET a path.
    fn get(&self, path: &str) -> Result<Value> {
        self.execute(Request::new(Method::Get, path))
    }

    /// GET a path with query parameters.
    fn get_with(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut request = Request::new(Method::Get, path);
        for (k, v) in query {
            request = request.query(*k, *v);
        }
        self.execute(request)
    }

    /// POST a JSON body.
    fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Request::new(Method::Post, path).body(body))
    }

    /// PUT a JSON body.
    fn put(&self, path: &str, query: &[(&str, &str)], body: Value) -> Result<Value> {
        let mut request = Request::new(Method::Put, path).body(body);
        for (k, v) in query {
            request = request.query(*k, *v);
        }
        self.execute(request)
    }

    /// PATCH a JSON body.
    fn patch(&self, path: &str, query: &[(&str, &str)], body: Value) -> Result<Value> {
        let mut request = Request::new(Method::Patch, path).body(body);
        for (k, v) in query {
            request = request.query(*k, *v);
        }
        self.execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: Request) -> Result<Value> {
        (**self).execute(request)
    }
}
