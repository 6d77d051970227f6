//! # apiclient
//!
//! Blocking transport for the platform REST API.
//!
//! This crate provides:
//! - A [`Transport`] trait issuing JSON requests against a relative path
//! - [`HttpTransport`], the `ureq` implementation used by the CLI
//! - [`MockTransport`], an in-memory transport that records every request
//! - Categorized errors ([`ErrorCategory`]) so callers can turn status codes
//!   into domain messages
//!
//! ## Example
//!
//! ```no_run
//! use apiclient::{HttpTransport, Transport};
//!
//! let api = HttpTransport::new("https://abc123.apps.example.com", "dt0s16.TOKEN")?;
//! let workflow = api.get("/platform/automation/v1/workflows/my-id")?;
//! println!("{}", workflow["title"]);
//! # Ok::<(), apiclient::Error>(())
//! ```
//!
//! ## Testing
//!
//! ```
//! use apiclient::{Method, MockTransport, Transport};
//! use serde_json::json;
//!
//! let api = MockTransport::new();
//! api.respond(Method::Get, "/things/1", json!({"id": "1"}));
//!
//! assert_eq!(api.get("/things/1").unwrap()["id"], "1");
//! assert!(api.get("/things/2").unwrap_err().is_not_found());
//! assert_eq!(api.calls().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod transport;

pub use error::{Error, ErrorCategory, Result};
pub use transport::http::HttpTransport;
pub use transport::mock::{MockTransport, RecordedCall};
pub use transport::{Method, Request, Transport};
