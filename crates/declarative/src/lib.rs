//! # Declarative
//!
//! Primitives for applying declared resources against a remote system.
//!
//! This crate knows nothing about specific resource kinds or transports. It
//! provides the pieces every apply engine needs regardless of what it manages:
//!
//! ## Core Concepts
//!
//! - **Operation**: the mutating call about to be made (create or update)
//! - **Ownership**: whether the caller owns the target, derived per invocation
//! - **SafetyLevel**: the operator-configured policy tier
//! - **SafetyChecker**: the gate that allows or denies an operation
//! - **Positional diff**: line-by-line comparison of two JSON payloads
//! - **ApplyContext**: flags and callbacks handed to every reconciler
//!
//! ## Example
//!
//! ```
//! use declarative::{Operation, Ownership, SafetyChecker, SafetyLevel, resolve_ownership};
//!
//! let checker = SafetyChecker::new(SafetyLevel::ReadWriteMine, "u1");
//!
//! // A resource that does not exist yet has no owner to violate
//! assert!(checker.check(Operation::Create, Ownership::Unknown).is_ok());
//!
//! // Updating someone else's resource is denied at this level
//! let ownership = resolve_ownership("u2", checker.caller());
//! assert!(checker.check(Operation::Update, ownership).is_err());
//! ```
//!
//! ## Provider Traits
//!
//! - [`Reporter`]: receives notes, warnings and diffs while applying
//!
//! Keeping output behind a trait lets the engine run the same way under a
//! terminal, in tests, or embedded in another tool.

pub mod context;
pub mod diff;
pub mod safety;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoReport, Reporter};
pub use diff::{LineChange, NO_CHANGES, diff_json, diff_lines};
pub use safety::{SafetyChecker, SafetyError, resolve_ownership};
pub use types::{
    Action, ApplyOutcome, Operation, Ownership, PlannedAction, Preview, SafetyLevel,
};
