//! Apply context and reporter trait
//!
//! The reporter lets the apply engine emit progress text without
//! depending on a terminal UI.

use crate::safety::{SafetyChecker, SafetyError};
use crate::types::{Operation, Ownership};

/// Receives human-readable progress while applying
///
/// Nothing written here is a stable machine contract.
pub trait Reporter {
    /// Called before a resource is reconciled or previewed
    fn on_resource_start(&mut self, resource_type: &str, name: &str);

    /// Informational note (e.g. a supplied ID was discarded)
    fn on_note(&mut self, message: &str);

    /// Non-fatal structural concern
    fn on_warning(&mut self, message: &str);

    /// Rendered diff for the resource currently being processed
    fn on_diff(&mut self, diff: &str);
}

/// No-op reporter
pub struct NoReport;

impl Reporter for NoReport {
    fn on_resource_start(&mut self, _resource_type: &str, _name: &str) {}
    fn on_note(&mut self, _message: &str) {}
    fn on_warning(&mut self, _message: &str) {}
    fn on_diff(&mut self, _diff: &str) {}
}

/// Context passed to every reconciler
pub struct ApplyContext<'a> {
    /// Preview only, never mutate
    pub dry_run: bool,
    /// Render a diff before updating
    pub show_diff: bool,
    /// Reserved; accepted on the command line but not consulted by the policy
    pub force: bool,
    /// Active safety policy, `None` allows everything
    pub safety: Option<&'a SafetyChecker>,
    reporter: &'a mut dyn Reporter,
}

impl<'a> ApplyContext<'a> {
    pub fn new(reporter: &'a mut dyn Reporter) -> Self {
        Self {
            dry_run: false,
            show_diff: false,
            force: false,
            safety: None,
            reporter,
        }
    }

    pub fn with_safety(mut self, safety: Option<&'a SafetyChecker>) -> Self {
        self.safety = safety;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn show_diff(mut self, show_diff: bool) -> Self {
        self.show_diff = show_diff;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Gate a mutating call
    ///
    /// `owner` must be the owner recorded on the fetched resource; it is
    /// ignored for creates, which always check as [`Ownership::Unknown`].
    pub fn authorize(&self, operation: Operation, owner: Option<&str>) -> Result<(), SafetyError> {
        let Some(safety) = self.safety else {
            return Ok(());
        };
        let ownership = match operation {
            Operation::Create => Ownership::Unknown,
            Operation::Update => safety.ownership_of(owner),
        };
        safety.check(operation, ownership)
    }

    pub fn start(&mut self, resource_type: &str, name: &str) {
        self.reporter.on_resource_start(resource_type, name);
    }

    pub fn note(&mut self, message: &str) {
        log::info!("{}", message);
        self.reporter.on_note(message);
    }

    /// The reporter shows warnings; the log copy stays at debug
    pub fn warn(&mut self, message: &str) {
        log::debug!("warning: {}", message);
        self.reporter.on_warning(message);
    }

    pub fn diff(&mut self, diff: &str) {
        self.reporter.on_diff(diff);
    }
}
