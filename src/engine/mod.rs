//! Apply engine
//!
//! The engine orchestrates:
//! 1. Normalizing - YAML/JSON bytes to canonical JSON, then template variables
//! 2. Classifying - one resource kind per document
//! 3. Planning - typed, validated resources for that kind
//! 4. Executing - create or update each resource, or preview it on a dry run

pub mod differ;
pub mod executor;
pub mod planner;

use anyhow::Result;
use apiclient::Transport;
use declarative::{ApplyContext, ApplyOutcome, Preview, Reporter, SafetyChecker};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ApplyError;
use crate::resource::ResourceKind;
use crate::resource::classify::classify;
use crate::{input, template};

pub use executor::{preview, reconcile};
pub use planner::plan;

/// Options for one apply invocation
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Template variables substituted before classification
    pub variables: BTreeMap<String, String>,
    /// Preview only; issue read calls but never mutate
    pub dry_run: bool,
    /// Render a positional diff of current vs desired payload
    pub show_diff: bool,
    /// Accepted but not consulted by the safety policy yet
    pub force: bool,
}

/// Result of an apply invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyReport {
    Applied(Vec<ApplyOutcome>),
    Previewed(Vec<Preview>),
}

impl ApplyReport {
    /// Number of resources the document declared
    pub fn len(&self) -> usize {
        match self {
            Self::Applied(outcomes) => outcomes.len(),
            Self::Previewed(previews) => previews.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Applies declared documents against one environment
pub struct Applier<'a> {
    api: &'a dyn Transport,
    safety: Option<SafetyChecker>,
}

impl<'a> Applier<'a> {
    pub fn new(api: &'a dyn Transport) -> Self {
        Self { api, safety: None }
    }

    /// Attach the active safety policy; `None` allows everything
    pub fn with_safety(mut self, safety: Option<SafetyChecker>) -> Self {
        self.safety = safety;
        self
    }

    /// Apply raw YAML or JSON input
    pub fn apply(
        &self,
        input: &[u8],
        opts: &ApplyOptions,
        reporter: &mut dyn Reporter,
    ) -> Result<ApplyReport> {
        let normalized = input::normalize(input)?;
        let rendered = template::render(&normalized, &opts.variables)?;
        let document: Value = serde_json::from_str(&rendered).map_err(|e| {
            ApplyError::input(format!("document is not valid JSON after substitution: {}", e))
        })?;

        let kind = classify(&document)?;
        self.apply_document(kind, &document, opts, reporter)
    }

    /// Apply an already classified document
    pub fn apply_document(
        &self,
        kind: ResourceKind,
        document: &Value,
        opts: &ApplyOptions,
        reporter: &mut dyn Reporter,
    ) -> Result<ApplyReport> {
        let resources = plan(kind, document)?;
        if opts.force {
            log::debug!("--force given; the safety policy does not consult it");
        }

        let mut ctx = ApplyContext::new(reporter)
            .with_safety(self.safety.as_ref())
            .dry_run(opts.dry_run)
            .show_diff(opts.show_diff)
            .force(opts.force);

        if ctx.dry_run {
            let previews = resources
                .iter()
                .map(|r| preview(r.as_ref(), &mut ctx, self.api))
                .collect();
            return Ok(ApplyReport::Previewed(previews));
        }

        let mut outcomes = Vec::with_capacity(resources.len());
        for resource in &resources {
            outcomes.push(reconcile(resource.as_ref(), &mut ctx, self.api)?);
        }
        Ok(ApplyReport::Applied(outcomes))
    }
}
