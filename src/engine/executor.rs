//! Executor - the shared create-or-update driver
//!
//! Every kind goes through the same sequence: existence check, ownership,
//! safety gate, then exactly one mutating call. Previews run the same reads
//! and stop before the mutation.

use anyhow::Result;
use apiclient::Transport;
use declarative::{ApplyContext, ApplyOutcome, Operation, PlannedAction, Preview, diff_json};
use serde_json::Value;

use crate::error::ApplyError;
use crate::resource::{RemoteState, Resource};

/// Reconcile one resource against the live environment
pub fn reconcile(
    resource: &dyn Resource,
    ctx: &mut ApplyContext,
    api: &dyn Transport,
) -> Result<ApplyOutcome> {
    let kind = resource.kind();
    ctx.start(kind.resource_type(), &resource.name());
    for warning in resource.warnings() {
        ctx.warn(warning);
    }

    let outcome = match resource.current_state(api)? {
        RemoteState::Absent => {
            log::debug!("{} '{}' does not exist; creating", kind, resource.name());
            ctx.authorize(Operation::Create, None)
                .map_err(ApplyError::Policy)?;
            if ctx.show_diff {
                ctx.diff(&diff_json(&Value::Null, &resource.desired_state()));
            }
            resource.create(ctx, api)?
        }
        RemoteState::Present(existing) => {
            log::debug!("{} '{}' exists ({}); updating", kind, resource.name(), existing.id);
            ctx.authorize(Operation::Update, existing.owner.as_deref())
                .map_err(ApplyError::Policy)?;
            if ctx.show_diff {
                match resource.current_content(api, &existing) {
                    Ok(current) => {
                        ctx.diff(&diff_json(&current, &resource.desired_state_for(&existing)));
                    }
                    Err(e) => ctx.warn(&format!("could not fetch current content for diff: {}", e)),
                }
            }
            resource.update(ctx, api, &existing)?
        }
    };

    Ok(outcome.with_warnings(resource.warnings().to_vec()))
}

/// Predict what [`reconcile`] would do, issuing read calls only
///
/// A failing read degrades the preview instead of failing it.
pub fn preview(resource: &dyn Resource, ctx: &mut ApplyContext, api: &dyn Transport) -> Preview {
    let kind = resource.kind();
    let name = resource.name();
    ctx.start(kind.resource_type(), &name);

    let mut warnings = resource.warnings().to_vec();
    for warning in &warnings {
        ctx.warn(warning);
    }

    let existing = match resource.current_state(api) {
        Ok(RemoteState::Present(existing)) => Some(existing),
        Ok(RemoteState::Absent) => None,
        Err(e) => {
            let message = format!("could not read current state of {} '{}': {:#}", kind, name, e);
            ctx.warn(&message);
            warnings.push(message);
            return Preview {
                resource_type: kind.resource_type().to_string(),
                name,
                planned: PlannedAction::Undetermined {
                    reason: e.to_string(),
                },
                denied: None,
                diff: None,
                warnings,
            };
        }
    };

    let planned = match &existing {
        Some(e) => PlannedAction::Update { id: e.id.clone() },
        None => PlannedAction::Create,
    };

    let denied = match &existing {
        Some(e) => ctx.authorize(Operation::Update, e.owner.as_deref()),
        None => ctx.authorize(Operation::Create, None),
    }
    .err()
    .map(|e| e.to_string());
    if let Some(reason) = &denied {
        log::info!("Apply would be denied: {}", reason);
    }

    let diff = if ctx.show_diff {
        let sides = match &existing {
            Some(e) => resource
                .current_content(api, e)
                .map(|current| (current, resource.desired_state_for(e))),
            None => Ok((Value::Null, resource.desired_state())),
        };
        match sides {
            Ok((current, desired)) => {
                let rendered = diff_json(&current, &desired);
                ctx.diff(&rendered);
                Some(rendered)
            }
            Err(e) => {
                let message = format!("could not fetch current content for diff: {}", e);
                ctx.warn(&message);
                warnings.push(message);
                None
            }
        }
    } else {
        None
    };

    Preview {
        resource_type: kind.resource_type().to_string(),
        name,
        planned,
        denied,
        diff,
        warnings,
    }
}
