//! Positional diff between two payloads
//!
//! Both sides are pretty-printed and compared line by line at the same
//! position. This is not a structural diff: an inserted line shifts every
//! following line and shows up as a change. Whatever replaces it must keep
//! emitting [`NO_CHANGES`] for identical inputs.

use serde_json::Value;

/// Sentinel emitted when every line matches
pub const NO_CHANGES: &str = "(no changes)";

/// One differing position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    /// Old line with no counterpart at this position
    Removed(String),
    /// New line with no counterpart at this position
    Added(String),
    /// Both sides present but different
    Changed { old: String, new: String },
}

/// Compare two texts position by position
pub fn diff_lines(old: &str, new: &str) -> Vec<LineChange> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let len = old_lines.len().max(new_lines.len());

    let mut changes = Vec::new();
    for i in 0..len {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(o), Some(n)) if o == n => {}
            (Some(o), Some(n)) => changes.push(LineChange::Changed {
                old: (*o).to_string(),
                new: (*n).to_string(),
            }),
            (Some(o), None) => changes.push(LineChange::Removed((*o).to_string())),
            (None, Some(n)) => changes.push(LineChange::Added((*n).to_string())),
            (None, None) => {}
        }
    }
    changes
}

/// Render changes with `- ` / `+ ` prefixes, or [`NO_CHANGES`]
pub fn render(changes: &[LineChange]) -> String {
    if changes.is_empty() {
        return NO_CHANGES.to_string();
    }

    let mut out = Vec::with_capacity(changes.len() * 2);
    for change in changes {
        match change {
            LineChange::Removed(old) => out.push(format!("- {}", old)),
            LineChange::Added(new) => out.push(format!("+ {}", new)),
            LineChange::Changed { old, new } => {
                out.push(format!("- {}", old));
                out.push(format!("+ {}", new));
            }
        }
    }
    out.join("\n")
}

/// Pretty-print both payloads and render their positional diff
///
/// `Value::Null` on the old side stands for "does not exist yet", so every
/// new line renders as an addition.
pub fn diff_json(old: &Value, new: &Value) -> String {
    let old_text = pretty(old);
    let new_text = pretty(new);
    render(&diff_lines(&old_text, &new_text))
}

fn pretty(value: &Value) -> String {
    if value.is_null() {
        return String::new();
    }
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
