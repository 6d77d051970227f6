//! Diff and result display - terminal UI for the apply engine

use colored::Colorize;
use declarative::{ApplyOutcome, NO_CHANGES, Preview, Reporter};

use super::ApplyReport;

/// Reporter writing progress to the terminal
#[derive(Debug, Default)]
pub struct TerminalReporter {
    /// Suppress everything but warnings
    pub quiet: bool,
}

impl TerminalReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for TerminalReporter {
    fn on_resource_start(&mut self, resource_type: &str, name: &str) {
        if self.quiet {
            return;
        }
        let label = if name.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", name)
        };
        println!("  {} {}{}", "→".cyan(), resource_type, label);
    }

    fn on_note(&mut self, message: &str) {
        if !self.quiet {
            println!("    {} {}", "ℹ".blue(), message);
        }
    }

    fn on_warning(&mut self, message: &str) {
        eprintln!("    {} {}", "⚠".yellow(), message);
    }

    fn on_diff(&mut self, diff: &str) {
        if self.quiet {
            return;
        }
        println!();
        for line in colorize_diff(diff) {
            println!("    {}", line);
        }
        println!();
    }
}

/// Color diff lines by prefix
pub fn colorize_diff(diff: &str) -> Vec<String> {
    if diff == NO_CHANGES {
        return vec![NO_CHANGES.dimmed().to_string()];
    }
    diff.lines()
        .map(|line| {
            if line.starts_with("- ") {
                line.red().to_string()
            } else if line.starts_with("+ ") {
                line.green().to_string()
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// One result line for a live apply
pub fn outcome_line(outcome: &ApplyOutcome) -> String {
    let label = if outcome.name.is_empty() {
        outcome.resource_type.clone()
    } else {
        format!("{} \"{}\"", outcome.resource_type, outcome.name)
    };
    if outcome.id.is_empty() {
        format!("{} {}", outcome.action, label)
    } else {
        format!("{} {} ({})", outcome.action, label, outcome.id)
    }
}

fn print_preview(preview: &Preview) {
    match &preview.denied {
        Some(reason) => println!(
            "  {} {} {}",
            "✗".red(),
            preview.summary(),
            format!("- would be denied: {}", reason).red()
        ),
        None => println!("  {} {}", "ℹ".blue(), preview.summary()),
    }
}

/// Print the final report
pub fn print_report(report: &ApplyReport) {
    println!();
    match report {
        ApplyReport::Applied(outcomes) => {
            for outcome in outcomes {
                println!("  {} {}", "✓".green(), outcome_line(outcome));
            }
            let warnings: usize = outcomes.iter().map(|o| o.warnings.len()).sum();
            print_totals(
                outcomes.iter().filter(|o| o.is_created()).count(),
                outcomes.iter().filter(|o| !o.is_created()).count(),
                warnings,
            );
        }
        ApplyReport::Previewed(previews) => {
            for preview in previews {
                print_preview(preview);
            }
            println!();
            println!("  {} Dry run - no changes made", "ℹ".blue());
        }
    }
}

fn print_totals(created: usize, updated: usize, warnings: usize) {
    if created + updated > 1 {
        println!();
        if created > 0 {
            println!("    • {} resources created", created);
        }
        if updated > 0 {
            println!("    • {} resources updated", updated);
        }
    }
    if warnings > 0 {
        println!("    • {} {}", warnings, "warnings".yellow());
    }
}
