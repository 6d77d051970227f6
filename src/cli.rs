use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dtctl")]
#[command(version)]
#[command(about = "Apply declarative resource documents to a platform environment", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or update the resources a document declares
    Apply(ApplyArgs),

    /// Preview what apply would change (apply --dry-run --show-diff)
    Diff(DiffArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Where the document comes from and how to render it
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Document to apply (YAML or JSON); `-` reads stdin
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Template variable, repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Context from config.toml (defaults to current-context)
    #[arg(long, env = "DTCTL_CONTEXT")]
    pub context: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Show a line diff of current vs desired content
    #[arg(long)]
    pub show_diff: bool,

    /// Accepted for compatibility; the safety policy ignores it
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::parse_from([
            "dtctl",
            "apply",
            "-f",
            "dash.yaml",
            "--set",
            "env=prod",
            "--set",
            "team=sre",
            "--dry-run",
            "--context",
            "dev",
        ]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.source.file, PathBuf::from("dash.yaml"));
        assert_eq!(args.source.set, vec!["env=prod", "team=sre"]);
        assert_eq!(args.source.context.as_deref(), Some("dev"));
        assert!(args.dry_run);
        assert!(!args.show_diff);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dtctl", "diff", "-f", "-", "-vv", "-q"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Diff(_)));
    }
}
