use crate::resources::Kind;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edcform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Declare EDC assets, policies and contract definitions and keep the connector in sync",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Manifest declaring the provider and resources (.toml or .json)
    #[arg(
        short,
        long,
        env = "EDCFORM_FILE",
        default_value = "edcform.toml",
        global = true
    )]
    pub file: PathBuf,

    /// State file recording the last-known remote records
    #[arg(
        long,
        env = "EDCFORM_STATE",
        default_value = "edcform.state.json",
        global = true
    )]
    pub state: PathBuf,

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
    /// Check the manifest and the provider configuration
    Validate,

    /// Show what apply would change
    Plan(TargetArgs),

    /// Create, reconcile and delete resources to match the manifest
    Apply(ApplyArgs),

    /// Re-read every recorded resource from the connector
    Refresh(TargetArgs),

    /// Adopt an existing remote record into state
    Import {
        /// Resource address, e.g. asset.raw
        address: String,

        /// Remote identifier
        id: String,
    },

    /// Delete every recorded resource
    Destroy(DestroyArgs),

    /// Look up a remote record by identifier
    Get {
        #[arg(value_enum)]
        kind: Kind,

        /// Remote identifier
        id: String,
    },

    /// Print the schema of a resource kind as JSON
    Schema {
        #[arg(value_enum)]
        kind: Kind,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Lifecycle Arguments
// ============================================================================

#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Only act on a resource type or address (asset, policies, asset.raw)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,

    /// Number of resources processed concurrently
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "edcform", "-vv", "apply", "--target", "asset.raw", "--jobs", "2", "--yes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.target.target.as_deref(), Some("asset.raw"));
        assert_eq!(args.jobs, 2);
        assert!(args.yes);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_kind_argument() {
        let cli =
            Cli::try_parse_from(["edcform", "get", "contract-definition", "cd-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Get {
                kind: Kind::ContractDefinition,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["edcform", "schema", "dataplane"]).is_err());
    }
}
