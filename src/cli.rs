use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glvar")]
#[command(version)]
#[command(about = "Declarative management of GitLab group CI/CD variables", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/glvar/glvar.toml)
    #[arg(long, global = true, env = "GLVAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: ~/.local/state/glvar/state.toml)
    #[arg(long, global = true, env = "GLVAR_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Refresh state and show what apply would change
    Plan(PlanArgs),

    /// Make GitLab match the configuration
    Apply(ApplyArgs),

    /// Re-read every managed variable and update state
    Refresh,

    /// Bring an existing variable under management
    Import {
        /// Address to record it under, e.g. gitlab_group_variable.deploy_token
        address: String,

        /// Identifier in the form group:key
        id: String,
    },

    /// Show managed instances recorded in state
    Show,

    /// Edit the state file directly
    #[command(subcommand)]
    State(StateCommand),

    /// Delete every managed variable from GitLab
    Destroy(DestroyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Only plan a resource type or a single instance (type or type.name)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would change without touching GitLab
    #[arg(long)]
    pub dry_run: bool,

    /// Number of variables applied concurrently
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Only apply a resource type or a single instance (type or type.name)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Only destroy a resource type or a single instance (type or type.name)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// Forget an instance without deleting the variable
    Rm {
        /// Address of the instance, e.g. gitlab_group_variable.deploy_token
        address: String,
    },
}
