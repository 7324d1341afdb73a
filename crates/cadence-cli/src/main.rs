mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::sprint::SprintSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Sprint workflow automation: gate tool use per workflow step and advance on completion",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .project-state.json or .git/)
    #[arg(long, global = true, env = "CADENCE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project state file
    Init {
        project_name: String,

        /// Initial sprint id
        #[arg(long, default_value = "01")]
        sprint: String,
    },

    /// Show the project state
    State,

    /// Activate automation
    Start,

    /// Pause automation, snapshotting current state for exact resumption
    Pause,

    /// Resume from a pause snapshot
    Resume,

    /// Stop automation
    Stop,

    /// Pre-check hook: gate the tool invocation read from stdin
    PreTool {
        /// Block instead of allow when the state store is unavailable
        #[arg(long)]
        fail_closed: bool,
    },

    /// Post-check hook: fold the tool event from stdin into step progress
    PostTool,

    /// Test the current step for completion and advance the workflow
    Advance {
        /// Sprint-count boundary; integration past this sprint completes the project
        #[arg(long)]
        total_sprints: Option<u32>,
    },

    /// Manage sprints
    Sprint {
        #[command(subcommand)]
        subcommand: SprintSubcommand,
    },

    /// Snapshot the state document into .cadence/backups/
    Backup,

    /// Replace the state document with a snapshot
    Restore { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout stays machine-parseable for hooks.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = root::resolve_root(cli.root.as_deref());

    match cli.command {
        Commands::Init {
            project_name,
            sprint,
        } => cmd::init::run(&root, &project_name, &sprint, cli.json),
        Commands::State => cmd::state::run(&root, cli.json),
        Commands::Start => cmd::lifecycle::start(&root, cli.json),
        Commands::Pause => cmd::lifecycle::pause(&root, cli.json),
        Commands::Resume => cmd::lifecycle::resume(&root, cli.json),
        Commands::Stop => cmd::lifecycle::stop(&root, cli.json),
        Commands::PreTool { fail_closed } => cmd::pre_tool::run(&root, fail_closed),
        Commands::PostTool => cmd::post_tool::run(&root),
        Commands::Advance { total_sprints } => cmd::advance::run(&root, total_sprints, cli.json),
        Commands::Sprint { subcommand } => cmd::sprint::run(&root, subcommand, cli.json),
        Commands::Backup => cmd::backup::backup(&root),
        Commands::Restore { path } => cmd::backup::restore(&root, &path, cli.json),
    }
}
