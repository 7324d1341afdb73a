use crate::output::print_json;
use anyhow::Context;
use cadence_core::store::StateStore;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SprintSubcommand {
    /// Close out the current sprint and move to another one's planning step
    Transition {
        /// Target sprint id (e.g. "02")
        id: String,

        /// Allow jumping past the next sprint
        #[arg(long)]
        force: bool,
    },
}

pub fn run(root: &Path, subcommand: SprintSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        SprintSubcommand::Transition { id, force } => {
            let state = StateStore::new(root)
                .transition_sprint(&id, force)
                .context("sprint transition failed")?;
            if json {
                print_json(&state)?;
            } else {
                println!(
                    "now at sprint {} (completed: {})",
                    state.current_sprint,
                    if state.completed_sprints.is_empty() {
                        "-".to_string()
                    } else {
                        state.completed_sprints.join(", ")
                    }
                );
            }
            Ok(())
        }
    }
}
