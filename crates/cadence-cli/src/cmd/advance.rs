use crate::output::print_json;
use anyhow::Context;
use cadence_core::advance::{AdvanceController, AdvanceOutcome};
use cadence_core::store::StateStore;
use std::path::Path;

pub fn run(root: &Path, total_sprints: Option<u32>, json: bool) -> anyhow::Result<()> {
    let controller =
        AdvanceController::new(StateStore::new(root)).with_total_sprints(total_sprints);
    let outcome = controller.advance().context("workflow advancement failed")?;

    if json {
        return print_json(&outcome);
    }
    match outcome {
        AdvanceOutcome::AutomationInactive => println!("automation inactive; nothing to do"),
        AdvanceOutcome::NotComplete { step, message } => {
            println!("{step} not complete: {message}")
        }
        AdvanceOutcome::Advanced { from, to } => println!("advanced {from} -> {to}"),
        AdvanceOutcome::SprintCompleted {
            sprint,
            next_sprint,
        } => println!("sprint {sprint} completed; starting sprint {next_sprint}"),
        AdvanceOutcome::ProjectCompleted { final_sprint } => {
            println!("project completed after sprint {final_sprint}")
        }
    }
    Ok(())
}
