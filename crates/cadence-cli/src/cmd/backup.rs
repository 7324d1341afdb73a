use crate::output::print_json;
use anyhow::Context;
use cadence_core::store::StateStore;
use std::path::Path;

pub fn backup(root: &Path) -> anyhow::Result<()> {
    let path = StateStore::new(root)
        .backup()
        .context("failed to snapshot project state")?;
    println!("{}", path.display());
    Ok(())
}

pub fn restore(root: &Path, snapshot: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(root)
        .restore(snapshot)
        .context("failed to restore project state")?;
    if json {
        print_json(&state)?;
    } else {
        println!(
            "restored '{}' at sprint {}, step {}",
            state.project_name, state.current_sprint, state.workflow_step
        );
    }
    Ok(())
}
