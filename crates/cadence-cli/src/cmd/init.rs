use crate::output::print_json;
use anyhow::Context;
use cadence_core::store::StateStore;
use std::path::Path;

pub fn run(root: &Path, project_name: &str, sprint: &str, json: bool) -> anyhow::Result<()> {
    let store = StateStore::new(root);
    let state = store
        .create(project_name, sprint)
        .context("failed to create project state")?;

    if json {
        print_json(&state)?;
    } else {
        println!(
            "Initialized '{}' at sprint {} ({})",
            state.project_name,
            state.current_sprint,
            store.state_path().display()
        );
    }
    Ok(())
}
