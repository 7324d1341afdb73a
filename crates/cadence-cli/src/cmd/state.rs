use crate::output::{print_json, print_kv};
use anyhow::Context;
use cadence_core::store::StateStore;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(root)
        .read()
        .context("failed to load project state")?;

    if json {
        return print_json(&state);
    }

    print_kv(&[
        ("project", state.project_name.clone()),
        ("status", state.status.to_string()),
        ("sprint", state.current_sprint.clone()),
        ("step", state.workflow_step.to_string()),
        ("automation", state.automation_active.to_string()),
        ("cycles", state.automation_cycles.to_string()),
        (
            "completed sprints",
            if state.completed_sprints.is_empty() {
                "-".to_string()
            } else {
                state.completed_sprints.join(", ")
            },
        ),
        (
            "criteria passed",
            if state.acceptance_criteria_passed.is_empty() {
                "-".to_string()
            } else {
                state.acceptance_criteria_passed.join(", ")
            },
        ),
        (
            "tools allowed/blocked",
            format!(
                "{}/{}",
                state.metrics.tools_allowed, state.metrics.tools_blocked
            ),
        ),
        ("last updated", state.last_updated.to_rfc3339()),
    ]);
    Ok(())
}
