use crate::output::print_json;
use anyhow::{bail, Context};
use cadence_core::store::StateStore;
use cadence_core::types::ProjectStatus;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub fn start(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(root)
        .mutate(|state| {
            state.status = ProjectStatus::Active;
            state.automation_active = true;
        })
        .context("failed to start automation")?;
    report(&state, json)
}

/// Snapshot the fields `resume` needs, then flip to paused.
pub fn pause(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(root)
        .mutate(|state| {
            let mut snapshot = BTreeMap::new();
            snapshot.insert("status".to_string(), json!(state.status.as_str()));
            snapshot.insert(
                "automation_active".to_string(),
                json!(state.automation_active),
            );
            snapshot.insert(
                "workflow_step".to_string(),
                json!(state.workflow_step.as_str()),
            );
            snapshot.insert("paused_at".to_string(), json!(Utc::now().to_rfc3339()));
            state.pause_context = Some(snapshot);
            state.status = ProjectStatus::Paused;
            state.automation_active = false;
        })
        .context("failed to pause automation")?;
    report(&state, json)
}

/// Restore exactly what `pause` captured.
pub fn resume(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = StateStore::new(root);
    let current = store.read().context("failed to load project state")?;
    let Some(snapshot) = current.pause_context else {
        bail!("project is not paused");
    };

    let status = snapshot
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(|s| ProjectStatus::from_str(s).ok())
        .unwrap_or(ProjectStatus::Active);
    let automation = snapshot
        .get("automation_active")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    let state = store
        .mutate(|state| {
            state.status = status;
            state.automation_active = automation;
            state.pause_context = None;
        })
        .context("failed to resume automation")?;
    report(&state, json)
}

pub fn stop(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(root)
        .mutate(|state| {
            let mut snapshot = BTreeMap::new();
            snapshot.insert("status".to_string(), json!(state.status.as_str()));
            snapshot.insert(
                "workflow_step".to_string(),
                json!(state.workflow_step.as_str()),
            );
            snapshot.insert("stopped_at".to_string(), json!(Utc::now().to_rfc3339()));
            state.stop_context = Some(snapshot);
            state.status = ProjectStatus::Stopped;
            state.automation_active = false;
        })
        .context("failed to stop automation")?;
    report(&state, json)
}

fn report(state: &cadence_core::state::ProjectState, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(state)
    } else {
        println!(
            "{}: status={}, automation={}",
            state.project_name, state.status, state.automation_active
        );
        Ok(())
    }
}
