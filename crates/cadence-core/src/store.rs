use crate::error::{CadenceError, Result};
use crate::io;
use crate::lock::{StateLock, DEFAULT_LOCK_TIMEOUT};
use crate::paths;
use crate::state::ProjectState;
use crate::types::WorkflowStep;
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Durable, lock-protected store for one project's state document.
///
/// Every read and write serializes on the co-located lock file, and every
/// write goes through write-temp-then-rename, so a concurrent reader sees
/// either the pre- or post-image of an update, never a partial write.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> PathBuf {
        paths::state_path(&self.root)
    }

    fn lock(&self) -> Result<StateLock> {
        StateLock::acquire(&paths::lock_path(&self.root), self.lock_timeout)
    }

    // ---------------------------------------------------------------------------
    // Create / read
    // ---------------------------------------------------------------------------

    /// Write a fully-populated default document. Fails if one already
    /// exists; never overwrites.
    pub fn create(&self, project_name: &str, initial_sprint: &str) -> Result<ProjectState> {
        if project_name.is_empty() {
            return Err(CadenceError::InvalidArgument(
                "project name must not be empty".into(),
            ));
        }
        paths::validate_sprint_id(initial_sprint)?;

        let _lock = self.lock()?;
        let path = self.state_path();
        if path.exists() {
            return Err(CadenceError::AlreadyExists(path));
        }
        let state = ProjectState::new(project_name, initial_sprint);
        self.write_locked(&state)?;
        Ok(state)
    }

    /// Read the current document. Acquires the same lock as writers so an
    /// in-flight update is never observed mid-write.
    pub fn read(&self) -> Result<ProjectState> {
        let _lock = self.lock()?;
        self.read_locked()
    }

    fn read_locked(&self) -> Result<ProjectState> {
        let path = self.state_path();
        if !path.exists() {
            return Err(CadenceError::NotFound);
        }
        let data = std::fs::read_to_string(&path)?;
        parse_document(&data)
    }

    fn write_locked(&self, state: &ProjectState) -> Result<()> {
        io::atomic_write(&self.state_path(), render_document(state)?.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Update
    // ---------------------------------------------------------------------------

    /// Merge `partial` into the current document: read-modify-write under
    /// the lock, shallow top-level key replace, `last_updated` stamped,
    /// validated before the atomic rename. On validation failure the
    /// on-disk file is left byte-identical.
    pub fn update(&self, partial: Map<String, Value>) -> Result<ProjectState> {
        let _lock = self.lock()?;
        let current = self.read_locked()?;

        let mut doc = match serde_json::to_value(&current)? {
            Value::Object(map) => map,
            _ => unreachable!("state document serializes to an object"),
        };
        for (key, value) in partial {
            doc.insert(key, value);
        }
        // Stamped after the merge so a partial cannot regress the clock.
        let stamp = current.last_updated.max(Utc::now());
        doc.insert("last_updated".to_string(), serde_json::to_value(stamp)?);

        let merged: ProjectState = serde_json::from_value(Value::Object(doc))
            .map_err(|e| CadenceError::Validation(e.to_string()))?;
        merged.validate()?;
        self.write_locked(&merged)?;
        Ok(merged)
    }

    /// Apply a closure to the current document under the lock. Convenience
    /// for callers that mutate typed state rather than building a partial.
    pub fn mutate<F>(&self, f: F) -> Result<ProjectState>
    where
        F: FnOnce(&mut ProjectState),
    {
        let _lock = self.lock()?;
        let mut state = self.read_locked()?;
        f(&mut state);
        state.last_updated = state.last_updated.max(Utc::now());
        state.validate()?;
        self.write_locked(&state)?;
        Ok(state)
    }

    // ---------------------------------------------------------------------------
    // Sprint transition
    // ---------------------------------------------------------------------------

    /// Close out the current sprint and move to `new_sprint`'s planning
    /// step. Only same-or-next numeric sprints are reachable unless forced.
    pub fn transition_sprint(&self, new_sprint: &str, force: bool) -> Result<ProjectState> {
        paths::validate_sprint_id(new_sprint)?;
        let _lock = self.lock()?;
        let mut state = self.read_locked()?;

        if !force {
            let current = paths::parse_sprint(&state.current_sprint)?;
            let target = paths::parse_sprint(new_sprint)?;
            if target != current && target != current + 1 {
                return Err(CadenceError::InvalidSprint {
                    from: state.current_sprint.clone(),
                    to: new_sprint.to_string(),
                    reason: "only the same or next sprint is reachable without --force".into(),
                });
            }
        }

        if new_sprint != state.current_sprint {
            let finished = state.current_sprint.clone();
            state.complete_sprint(&finished);
        }
        state.current_sprint = new_sprint.to_string();
        state.workflow_step = WorkflowStep::Planning;
        state.acceptance_criteria_passed.clear();
        state.reset_progress();
        state.last_updated = state.last_updated.max(Utc::now());
        state.validate()?;
        self.write_locked(&state)?;
        Ok(state)
    }

    // ---------------------------------------------------------------------------
    // Backup / restore
    // ---------------------------------------------------------------------------

    /// Snapshot the full document into the backups directory. The snapshot
    /// is re-validated before being accepted.
    pub fn backup(&self) -> Result<PathBuf> {
        let _lock = self.lock()?;
        let state = self.read_locked()?;
        state.validate()?;

        let dir = paths::backups_dir(&self.root);
        io::ensure_dir(&dir)?;
        let name = format!(
            "project-state-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        );
        let path = dir.join(name);
        io::atomic_write(&path, render_document(&state)?.as_bytes())?;
        Ok(path)
    }

    /// Replace the live document with a previously taken snapshot. The
    /// snapshot must parse and validate before anything is overwritten.
    pub fn restore(&self, backup: &Path) -> Result<ProjectState> {
        let data = std::fs::read_to_string(backup)?;
        let mut state = parse_document(&data)?;

        let _lock = self.lock()?;
        state.last_updated = state.last_updated.max(Utc::now());
        self.write_locked(&state)?;
        Ok(state)
    }
}

// ---------------------------------------------------------------------------
// Document codec
// ---------------------------------------------------------------------------

fn parse_document(data: &str) -> Result<ProjectState> {
    let state: ProjectState =
        serde_json::from_str(data).map_err(|e| CadenceError::Corrupt(e.to_string()))?;
    state
        .validate()
        .map_err(|e| CadenceError::Corrupt(e.to_string()))?;
    Ok(state)
}

/// Pretty-printed with sorted keys (serde_json's value map is ordered), so
/// state-file diffs are deterministic.
fn render_document(state: &ProjectState) -> Result<String> {
    let value = serde_json::to_value(state)?;
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
