use crate::error::{CadenceError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const STATE_FILE: &str = ".project-state.json";
pub const LOCK_FILE: &str = ".project-state.json.lock";
pub const CADENCE_DIR: &str = ".cadence";
pub const BACKUPS_DIR: &str = ".cadence/backups";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

pub fn backups_dir(root: &Path) -> PathBuf {
    root.join(BACKUPS_DIR)
}

// ---------------------------------------------------------------------------
// Sprint ids
// ---------------------------------------------------------------------------

static SPRINT_RE: OnceLock<Regex> = OnceLock::new();

fn sprint_re() -> &'static Regex {
    SPRINT_RE.get_or_init(|| Regex::new(r"^\d{2,4}$").unwrap())
}

/// Sprint ids are zero-padded numeric strings ("01", "02", ...).
pub fn validate_sprint_id(id: &str) -> Result<()> {
    if !sprint_re().is_match(id) {
        return Err(CadenceError::InvalidSprintId(id.to_string()));
    }
    Ok(())
}

pub fn parse_sprint(id: &str) -> Result<u32> {
    validate_sprint_id(id)?;
    id.parse::<u32>()
        .map_err(|_| CadenceError::InvalidSprintId(id.to_string()))
}

pub fn format_sprint(n: u32) -> String {
    format!("{n:02}")
}

pub fn next_sprint_id(id: &str) -> Result<String> {
    Ok(format_sprint(parse_sprint(id)? + 1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
