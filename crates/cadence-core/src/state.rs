use crate::error::{CadenceError, Result};
use crate::paths;
use crate::types::{ProjectStatus, WorkflowStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Per-sprint tool-gating counters. Zeroed on sprint rollover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub tools_allowed: u64,
    #[serde(default)]
    pub tools_blocked: u64,
    #[serde(default)]
    pub emergency_overrides: u64,
    #[serde(default)]
    pub workflow_violations: u64,
}

impl Metrics {
    pub fn is_zero(&self) -> bool {
        *self == Metrics::default()
    }
}

// ---------------------------------------------------------------------------
// Workflow progress
// ---------------------------------------------------------------------------

/// Raw signals accumulated for one step by the post-check collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    #[serde(default)]
    pub planning_complete: bool,
    #[serde(default)]
    pub files_modified: Vec<String>,
    #[serde(default)]
    pub tests_run: bool,
    #[serde(default)]
    pub review_complete: bool,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub git_commands_run: bool,
}

impl StepProgress {
    pub fn record_tool(&mut self, name: &str) {
        if !self.tools_used.iter().any(|t| t == name) {
            self.tools_used.push(name.to_string());
        }
    }

    pub fn record_file_modified(&mut self, path: &str) {
        if !self.files_modified.iter().any(|f| f == path) {
            self.files_modified.push(path.to_string());
        }
    }
}

/// Pre-computed completion marker written by the post-check collaborator.
/// When present with a matching step, the detector trusts it directly
/// instead of re-deriving completion from raw signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSignal {
    pub complete: bool,
    pub step: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ready_for_next: String,
}

/// Transient per-step accumulator, reset on every step transition. Either a
/// per-step map of raw signals or an explicit completion signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowProgress {
    Signal(CompletionSignal),
    Steps(BTreeMap<String, StepProgress>),
}

impl Default for WorkflowProgress {
    fn default() -> Self {
        WorkflowProgress::Steps(BTreeMap::new())
    }
}

impl WorkflowProgress {
    pub fn is_empty(&self) -> bool {
        matches!(self, WorkflowProgress::Steps(map) if map.is_empty())
    }

    pub fn step(&self, step: WorkflowStep) -> Option<&StepProgress> {
        match self {
            WorkflowProgress::Steps(map) => map.get(step.as_str()),
            WorkflowProgress::Signal(_) => None,
        }
    }

    /// Mutable accessor for one step's raw signals. Returns `None` when an
    /// explicit completion signal is in place; raw signals are not folded
    /// over a marker the collaborator already resolved.
    pub fn step_mut(&mut self, step: WorkflowStep) -> Option<&mut StepProgress> {
        match self {
            WorkflowProgress::Steps(map) => Some(map.entry(step.as_str().to_string()).or_default()),
            WorkflowProgress::Signal(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectState
// ---------------------------------------------------------------------------

fn default_document_version() -> String {
    "1.0.0".to_string()
}

/// One project's workflow state, persisted as `.project-state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub project_name: String,
    pub current_sprint: String,
    pub status: ProjectStatus,
    pub automation_active: bool,
    pub workflow_step: WorkflowStep,
    #[serde(default)]
    pub current_user_story: Option<String>,
    #[serde(default)]
    pub acceptance_criteria_passed: Vec<String>,
    #[serde(default)]
    pub completed_sprints: Vec<String>,
    #[serde(default)]
    pub automation_cycles: u64,
    pub started: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_worktree: String,
    #[serde(default = "default_document_version")]
    pub version: String,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub workflow_progress: WorkflowProgress,
    #[serde(default)]
    pub pause_context: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub stop_context: Option<BTreeMap<String, serde_json::Value>>,
}

impl ProjectState {
    pub fn new(project_name: impl Into<String>, initial_sprint: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            project_name: project_name.into(),
            current_sprint: initial_sprint.into(),
            status: ProjectStatus::Setup,
            automation_active: false,
            workflow_step: WorkflowStep::Planning,
            current_user_story: None,
            acceptance_criteria_passed: Vec::new(),
            completed_sprints: Vec::new(),
            automation_cycles: 0,
            started: now,
            last_updated: now,
            git_branch: None,
            git_worktree: String::new(),
            version: default_document_version(),
            metrics: Metrics::default(),
            workflow_progress: WorkflowProgress::default(),
            pause_context: None,
            stop_context: None,
        }
    }

    // ---------------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------------

    /// Schema checks beyond what deserialization already enforces (enum
    /// membership and counter signs come for free from the types).
    pub fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            return Err(CadenceError::Validation("project_name is empty".into()));
        }
        paths::validate_sprint_id(&self.current_sprint)
            .map_err(|e| CadenceError::Validation(e.to_string()))?;
        for sprint in &self.completed_sprints {
            paths::validate_sprint_id(sprint)
                .map_err(|e| CadenceError::Validation(e.to_string()))?;
        }
        let mut seen = std::collections::BTreeSet::new();
        for sprint in &self.completed_sprints {
            if !seen.insert(sprint.as_str()) {
                return Err(CadenceError::Validation(format!(
                    "duplicate completed sprint: {sprint}"
                )));
            }
        }
        if self.version.is_empty() {
            return Err(CadenceError::Validation("version is empty".into()));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Mark an acceptance criterion passed. Dedup by presence check.
    pub fn pass_criterion(&mut self, name: &str) {
        if !self.acceptance_criteria_passed.iter().any(|c| c == name) {
            self.acceptance_criteria_passed.push(name.to_string());
        }
    }

    pub fn criterion_passed(&self, name: &str) -> bool {
        self.acceptance_criteria_passed.iter().any(|c| c == name)
    }

    /// Append to `completed_sprints`, exactly once per sprint.
    pub fn complete_sprint(&mut self, sprint: &str) {
        if !self.completed_sprints.iter().any(|s| s == sprint) {
            self.completed_sprints.push(sprint.to_string());
        }
    }

    pub fn reset_progress(&mut self) {
        self.workflow_progress = WorkflowProgress::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let state = ProjectState::new("demo", "01");
        state.validate().unwrap();
        assert_eq!(state.status, ProjectStatus::Setup);
        assert_eq!(state.workflow_step, WorkflowStep::Planning);
        assert!(state.metrics.is_zero());
        assert!(state.workflow_progress.is_empty());
    }

    #[test]
    fn empty_name_rejected() {
        let state = ProjectState::new("", "01");
        assert!(matches!(
            state.validate(),
            Err(CadenceError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_completed_sprints_rejected() {
        let mut state = ProjectState::new("demo", "03");
        state.completed_sprints = vec!["01".into(), "02".into(), "01".into()];
        assert!(state.validate().is_err());
    }

    #[test]
    fn complete_sprint_appends_once() {
        let mut state = ProjectState::new("demo", "01");
        state.complete_sprint("01");
        state.complete_sprint("01");
        assert_eq!(state.completed_sprints, vec!["01".to_string()]);
    }

    #[test]
    fn criteria_dedup_by_presence() {
        let mut state = ProjectState::new("demo", "01");
        state.pass_criterion("compilation");
        state.pass_criterion("existing_tests");
        state.pass_criterion("compilation");
        assert_eq!(state.acceptance_criteria_passed.len(), 2);
        assert!(state.criterion_passed("compilation"));
        assert!(!state.criterion_passed("lint"));
    }

    #[test]
    fn progress_step_accessors() {
        let mut state = ProjectState::new("demo", "01");
        let p = state
            .workflow_progress
            .step_mut(WorkflowStep::Implementation)
            .unwrap();
        p.record_file_modified("src/lib.rs");
        p.record_file_modified("src/lib.rs");
        p.record_tool("Edit");

        let p = state
            .workflow_progress
            .step(WorkflowStep::Implementation)
            .unwrap();
        assert_eq!(p.files_modified, vec!["src/lib.rs".to_string()]);
        assert_eq!(p.tools_used, vec!["Edit".to_string()]);
        assert!(state.workflow_progress.step(WorkflowStep::Review).is_none());
    }

    #[test]
    fn completion_signal_shape_parses() {
        let json = r#"{"complete": true, "step": "planning", "message": "plan recorded", "ready_for_next": "implementation"}"#;
        let progress: WorkflowProgress = serde_json::from_str(json).unwrap();
        match progress {
            WorkflowProgress::Signal(sig) => {
                assert!(sig.complete);
                assert_eq!(sig.step, "planning");
                assert_eq!(sig.ready_for_next, "implementation");
            }
            WorkflowProgress::Steps(_) => panic!("expected signal shape"),
        }
    }

    #[test]
    fn step_map_shape_parses() {
        let json = r#"{"implementation": {"files_modified": ["a.rs"], "tools_used": ["Edit"]}}"#;
        let progress: WorkflowProgress = serde_json::from_str(json).unwrap();
        match progress {
            WorkflowProgress::Steps(map) => {
                assert_eq!(map["implementation"].files_modified, vec!["a.rs".to_string()]);
            }
            WorkflowProgress::Signal(_) => panic!("expected step map shape"),
        }
    }

    #[test]
    fn signal_blocks_raw_signal_folding() {
        let mut progress = WorkflowProgress::Signal(CompletionSignal {
            complete: true,
            step: "planning".into(),
            message: String::new(),
            ready_for_next: "implementation".into(),
        });
        assert!(progress.step_mut(WorkflowStep::Planning).is_none());
    }

    #[test]
    fn document_roundtrips_through_json() {
        let mut state = ProjectState::new("demo", "02");
        state.completed_sprints = vec!["01".into()];
        state.metrics.tools_allowed = 7;
        state
            .workflow_progress
            .step_mut(WorkflowStep::Planning)
            .unwrap()
            .planning_complete = true;

        let json = serde_json::to_string_pretty(&state).unwrap();
        let parsed: ProjectState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
