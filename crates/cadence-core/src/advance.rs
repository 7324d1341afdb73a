use crate::detect;
use crate::error::Result;
use crate::paths;
use crate::state::ProjectState;
use crate::store::StateStore;
use crate::types::{ProjectStatus, WorkflowStep};
use serde::Serialize;

// ---------------------------------------------------------------------------
// AdvanceOutcome
// ---------------------------------------------------------------------------

/// What one advancement attempt did. No-ops are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    AutomationInactive,
    NotComplete {
        step: WorkflowStep,
        message: String,
    },
    Advanced {
        from: WorkflowStep,
        to: WorkflowStep,
    },
    SprintCompleted {
        sprint: String,
        next_sprint: String,
    },
    ProjectCompleted {
        final_sprint: String,
    },
}

// ---------------------------------------------------------------------------
// AdvanceController
// ---------------------------------------------------------------------------

/// Orchestrates step transitions: read state, test completion, compute the
/// successor, reset per-step progress, persist. All mutations go through
/// the store's locked update path, so a concurrent pre/post-check never
/// observes a half-applied transition.
#[derive(Debug, Clone)]
pub struct AdvanceController {
    store: StateStore,
    /// Sprint-count boundary supplied by external configuration. `None`
    /// means unbounded: integration always rolls into the next sprint.
    total_sprints: Option<u32>,
}

impl AdvanceController {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            total_sprints: None,
        }
    }

    pub fn with_total_sprints(mut self, total: Option<u32>) -> Self {
        self.total_sprints = total;
        self
    }

    /// One advancement attempt. Repeated calls with unchanged, incomplete
    /// progress change nothing. Errors reading or writing state leave the
    /// step as it was, to be retried on the next invocation.
    pub fn advance(&self) -> Result<AdvanceOutcome> {
        let state = self.store.read()?;

        if !state.automation_active {
            return Ok(AdvanceOutcome::AutomationInactive);
        }

        let step = state.workflow_step;
        let completion = detect::check(step, &state.workflow_progress);
        if !completion.complete {
            return Ok(AdvanceOutcome::NotComplete {
                step,
                message: completion.message,
            });
        }

        let next = step.next();
        if step == WorkflowStep::Integration {
            self.roll_over(&state.current_sprint)
        } else {
            self.advance_within_sprint(step, next)
        }
    }

    fn advance_within_sprint(
        &self,
        from: WorkflowStep,
        to: WorkflowStep,
    ) -> Result<AdvanceOutcome> {
        let mut applied = false;
        self.store.mutate(|state| {
            // Recheck under the write lock: a concurrent advancement may
            // have moved the step since our read.
            if state.workflow_step != from
                || !detect::check(from, &state.workflow_progress).complete
            {
                return;
            }
            state.workflow_step = to;
            state.automation_cycles += 1;
            state.reset_progress();
            // Acceptance criteria survive the validation→review boundary
            // only; every other transition clears them.
            if !(from == WorkflowStep::Validation && to == WorkflowStep::Review) {
                state.acceptance_criteria_passed.clear();
            }
            applied = true;
        })?;
        if applied {
            Ok(AdvanceOutcome::Advanced { from, to })
        } else {
            Ok(AdvanceOutcome::NotComplete {
                step: from,
                message: "step changed before the transition applied".to_string(),
            })
        }
    }

    /// Integration completed: close out the sprint and either start the
    /// next one at planning or, past the final configured sprint, complete
    /// the whole project.
    fn roll_over(&self, sprint: &str) -> Result<AdvanceOutcome> {
        let sprint_num = paths::parse_sprint(sprint)?;
        let is_final = self
            .total_sprints
            .map(|total| sprint_num >= total)
            .unwrap_or(false);
        let finished = sprint.to_string();

        // Same recheck as the intra-sprint path: the rollover only applies
        // if this sprint's integration step is still the one completing.
        let still_pending = |state: &ProjectState| {
            state.workflow_step == WorkflowStep::Integration
                && state.current_sprint == finished
                && detect::check(WorkflowStep::Integration, &state.workflow_progress).complete
        };
        let mut applied = false;

        if is_final {
            self.store.mutate(|state| {
                if !still_pending(state) {
                    return;
                }
                state.complete_sprint(&finished);
                state.reset_progress();
                state.metrics = Default::default();
                state.acceptance_criteria_passed.clear();
                state.status = ProjectStatus::Completed;
                state.automation_active = false;
                applied = true;
            })?;
            return if applied {
                Ok(AdvanceOutcome::ProjectCompleted {
                    final_sprint: finished,
                })
            } else {
                Ok(AdvanceOutcome::NotComplete {
                    step: WorkflowStep::Integration,
                    message: "sprint changed before the rollover applied".to_string(),
                })
            };
        }

        let next_sprint = paths::next_sprint_id(sprint)?;
        let next = next_sprint.clone();
        self.store.mutate(|state| {
            if !still_pending(state) {
                return;
            }
            state.complete_sprint(&finished);
            state.reset_progress();
            state.metrics = Default::default();
            state.acceptance_criteria_passed.clear();
            state.current_sprint = next.clone();
            state.workflow_step = WorkflowStep::Planning;
            applied = true;
        })?;
        if applied {
            Ok(AdvanceOutcome::SprintCompleted {
                sprint: finished,
                next_sprint,
            })
        } else {
            Ok(AdvanceOutcome::NotComplete {
                step: WorkflowStep::Integration,
                message: "sprint changed before the rollover applied".to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
