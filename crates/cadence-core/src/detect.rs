use crate::state::{StepProgress, WorkflowProgress};
use crate::types::{Tool, WorkflowStep};

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub complete: bool,
    pub message: String,
}

impl Completion {
    fn done(message: impl Into<String>) -> Self {
        Self {
            complete: true,
            message: message.into(),
        }
    }

    fn pending(message: impl Into<String>) -> Self {
        Self {
            complete: false,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Signal rules
// ---------------------------------------------------------------------------

/// One completion rule per step, each inspecting a different signal
/// accumulated by the post-check collaborator.
pub fn is_complete(step: WorkflowStep, progress: &StepProgress) -> Completion {
    match step {
        WorkflowStep::Planning => {
            if progress.planning_complete {
                Completion::done("plan recorded")
            } else {
                Completion::pending("no plan recorded yet")
            }
        }
        WorkflowStep::Implementation => {
            if progress.files_modified.is_empty() {
                Completion::pending("no files modified yet")
            } else {
                Completion::done(format!("{} file(s) modified", progress.files_modified.len()))
            }
        }
        WorkflowStep::Validation => {
            if progress.tests_run {
                Completion::done("tests have run")
            } else {
                Completion::pending("tests have not run yet")
            }
        }
        WorkflowStep::Review => {
            if progress.review_complete {
                Completion::done("review recorded")
            } else {
                Completion::pending("review not recorded yet")
            }
        }
        WorkflowStep::Refinement => {
            let edited = progress
                .tools_used
                .iter()
                .any(|t| t == "Edit" || t == "MultiEdit");
            if edited {
                Completion::done("review feedback applied")
            } else {
                Completion::pending("no edits applied yet")
            }
        }
        WorkflowStep::Integration => {
            let git_tool = progress
                .tools_used
                .iter()
                .any(|t| Tool::is_git_flavored_name(t));
            let git_via_bash = progress.git_commands_run
                && progress.tools_used.iter().any(|t| t == "Bash");
            if git_tool || git_via_bash {
                Completion::done("git activity observed")
            } else {
                Completion::pending("no git activity yet")
            }
        }
    }
}

/// Decide completion for the current step from the accumulated progress.
///
/// An explicit completion signal written by the post-check collaborator is
/// honored directly when it names the current step; raw signals are only
/// consulted otherwise.
pub fn check(step: WorkflowStep, progress: &WorkflowProgress) -> Completion {
    match progress {
        WorkflowProgress::Signal(sig) => {
            if sig.complete && sig.step == step.as_str() {
                let message = if sig.message.is_empty() {
                    format!("{step} marked complete")
                } else {
                    sig.message.clone()
                };
                Completion::done(message)
            } else {
                Completion::pending(format!("no completion signal for {step}"))
            }
        }
        WorkflowProgress::Steps(map) => match map.get(step.as_str()) {
            Some(p) => is_complete(step, p),
            None => Completion::pending(format!("no progress recorded for {step}")),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CompletionSignal;
    use std::collections::BTreeMap;

    #[test]
    fn planning_requires_plan_marker() {
        let mut p = StepProgress::default();
        assert!(!is_complete(WorkflowStep::Planning, &p).complete);
        p.planning_complete = true;
        assert!(is_complete(WorkflowStep::Planning, &p).complete);
    }

    #[test]
    fn implementation_requires_modified_files() {
        let mut p = StepProgress::default();
        assert!(!is_complete(WorkflowStep::Implementation, &p).complete);
        p.record_file_modified("a.py");
        assert!(is_complete(WorkflowStep::Implementation, &p).complete);
    }

    #[test]
    fn validation_requires_tests_run() {
        let mut p = StepProgress::default();
        assert!(!is_complete(WorkflowStep::Validation, &p).complete);
        p.tests_run = true;
        assert!(is_complete(WorkflowStep::Validation, &p).complete);
    }

    #[test]
    fn review_requires_review_marker() {
        let mut p = StepProgress::default();
        assert!(!is_complete(WorkflowStep::Review, &p).complete);
        p.review_complete = true;
        assert!(is_complete(WorkflowStep::Review, &p).complete);
    }

    #[test]
    fn refinement_requires_edit_usage() {
        let mut p = StepProgress::default();
        p.record_tool("Read");
        p.record_tool("Bash");
        assert!(!is_complete(WorkflowStep::Refinement, &p).complete);
        p.record_tool("MultiEdit");
        assert!(is_complete(WorkflowStep::Refinement, &p).complete);
    }

    #[test]
    fn integration_accepts_git_tool_or_git_bash() {
        let mut p = StepProgress::default();
        assert!(!is_complete(WorkflowStep::Integration, &p).complete);

        p.record_tool("mcp__git__commit");
        assert!(is_complete(WorkflowStep::Integration, &p).complete);

        let mut p = StepProgress::default();
        p.record_tool("Bash");
        assert!(!is_complete(WorkflowStep::Integration, &p).complete);
        p.git_commands_run = true;
        assert!(is_complete(WorkflowStep::Integration, &p).complete);
    }

    #[test]
    fn bash_without_git_commands_is_not_integration_activity() {
        let mut p = StepProgress::default();
        p.git_commands_run = true;
        // git_commands_run without Bash in tools_used means nothing ran.
        assert!(!is_complete(WorkflowStep::Integration, &p).complete);
    }

    #[test]
    fn check_honors_matching_signal() {
        let progress = WorkflowProgress::Signal(CompletionSignal {
            complete: true,
            step: "validation".into(),
            message: "all suites green".into(),
            ready_for_next: "review".into(),
        });
        let c = check(WorkflowStep::Validation, &progress);
        assert!(c.complete);
        assert_eq!(c.message, "all suites green");
    }

    #[test]
    fn check_ignores_signal_for_other_step() {
        let progress = WorkflowProgress::Signal(CompletionSignal {
            complete: true,
            step: "planning".into(),
            message: String::new(),
            ready_for_next: "implementation".into(),
        });
        assert!(!check(WorkflowStep::Validation, &progress).complete);
    }

    #[test]
    fn check_ignores_incomplete_signal() {
        let progress = WorkflowProgress::Signal(CompletionSignal {
            complete: false,
            step: "planning".into(),
            message: String::new(),
            ready_for_next: String::new(),
        });
        assert!(!check(WorkflowStep::Planning, &progress).complete);
    }

    #[test]
    fn check_falls_back_to_raw_signals() {
        let mut map = BTreeMap::new();
        let mut p = StepProgress::default();
        p.record_file_modified("src/main.rs");
        map.insert("implementation".to_string(), p);
        let progress = WorkflowProgress::Steps(map);

        assert!(check(WorkflowStep::Implementation, &progress).complete);
        assert!(!check(WorkflowStep::Planning, &progress).complete);
    }

    #[test]
    fn empty_progress_is_never_complete() {
        let progress = WorkflowProgress::default();
        for step in WorkflowStep::all() {
            assert!(!check(*step, &progress).complete);
        }
    }
}
