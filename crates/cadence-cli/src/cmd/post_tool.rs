use cadence_core::state::ProjectState;
use cadence_core::store::StateStore;
use cadence_core::types::{Tool, ToolEvent, WorkflowStep};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Post-check hook entry point. Folds the finished tool invocation's
/// signals into the current step's progress. Recoverable failures are
/// logged and swallowed so the hook layer never sees an error exit.
pub fn run(root: &Path) -> anyhow::Result<()> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    let event: ToolEvent = match serde_json::from_str(&buf) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed post-check event");
            return Ok(());
        }
    };

    match StateStore::new(root).mutate(|state| fold(state, &event)) {
        Ok(_) => Ok(()),
        Err(err) if err.is_recoverable() => {
            tracing::warn!(error = %err, "failed to record tool progress");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Accumulate the signals the step-completion detector reads. When the
/// collaborator has already written an explicit completion signal,
/// `step_mut` yields nothing and raw signals are not folded over it.
fn fold(state: &mut ProjectState, event: &ToolEvent) {
    let step = state.workflow_step;
    let Some(progress) = state.workflow_progress.step_mut(step) else {
        return;
    };

    progress.record_tool(event.tool.name());

    if event.tool.is_write() {
        if let Some(path) = event.input.file_path.as_deref() {
            progress.record_file_modified(path);
        }
    }

    if event.tool == Tool::TodoWrite {
        match step {
            WorkflowStep::Planning => progress.planning_complete = true,
            WorkflowStep::Review => progress.review_complete = true,
            _ => {}
        }
    }

    if event.tool == Tool::Bash {
        if event.is_git_command() {
            progress.git_commands_run = true;
        }
        if event.exit_code == Some(0) {
            if let Some(cmd) = event.input.command.as_deref() {
                if is_test_command(cmd) {
                    progress.tests_run = true;
                }
            }
        }
    }
}

static TEST_CMD_RE: OnceLock<Regex> = OnceLock::new();

fn is_test_command(cmd: &str) -> bool {
    let re = TEST_CMD_RE
        .get_or_init(|| Regex::new(r"(?i)\b(tests?|pytest|jest|spec)\b").unwrap());
    re.is_match(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tool: Tool) -> ToolEvent {
        ToolEvent::new(tool)
    }

    fn state_at(step: WorkflowStep) -> ProjectState {
        let mut state = ProjectState::new("demo", "01");
        state.workflow_step = step;
        state
    }

    #[test]
    fn todo_write_marks_planning_complete() {
        let mut state = state_at(WorkflowStep::Planning);
        fold(&mut state, &event(Tool::TodoWrite));
        let p = state.workflow_progress.step(WorkflowStep::Planning).unwrap();
        assert!(p.planning_complete);
        assert_eq!(p.tools_used, vec!["TodoWrite".to_string()]);
    }

    #[test]
    fn todo_write_marks_review_complete_in_review() {
        let mut state = state_at(WorkflowStep::Review);
        fold(&mut state, &event(Tool::TodoWrite));
        let p = state.workflow_progress.step(WorkflowStep::Review).unwrap();
        assert!(p.review_complete);
        assert!(!p.planning_complete);
    }

    #[test]
    fn write_records_modified_file() {
        let mut state = state_at(WorkflowStep::Implementation);
        let mut e = event(Tool::Write);
        e.input.file_path = Some("src/lib.rs".to_string());
        fold(&mut state, &e);
        fold(&mut state, &e);
        let p = state
            .workflow_progress
            .step(WorkflowStep::Implementation)
            .unwrap();
        assert_eq!(p.files_modified, vec!["src/lib.rs".to_string()]);
    }

    #[test]
    fn successful_test_run_sets_tests_run() {
        let mut state = state_at(WorkflowStep::Validation);
        let mut e = event(Tool::Bash).with_command("cargo test --workspace");
        e.exit_code = Some(0);
        fold(&mut state, &e);
        assert!(
            state
                .workflow_progress
                .step(WorkflowStep::Validation)
                .unwrap()
                .tests_run
        );
    }

    #[test]
    fn failed_test_run_does_not_count() {
        let mut state = state_at(WorkflowStep::Validation);
        let mut e = event(Tool::Bash).with_command("cargo test");
        e.exit_code = Some(101);
        fold(&mut state, &e);
        assert!(
            !state
                .workflow_progress
                .step(WorkflowStep::Validation)
                .unwrap()
                .tests_run
        );
    }

    #[test]
    fn git_bash_sets_git_commands_run() {
        let mut state = state_at(WorkflowStep::Integration);
        let mut e = event(Tool::Bash).with_command("git push origin main");
        e.exit_code = Some(0);
        fold(&mut state, &e);
        let p = state
            .workflow_progress
            .step(WorkflowStep::Integration)
            .unwrap();
        assert!(p.git_commands_run);
        assert_eq!(p.tools_used, vec!["Bash".to_string()]);
    }

    #[test]
    fn test_command_heuristic() {
        for cmd in ["cargo test", "npm test", "pytest -x", "go test ./...", "bundle exec spec"] {
            assert!(is_test_command(cmd), "expected test command: {cmd}");
        }
        for cmd in ["git status", "cargo build", "ls contest-results"] {
            assert!(!is_test_command(cmd), "not a test command: {cmd}");
        }
    }
}
