use crate::output::print_json;
use cadence_core::boundary::{self, FailMode};
use cadence_core::evaluate::{Decision, ToolUseEvaluator};
use cadence_core::store::StateStore;
use cadence_core::types::ToolEvent;
use std::io::Read;
use std::path::Path;

/// Pre-check hook entry point. Reads one tool event from stdin, evaluates
/// it against the current workflow step, persists metrics, and prints the
/// decision. Always exits 0: enforcement must never break the hook layer.
pub fn run(root: &Path, fail_closed: bool) -> anyhow::Result<()> {
    let mode = FailMode::from_fail_closed(fail_closed);

    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    let event: ToolEvent = match serde_json::from_str(&buf) {
        Ok(event) => event,
        Err(err) => {
            // Malformed events get a descriptive rejection, not a crash.
            let decision = Decision::block(format!("malformed hook event: {err}"), Vec::new());
            return print_json(&decision.response());
        }
    };

    let decision = boundary::resolve(evaluate(root, &event), mode)?;
    print_json(&decision.response())
}

fn evaluate(root: &Path, event: &ToolEvent) -> cadence_core::Result<Decision> {
    let store = StateStore::new(root);
    let state = store.read()?;

    let evaluator = ToolUseEvaluator::default();
    let decision = evaluator.evaluate(state.workflow_step, event);

    // Metrics persistence is best-effort: a contended lock must not change
    // the gating outcome. Recording goes through the store's locked
    // read-modify-write so overlapping hook processes never lose an
    // increment.
    if let Err(err) = store.mutate(|s| s.metrics.record(&decision)) {
        tracing::warn!(error = %err, "failed to persist gating metrics");
    }

    Ok(decision)
}
