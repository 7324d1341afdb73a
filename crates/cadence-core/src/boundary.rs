use crate::error::Result;
use crate::evaluate::Decision;

/// What the hook boundary does when the state store is unavailable.
///
/// The default favors availability: a broken state store must never stop
/// the assistant from working, so infrastructure failures become allow
/// decisions with a logged warning. `Closed` flips that for installations
/// that prefer strict enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    #[default]
    Open,
    Closed,
}

/// Convert an evaluation result into a decision the hook layer can act on.
/// Business outcomes pass through; recoverable infrastructure errors are
/// logged and resolved per the fail mode. Caller errors still propagate.
pub fn resolve(result: Result<Decision>, mode: FailMode) -> Result<Decision> {
    match result {
        Ok(decision) => Ok(decision),
        Err(err) if err.is_recoverable() => {
            tracing::warn!(error = %err, "state store unavailable");
            Ok(match mode {
                FailMode::Open => Decision::allow(format!(
                    "allowed with warning: workflow state unavailable ({err})"
                )),
                FailMode::Closed => Decision::block(
                    format!("workflow state unavailable ({err})"),
                    vec!["Retry once the state store is reachable".to_string()],
                ),
            })
        }
        Err(err) => Err(err),
    }
}

impl FailMode {
    pub fn from_fail_closed(fail_closed: bool) -> Self {
        if fail_closed {
            FailMode::Closed
        } else {
            FailMode::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CadenceError;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn ok_decisions_pass_through() {
        let d = resolve(Ok(Decision::block("no", Vec::new())), FailMode::Open).unwrap();
        assert!(!d.allowed);
    }

    #[test]
    fn open_mode_allows_on_infrastructure_failure() {
        for err in [
            CadenceError::NotFound,
            CadenceError::Corrupt("truncated".into()),
            CadenceError::LockTimeout(Duration::from_secs(5)),
        ] {
            let d = resolve(Err(err), FailMode::Open).unwrap();
            assert!(d.allowed);
            assert!(d.message.contains("warning"));
        }
    }

    #[test]
    fn closed_mode_blocks_instead() {
        let d = resolve(Err(CadenceError::NotFound), FailMode::Closed).unwrap();
        assert!(!d.allowed);
        assert!(!d.suggestions.is_empty());
    }

    #[test]
    fn caller_errors_propagate_in_both_modes() {
        for mode in [FailMode::Open, FailMode::Closed] {
            let result = resolve(
                Err(CadenceError::AlreadyExists(PathBuf::from("/tmp/x"))),
                mode,
            );
            assert!(matches!(result, Err(CadenceError::AlreadyExists(_))));

            let result = resolve(Err(CadenceError::InvalidArgument("empty".into())), mode);
            assert!(matches!(result, Err(CadenceError::InvalidArgument(_))));
        }
    }
}
