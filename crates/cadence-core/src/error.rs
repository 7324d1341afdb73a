use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("project state not found: run 'cadence init'")]
    NotFound,

    #[error("project state already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("state file is corrupt: {0}")]
    Corrupt(String),

    #[error("state validation failed: {0}")]
    Validation(String),

    #[error("could not acquire state lock within {0:?}")]
    LockTimeout(Duration),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid sprint transition from {from} to {to}: {reason}")]
    InvalidSprint {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid sprint id '{0}': expected a zero-padded number like \"01\"")]
    InvalidSprintId(String),

    #[error("invalid workflow step: {0}")]
    InvalidStep(String),

    #[error("invalid project status: {0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CadenceError {
    /// Infrastructure failures the hook boundary may convert into a
    /// fail-open decision. Caller errors (bad arguments, create on an
    /// existing project) must always propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CadenceError::NotFound
                | CadenceError::Corrupt(_)
                | CadenceError::Validation(_)
                | CadenceError::LockTimeout(_)
                | CadenceError::Io(_)
                | CadenceError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(CadenceError::NotFound.is_recoverable());
        assert!(CadenceError::Corrupt("bad json".into()).is_recoverable());
        assert!(CadenceError::LockTimeout(Duration::from_secs(5)).is_recoverable());
        assert!(!CadenceError::AlreadyExists(PathBuf::from("/tmp/x")).is_recoverable());
        assert!(!CadenceError::InvalidArgument("empty name".into()).is_recoverable());
    }
}
