//! Error types surfaced by dependency and reorder actions.

use thiserror::Error;

use crate::model::TaskId;
use crate::store::RemoteError;

/// Why a new dependency edge was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeError {
    #[error("a task cannot depend on itself")]
    SelfReference,

    #[error("task {0} is not part of this project plan")]
    UnknownTask(TaskId),

    #[error("this dependency already exists")]
    DuplicateEdge,

    #[error("both tasks must belong to the same project")]
    CrossProject,

    #[error("this dependency would create a circular chain of tasks")]
    CycleDetected,
}

/// Failure of a user action (add/remove dependency, reorder, edit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] EdgeError),

    #[error("remote failure: {}", .0.as_deref().unwrap_or("unknown error"))]
    RemoteFailure(Option<String>),
}

const GENERIC_FAILURE: &str = "The operation could not be completed. Please try again.";

impl ActionError {
    /// Text for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(EdgeError::CycleDetected) => {
                "Circular dependency: the successor already leads back to the predecessor. \
                 Remove one of the existing links first."
                    .to_string()
            }
            Self::Rejected(err) => capitalize(&err.to_string()),
            Self::RemoteFailure(Some(msg)) if !msg.trim().is_empty() => msg.clone(),
            Self::RemoteFailure(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

impl From<RemoteError> for ActionError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::UniqueViolation(_) => Self::Rejected(EdgeError::DuplicateEdge),
            RemoteError::CycleRejected(_) => Self::Rejected(EdgeError::CycleDetected),
            RemoteError::SameProjectViolation(_) => Self::Rejected(EdgeError::CrossProject),
            RemoteError::Unavailable(msg) if msg.is_empty() => Self::RemoteFailure(None),
            other => Self::RemoteFailure(Some(other.to_string())),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_codes_map_to_specific_rejections() {
        assert_eq!(
            ActionError::from(RemoteError::UniqueViolation("dup".into())),
            ActionError::Rejected(EdgeError::DuplicateEdge)
        );
        assert_eq!(
            ActionError::from(RemoteError::CycleRejected("loop".into())),
            ActionError::Rejected(EdgeError::CycleDetected)
        );
        assert_eq!(
            ActionError::from(RemoteError::SameProjectViolation("x".into())),
            ActionError::Rejected(EdgeError::CrossProject)
        );
    }

    #[test]
    fn remote_failure_keeps_raw_message() {
        let err = ActionError::from(RemoteError::Unavailable("permission denied".into()));
        assert_eq!(err.user_message(), "service unavailable: permission denied");
    }

    #[test]
    fn empty_remote_message_falls_back() {
        let err = ActionError::from(RemoteError::Unavailable(String::new()));
        assert_eq!(err, ActionError::RemoteFailure(None));
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn cycle_message_is_distinct() {
        let cycle = ActionError::Rejected(EdgeError::CycleDetected).user_message();
        let dup = ActionError::Rejected(EdgeError::DuplicateEdge).user_message();
        assert!(cycle.starts_with("Circular dependency"));
        assert_eq!(dup, "This dependency already exists");
    }
}
