/// Error taxonomy for the cannibalization workflow
///
/// Every fallible operation in the library returns [`WorkflowError`]. Failures are
/// caught where they happen and turned into a user-facing message by the caller;
/// none of them is fatal to the process.

use crate::directory::Role;
use crate::workflow::state::{Action, CaseState};
use crate::workflow::types::Stage;
use thiserror::Error;

/// Library-wide result alias
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Workflow-level errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required form field was empty; raised before any store or gateway call
    #[error("Required field '{field}' is empty")]
    ValidationFailure { field: &'static str },

    #[error("Sign-in failed: {0}")]
    AuthFailure(AuthFailureKind),

    #[error("Role {role} is not permitted to {action}")]
    RoleNotPermitted { role: Role, action: Action },

    /// The predecessor stage record is absent
    #[error("Prerequisite missing: no {stage} record for this case")]
    PrerequisiteMissing { stage: Stage },

    #[error("Cannot {action} while the case is {state}")]
    IllegalTransition { state: CaseState, action: Action },

    /// Report generation found one or more stage records absent
    #[error("Incomplete data: cannot generate report without {}", join_stages(.missing))]
    IncompleteData { missing: Vec<Stage> },

    #[error("Invalid case path: {0}")]
    InvalidCasePath(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Notification undeliverable: {0}")]
    NotificationUndeliverable(String),

    #[error("Report export failed: {0}")]
    ExportFailure(String),
}

/// Causes of a rejected sign-in, each with a fixed user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    InvalidEmail,
    UserNotFound,
    WrongPassword,
    RoleNotRecognized,
    /// Sign-up with an email already bound to a role
    EmailInUse,
    Other,
}

impl AuthFailureKind {
    /// Message shown to the user for this cause
    pub fn user_message(self) -> &'static str {
        match self {
            AuthFailureKind::InvalidEmail => "The email address is badly formatted.",
            AuthFailureKind::UserNotFound => "No user corresponding to the given email.",
            AuthFailureKind::WrongPassword => "The password is invalid.",
            AuthFailureKind::RoleNotRecognized => "User role not recognized.",
            AuthFailureKind::EmailInUse => "The email address is already in use by another account.",
            AuthFailureKind::Other => "An error occurred while signing in.",
        }
    }
}

impl std::fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(value: sqlx::Error) -> Self {
        WorkflowError::PersistenceFailure(value.to_string())
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(value: serde_json::Error) -> Self {
        WorkflowError::PersistenceFailure(format!("malformed document: {}", value))
    }
}

fn join_stages(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_data_lists_every_missing_stage() {
        let err = WorkflowError::IncompleteData {
            missing: vec![Stage::B, Stage::C],
        };
        assert_eq!(
            err.to_string(),
            "Incomplete data: cannot generate report without Stage B, Stage C"
        );
    }

    #[test]
    fn auth_failures_map_to_user_messages() {
        let err = WorkflowError::AuthFailure(AuthFailureKind::WrongPassword);
        assert_eq!(err.to_string(), "Sign-in failed: The password is invalid.");
        assert_eq!(
            AuthFailureKind::RoleNotRecognized.user_message(),
            "User role not recognized."
        );
    }
}
