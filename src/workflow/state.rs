/// Case state machine
///
/// The state of a case is derived from which records exist in the store, so the
/// engine can check legality before every transition instead of trusting the
/// caller's view.

use crate::directory::Role;
use crate::workflow::types::Stage;
use serde::Serialize;

/// Lifecycle of a case. Ordering follows the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CaseState {
    /// Stage A recorded; waiting for permission
    Created,
    /// Stage B recorded; waiting for chief MOC approval
    PermissionPending,
    /// Stage B approved; waiting for the post-permission action
    PermissionGranted,
    /// Stage C recorded; waiting for verification and report
    ActionRecorded,
    /// Report archived (terminal)
    Reported,
}

impl CaseState {
    /// Derive the state from the records present for a case
    ///
    /// Returns `None` when the case has no Stage A record (it does not exist yet).
    pub fn derive(
        has_request: bool,
        permission_approved: Option<bool>,
        has_action: bool,
        has_report: bool,
    ) -> Option<CaseState> {
        if !has_request {
            return None;
        }
        let state = if has_report {
            CaseState::Reported
        } else if has_action {
            CaseState::ActionRecorded
        } else {
            match permission_approved {
                Some(true) => CaseState::PermissionGranted,
                Some(false) => CaseState::PermissionPending,
                None => CaseState::Created,
            }
        };
        Some(state)
    }

    /// Whether `action` may run from this state. Re-running a completed
    /// transition is allowed and overwrites its record.
    pub fn permits(self, action: Action) -> bool {
        self >= action.requires()
    }
}

impl std::fmt::Display for CaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CaseState::Created => "created",
            CaseState::PermissionPending => "awaiting approval",
            CaseState::PermissionGranted => "permission granted",
            CaseState::ActionRecorded => "action recorded",
            CaseState::Reported => "reported",
        };
        f.write_str(label)
    }
}

/// Who receives the notification after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recipient {
    /// The token slot of a fixed role
    Role(Role),
    /// The requester of this case, via the token captured in Stage A
    CaseRequester,
}

impl Recipient {
    pub fn role(self) -> Role {
        match self {
            Recipient::Role(role) => role,
            Recipient::CaseRequester => Role::Requester,
        }
    }
}

/// One transition of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    SubmitRequest,
    RecordPermission,
    ApprovePermission,
    RecordAction,
    GenerateReport,
}

impl Action {
    /// The only role allowed to perform this transition
    pub fn actor(self) -> Role {
        match self {
            Action::SubmitRequest | Action::RecordAction => Role::Requester,
            Action::RecordPermission => Role::RotablePlanning,
            Action::ApprovePermission => Role::ChiefMoc,
            Action::GenerateReport => Role::RpOfficer,
        }
    }

    /// Who is notified once the transition has been persisted
    pub fn recipient(self) -> Recipient {
        match self {
            Action::SubmitRequest => Recipient::Role(Role::RotablePlanning),
            Action::RecordPermission => Recipient::Role(Role::ChiefMoc),
            Action::ApprovePermission => Recipient::CaseRequester,
            Action::RecordAction => Recipient::Role(Role::RpOfficer),
            Action::GenerateReport => Recipient::CaseRequester,
        }
    }

    /// Stage this transition writes to
    pub fn stage(self) -> Stage {
        match self {
            Action::SubmitRequest => Stage::A,
            Action::RecordPermission | Action::ApprovePermission => Stage::B,
            Action::RecordAction => Stage::C,
            Action::GenerateReport => Stage::D,
        }
    }

    /// Minimum state the case must have reached
    fn requires(self) -> CaseState {
        match self {
            Action::SubmitRequest | Action::RecordPermission => CaseState::Created,
            Action::ApprovePermission => CaseState::PermissionPending,
            Action::RecordAction => CaseState::PermissionGranted,
            Action::GenerateReport => CaseState::ActionRecorded,
        }
    }

    /// State reached once the transition completes
    pub fn resulting_state(self) -> CaseState {
        match self {
            Action::SubmitRequest => CaseState::Created,
            Action::RecordPermission => CaseState::PermissionPending,
            Action::ApprovePermission => CaseState::PermissionGranted,
            Action::RecordAction => CaseState::ActionRecorded,
            Action::GenerateReport => CaseState::Reported,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::SubmitRequest => "submit the request",
            Action::RecordPermission => "record permission",
            Action::ApprovePermission => "approve permission",
            Action::RecordAction => "record the post-permission action",
            Action::GenerateReport => "generate the report",
        };
        f.write_str(label)
    }
}
