/// Cannibalization workflow engine
///
/// One operation per transition of the pipeline. Every transition follows the
/// same sequence, strictly in order:
/// 1. check the acting role and the submitted form (no I/O yet)
/// 2. check the case has reached the required state
/// 3. persist the stage record (the only write before dispatch)
/// 4. look up the recipient's push token and dispatch one notification
/// 5. append the notification to the canonical stream
///
/// Steps 4 and 5 never undo step 3: a failed dispatch is reported in the
/// returned outcome and the transition still counts as complete.

use crate::directory::{Role, RoleDirectory, Session};
use crate::error::{Result, WorkflowError};
use crate::notify::{Delivery, NotificationInbox, NotificationRecord, PushGateway, PushMessage};
use crate::store::{DocumentStore, SetOptions};
use crate::workflow::locator::{CasePath, REPORT_COLLECTION};
use crate::workflow::report::{render_report, ReportExporter};
use crate::workflow::state::{Action, CaseState, Recipient};
use crate::workflow::types::{
    ActionForm, ActionRecord, PermissionForm, PermissionRecord, ReportRecord, RequestForm,
    RequestRecord, Stage,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Something the engine did that the caller may react to (navigate, alert, log)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A stage was persisted and its recipient was (or could not be) notified
    StageCompleted {
        case: CasePath,
        action: Action,
        stage: Stage,
        recipient: Role,
        delivery: Delivery,
    },
    ReportExported {
        case: CasePath,
        location: String,
    },
    ReportExportFailed {
        case: CasePath,
        reason: String,
    },
}

/// Result of a successful transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub case: CasePath,
    pub state: CaseState,
    pub events: Vec<WorkflowEvent>,
}

impl TransitionOutcome {
    /// Delivery result of the transition's notification
    pub fn delivery(&self) -> Option<&Delivery> {
        self.events.iter().find_map(|event| match event {
            WorkflowEvent::StageCompleted { delivery, .. } => Some(delivery),
            _ => None,
        })
    }
}

/// Everything stored for one case
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSnapshot {
    pub case: CasePath,
    /// `None` when the case has no Stage A record
    pub state: Option<CaseState>,
    pub request: Option<RequestRecord>,
    pub permission: Option<PermissionRecord>,
    pub action: Option<ActionRecord>,
    pub report: Option<ReportRecord>,
}

/// The four-stage approval pipeline over a document store and a push relay
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<dyn PushGateway>,
    exporter: Arc<dyn ReportExporter>,
    directory: RoleDirectory,
    inbox: NotificationInbox,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PushGateway>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            directory: RoleDirectory::new(Arc::clone(&store)),
            inbox: NotificationInbox::new(Arc::clone(&store)),
            store,
            gateway,
            exporter,
        }
    }

    pub fn directory(&self) -> &RoleDirectory {
        &self.directory
    }

    pub fn inbox(&self) -> &NotificationInbox {
        &self.inbox
    }

    /// Allocate the path of a new case for the signed-in requester
    ///
    /// The path is generated once and reused for every later stage, so a
    /// resubmitted Stage A overwrites the same record.
    pub fn open_case(&self, session: &Session) -> Result<CasePath> {
        authorize(session, Action::SubmitRequest)?;
        CasePath::generate(&session.email)
    }

    /// Stage A: record the request and notify rotable planning
    pub async fn submit_request(
        &self,
        session: &Session,
        case: &CasePath,
        form: RequestForm,
    ) -> Result<TransitionOutcome> {
        let action = Action::SubmitRequest;
        authorize(session, action)?;
        authorize_owner(session, case, action)?;
        form.validate()?;

        tracing::info!("📝 {} submitting request {}", session.email, case);

        let record = RequestRecord {
            form,
            token: session.push_token.clone().unwrap_or_default(),
            user_name: session.display_name.clone(),
            created_at: Utc::now(),
        };
        self.persist_stage(case, Stage::A, &record).await?;

        let event = self
            .dispatch(
                case,
                action,
                None,
                "Cannibalization Request",
                format!(
                    "A new cannibalization request has been submitted by {}.",
                    session.display_name
                ),
            )
            .await;

        Ok(self.complete(case, action, action.resulting_state(), vec![event]))
    }

    /// Stage B: record the permission and notify the chief MOC
    pub async fn record_permission(
        &self,
        session: &Session,
        case: &CasePath,
        form: PermissionForm,
    ) -> Result<TransitionOutcome> {
        let action = Action::RecordPermission;
        authorize(session, action)?;
        form.validate()?;

        let snapshot = self.load_case(case).await?;
        check_transition(&snapshot, action)?;

        tracing::info!("🛂 {} recording permission for {}", session.email, case);

        // A rerun keeps an approval already given
        let record = PermissionRecord {
            form,
            status: format!("Verified by {}", session.display_name),
            created_at: Utc::now(),
            approved_by: snapshot.permission.and_then(|previous| previous.approved_by),
        };
        self.persist_stage(case, Stage::B, &record).await?;
        let state = CaseState::derive(
            true,
            Some(record.is_approved()),
            snapshot.action.is_some(),
            snapshot.report.is_some(),
        )
        .unwrap_or(CaseState::PermissionPending);

        let event = self
            .dispatch(
                case,
                action,
                None,
                "Cannibalization Request Verified",
                format!(
                    "A new request has been verified by {}. Please review it.",
                    session.display_name
                ),
            )
            .await;

        Ok(self.complete(case, action, state, vec![event]))
    }

    /// Approval amendment on Stage B; notifies the requester to act
    pub async fn approve_permission(&self, session: &Session, case: &CasePath) -> Result<TransitionOutcome> {
        let action = Action::ApprovePermission;
        authorize(session, action)?;

        let snapshot = self.load_case(case).await?;
        check_transition(&snapshot, action)?;
        let requester_token = snapshot.request.as_ref().map(|r| r.token.clone());

        tracing::info!("✅ {} approving permission for {}", session.email, case);

        let path = stage_path(case, Stage::B)?;
        self.store
            .set(&path, json!({ "approvedBy": session.display_name }), SetOptions::merge())
            .await?;

        let event = self
            .dispatch(
                case,
                action,
                requester_token.as_deref(),
                "Cannibalization Permission Approved",
                format!(
                    "Permission approved by {}. Please carry out the donor section action.",
                    session.display_name
                ),
            )
            .await;

        Ok(self.complete(case, action, action.resulting_state(), vec![event]))
    }

    /// Stage C: record donor and recipient sections in one write; notify the RP office
    pub async fn record_action(
        &self,
        session: &Session,
        case: &CasePath,
        form: ActionForm,
    ) -> Result<TransitionOutcome> {
        let action = Action::RecordAction;
        authorize(session, action)?;
        authorize_owner(session, case, action)?;
        form.validate()?;

        let snapshot = self.load_case(case).await?;
        check_transition(&snapshot, action)?;

        tracing::info!("🔧 {} recording post-permission action for {}", session.email, case);

        let record = ActionRecord {
            form,
            status: format!("Recorded by {}", session.display_name),
            created_at: Utc::now(),
        };
        self.persist_stage(case, Stage::C, &record).await?;

        let event = self
            .dispatch(
                case,
                action,
                None,
                "Post-Permission Action Request Verification",
                format!(
                    "Post-permission action recorded by {}. Please verify and generate the report.",
                    session.display_name
                ),
            )
            .await;

        Ok(self.complete(case, action, action.resulting_state(), vec![event]))
    }

    /// Stage D: render, archive and export the report; notify the requester
    pub async fn generate_report(&self, session: &Session, case: &CasePath) -> Result<TransitionOutcome> {
        let action = Action::GenerateReport;
        authorize(session, action)?;

        let snapshot = self.load_case(case).await?;
        check_transition(&snapshot, action)?;
        let (request, permission, action_record) =
            match (&snapshot.request, &snapshot.permission, &snapshot.action) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => return Err(incomplete(&snapshot)),
            };

        tracing::info!("📊 {} generating report for {}", session.email, case);

        let case_path = case.to_string();
        let report = ReportRecord {
            content: render_report(&case_path, request, permission, action_record, &session.display_name),
            path: case_path,
            generated_by: session.display_name.clone(),
            created_at: Utc::now(),
        };
        self.store
            .set(&case.report_path(), serde_json::to_value(&report)?, SetOptions::replace())
            .await?;

        let mut events = Vec::with_capacity(2);
        match self.exporter.export(case.case_id(), &report.content).await {
            Ok(location) => events.push(WorkflowEvent::ReportExported {
                case: case.clone(),
                location,
            }),
            Err(e) => {
                tracing::warn!("⚠️ Report for {} archived but export failed: {}", case, e);
                events.push(WorkflowEvent::ReportExportFailed {
                    case: case.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let event = self
            .dispatch(
                case,
                action,
                Some(request.token.as_str()),
                "Cannibalization Report Generated",
                format!(
                    "The report for {} ({}) was generated by {}.",
                    request.form.nomenclature, request.form.part_no, session.display_name
                ),
            )
            .await;
        events.push(event);

        Ok(self.complete(case, action, action.resulting_state(), events))
    }

    /// Read every record of a case and derive its state
    pub async fn load_case(&self, case: &CasePath) -> Result<CaseSnapshot> {
        let request: Option<RequestRecord> = self.read_stage(case, Stage::A).await?;
        let permission: Option<PermissionRecord> = self.read_stage(case, Stage::B).await?;
        let action: Option<ActionRecord> = self.read_stage(case, Stage::C).await?;
        let report: Option<ReportRecord> = match self.store.get(&case.report_path()).await? {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };

        let state = CaseState::derive(
            request.is_some(),
            permission.as_ref().map(PermissionRecord::is_approved),
            action.is_some(),
            report.is_some(),
        );

        Ok(CaseSnapshot {
            case: case.clone(),
            state,
            request,
            permission,
            action,
            report,
        })
    }

    /// Every archived report
    pub async fn list_reports(&self) -> Result<Vec<ReportRecord>> {
        let mut reports = Vec::new();
        for document in self.store.list(REPORT_COLLECTION).await? {
            reports.push(serde_json::from_value(document.data)?);
        }
        Ok(reports)
    }

    async fn persist_stage<T: Serialize>(&self, case: &CasePath, stage: Stage, record: &T) -> Result<()> {
        let path = stage_path(case, stage)?;
        self.store
            .set(&path, serde_json::to_value(record)?, SetOptions::replace())
            .await
            .map_err(|e| {
                tracing::error!("❌ Failed to persist {} for {}: {}", stage, case, e);
                e
            })
    }

    async fn read_stage<T: DeserializeOwned>(&self, case: &CasePath, stage: Stage) -> Result<Option<T>> {
        let path = stage_path(case, stage)?;
        match self.store.get(&path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Notify the transition's recipient and append to the notification stream.
    /// Never fails: problems are logged and reported in the returned event.
    async fn dispatch(
        &self,
        case: &CasePath,
        action: Action,
        requester_token: Option<&str>,
        title: &str,
        body: String,
    ) -> WorkflowEvent {
        let recipient = action.recipient();
        let token = match recipient {
            Recipient::Role(role) => self.directory.token_for(role).await,
            Recipient::CaseRequester => Ok(requester_token
                .filter(|token| !token.trim().is_empty())
                .map(str::to_string)),
        };

        let delivery = match token {
            Ok(Some(to)) => {
                let message = PushMessage {
                    to,
                    title: title.to_string(),
                    body: body.clone(),
                    data: json!({
                        "path": case.to_string(),
                        "caseId": case.case_id(),
                        "stage": action.stage(),
                    }),
                };
                match self.gateway.send(&message).await {
                    Ok(()) => Delivery::Delivered,
                    Err(e) => Delivery::Undeliverable { reason: e.to_string() },
                }
            }
            Ok(None) => Delivery::Undeliverable {
                reason: format!("no push token registered for {}", recipient.role()),
            },
            Err(e) => Delivery::Undeliverable { reason: e.to_string() },
        };

        match &delivery {
            Delivery::Delivered => tracing::info!("📨 Notified {} about {}", recipient.role(), case),
            Delivery::Undeliverable { reason } => {
                tracing::warn!("⚠️ Could not notify {} about {}: {}", recipient.role(), case, reason)
            }
        }

        let record = NotificationRecord::new(title, body, case.to_string(), recipient.role());
        if let Err(e) = self.inbox.append(&record).await {
            tracing::error!("❌ Failed to append notification for {}: {}", case, e);
        }

        WorkflowEvent::StageCompleted {
            case: case.clone(),
            action,
            stage: action.stage(),
            recipient: recipient.role(),
            delivery,
        }
    }

    fn complete(
        &self,
        case: &CasePath,
        action: Action,
        state: CaseState,
        events: Vec<WorkflowEvent>,
    ) -> TransitionOutcome {
        tracing::info!("🎉 {} complete: {} is now {}", action, case, state);
        TransitionOutcome {
            case: case.clone(),
            state,
            events,
        }
    }
}

/// Only the designated role may act, and it must have a name to sign with
fn authorize(session: &Session, action: Action) -> Result<()> {
    if session.role != action.actor() {
        tracing::warn!("🚫 {} ({}) attempted to {}", session.email, session.role, action);
        return Err(WorkflowError::RoleNotPermitted {
            role: session.role,
            action,
        });
    }
    if session.display_name.trim().is_empty() {
        return Err(WorkflowError::ValidationFailure { field: "actorName" });
    }
    Ok(())
}

/// Requester actions are limited to the requester's own cases
fn authorize_owner(session: &Session, case: &CasePath, action: Action) -> Result<()> {
    if case.requester() != session.email {
        tracing::warn!("🚫 {} attempted to {} on {}", session.email, action, case);
        return Err(WorkflowError::RoleNotPermitted {
            role: session.role,
            action,
        });
    }
    Ok(())
}

/// Precondition check against the stored records
fn check_transition(snapshot: &CaseSnapshot, action: Action) -> Result<()> {
    if action == Action::GenerateReport {
        return match incomplete(snapshot) {
            WorkflowError::IncompleteData { missing } if missing.is_empty() => Ok(()),
            err => Err(err),
        };
    }

    let state = snapshot
        .state
        .ok_or(WorkflowError::PrerequisiteMissing { stage: Stage::A })?;

    let needs_permission = matches!(action, Action::ApprovePermission | Action::RecordAction);
    if needs_permission && snapshot.permission.is_none() {
        return Err(WorkflowError::PrerequisiteMissing { stage: Stage::B });
    }

    if !state.permits(action) {
        return Err(WorkflowError::IllegalTransition { state, action });
    }
    Ok(())
}

fn incomplete(snapshot: &CaseSnapshot) -> WorkflowError {
    let mut missing = Vec::new();
    if snapshot.request.is_none() {
        missing.push(Stage::A);
    }
    if snapshot.permission.is_none() {
        missing.push(Stage::B);
    }
    if snapshot.action.is_none() {
        missing.push(Stage::C);
    }
    WorkflowError::IncompleteData { missing }
}

fn stage_path(case: &CasePath, stage: Stage) -> Result<String> {
    case.stage_path(stage)
        .ok_or_else(|| WorkflowError::InvalidCasePath(format!("{} has no record for {}", case, stage)))
}
