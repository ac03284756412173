/// Stage form and record definitions
///
/// Forms are what the acting role submits; records are what gets persisted
/// (form fields plus engine-populated fields such as status and timestamps).
/// Field names are serialized exactly as the stored documents use them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// The four fixed stages of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Request
    A,
    /// Permission
    B,
    /// Post-permission action
    C,
    /// Verification and report (no stage record)
    D,
}

impl Stage {
    /// Key of the stage record under the case path
    pub fn record_key(self) -> Option<&'static str> {
        match self {
            Stage::A => Some("Block A"),
            Stage::B => Some("Block B"),
            Stage::C => Some("Block C"),
            Stage::D => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Stage::A => "A",
            Stage::B => "B",
            Stage::C => "C",
            Stage::D => "D",
        };
        write!(f, "Stage {}", letter)
    }
}

/// Reject the first required field that is empty or whitespace
fn require(fields: &[(&'static str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(WorkflowError::ValidationFailure { field: *field }),
        None => Ok(()),
    }
}

/// Stage A form submitted by the requester
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestForm {
    pub nomenclature: String,
    pub part_no: String,
    /// Recipient aircraft registration
    pub recipient_reg: String,
    pub recipient_station: String,
    /// Stock-void (NIL-in-stock) voucher number; optional
    pub voucher_no: String,
    pub reason: String,
    /// Technical log reference number
    #[serde(rename = "ATLB")]
    pub atlb: String,
}

impl RequestForm {
    pub fn validate(&self) -> Result<()> {
        require(&[
            ("nomenclature", self.nomenclature.as_str()),
            ("partNo", self.part_no.as_str()),
            ("recipientReg", self.recipient_reg.as_str()),
            ("recipientStation", self.recipient_station.as_str()),
            ("reason", self.reason.as_str()),
            ("ATLB", self.atlb.as_str()),
        ])
    }
}

/// Persisted `Block A`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(flatten)]
    pub form: RequestForm,
    /// Requester's push token, used to notify them later in the chain
    #[serde(default)]
    pub token: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// Stage B form submitted by rotable planning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionForm {
    /// Donor aircraft registration
    pub donor_reg: String,
    /// Donor aircraft adequately preserved
    pub preserved: bool,
    /// Certificate of airworthiness valid
    #[serde(rename = "cOfAValid")]
    pub c_of_a_valid: bool,
    pub remarks: String,
    pub approval_ref: String,
}

impl PermissionForm {
    pub fn validate(&self) -> Result<()> {
        require(&[("donorReg", self.donor_reg.as_str())])
    }
}

/// Persisted `Block B`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    #[serde(flatten)]
    pub form: PermissionForm,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Set by the chief MOC approval amendment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

impl PermissionRecord {
    pub fn is_approved(&self) -> bool {
        self.approved_by
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Donor aircraft side of Stage C
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DonorSection {
    /// Last flight revealed no defects
    pub defects: bool,
    /// No unusual event affecting serviceability
    pub serviceability: bool,
    /// Inspected and serviceable tag issued
    pub inspected: bool,
    pub atlb_ref_no: String,
    pub remarks: String,
}

/// Recipient aircraft side of Stage C (the off/on swap)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipientSection {
    pub off_part_no: String,
    pub off_serial_no: String,
    pub off_location: String,
    pub on_part_no: String,
    pub on_serial_no: String,
    pub on_location: String,
    pub other_detail: String,
    /// Illustrated parts catalogue reference
    pub ipc_ref: String,
    pub inspected: bool,
    pub maintenance_history: bool,
    pub atlb_ref_no: String,
    pub remarks: String,
}

/// Stage C form: both sections are written together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionForm {
    pub donor_section: DonorSection,
    pub recipient_section: RecipientSection,
}

impl ActionForm {
    pub fn validate(&self) -> Result<()> {
        let donor = &self.donor_section;
        let recipient = &self.recipient_section;
        require(&[
            ("donorSection.atlbRefNo", donor.atlb_ref_no.as_str()),
            ("recipientSection.offPartNo", recipient.off_part_no.as_str()),
            ("recipientSection.offSerialNo", recipient.off_serial_no.as_str()),
            ("recipientSection.onPartNo", recipient.on_part_no.as_str()),
            ("recipientSection.onSerialNo", recipient.on_serial_no.as_str()),
            ("recipientSection.ipcRef", recipient.ipc_ref.as_str()),
        ])
    }
}

/// Persisted `Block C`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    #[serde(flatten)]
    pub form: ActionForm,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Archived Stage D report (`reports/<caseId>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub content: String,
    pub path: String,
    pub generated_by: String,
    pub created_at: DateTime<Utc>,
}
