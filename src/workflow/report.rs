/// Stage D report
///
/// The verifying officer's report is a flat text rendering of Stages A–C. It is
/// archived in the store by the engine and handed to a [`ReportExporter`] for
/// local export.

use crate::error::{Result, WorkflowError};
use crate::workflow::types::{ActionRecord, PermissionRecord, RequestRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Render the report text for a case
pub fn render_report(
    case_path: &str,
    request: &RequestRecord,
    permission: &PermissionRecord,
    action: &ActionRecord,
    officer: &str,
) -> String {
    let a = &request.form;
    let b = &permission.form;
    let donor = &action.form.donor_section;
    let recipient = &action.form.recipient_section;

    let lines = vec![
        "Cannibalization Request Report".to_string(),
        format!("Case: {}", case_path),
        String::new(),
        "Block A:".to_string(),
        format!("- Nomenclature: {}", a.nomenclature),
        format!("- Part No: {}", a.part_no),
        format!("- Recipient Reg: {}", a.recipient_reg),
        format!("- Recipient Station: {}", a.recipient_station),
        format!("- Voucher No: {}", a.voucher_no),
        format!("- Reason: {}", a.reason),
        format!("- ATLB Ref: {}", a.atlb),
        format!("- Requested By: {}", request.user_name),
        format!("- Requested At: {}", timestamp(&request.created_at)),
        String::new(),
        "Block B:".to_string(),
        format!("- Donor Reg: {}", b.donor_reg),
        format!("- Preserved: {}", yes_no(b.preserved)),
        format!("- C of A Valid: {}", yes_no(b.c_of_a_valid)),
        format!("- Remarks: {}", b.remarks),
        format!("- Approval Ref: {}", b.approval_ref),
        format!("- Status: {}", permission.status),
        format!("- Approved By: {}", permission.approved_by.as_deref().unwrap_or("")),
        format!("- Responded At: {}", timestamp(&permission.created_at)),
        String::new(),
        "Block C:".to_string(),
        "Donor Section:".to_string(),
        format!("- Defects: {}", yes_no(donor.defects)),
        format!("- Serviceability: {}", yes_no(donor.serviceability)),
        format!("- Inspected: {}", yes_no(donor.inspected)),
        format!("- ATLB Ref No: {}", donor.atlb_ref_no),
        format!("- Remarks: {}", donor.remarks),
        "Recipient Section:".to_string(),
        format!("- Off Part No: {}", recipient.off_part_no),
        format!("- On Part No: {}", recipient.on_part_no),
        format!("- Off Serial No: {}", recipient.off_serial_no),
        format!("- On Serial No: {}", recipient.on_serial_no),
        format!("- Off Location: {}", recipient.off_location),
        format!("- On Location: {}", recipient.on_location),
        format!("- Other Detail: {}", recipient.other_detail),
        format!("- IPC Ref: {}", recipient.ipc_ref),
        format!("- Inspected: {}", yes_no(recipient.inspected)),
        format!("- Maintenance History: {}", yes_no(recipient.maintenance_history)),
        format!("- ATLB Ref No: {}", recipient.atlb_ref_no),
        format!("- Remarks: {}", recipient.remarks),
        format!("- Status: {}", action.status),
        format!("- Recorded At: {}", timestamp(&action.created_at)),
        String::new(),
        format!("DCE RP OFFICER: {}", officer),
    ];

    lines.join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Hand-off of the finished report to a local export target
#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Export the report content; returns a description of where it went
    async fn export(&self, case_id: &str, content: &str) -> Result<String>;
}

/// Writes `cannibalization_report_<caseId>.txt` into a directory
#[derive(Debug, Clone)]
pub struct FileReportExporter {
    dir: PathBuf,
}

impl FileReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self, case_id: &str) -> PathBuf {
        self.dir.join(format!("cannibalization_report_{}.txt", case_id))
    }
}

#[async_trait]
impl ReportExporter for FileReportExporter {
    async fn export(&self, case_id: &str, content: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| WorkflowError::ExportFailure(format!("{}: {}", self.dir.display(), e)))?;

        let file_path = self.file_path(case_id);
        tokio::fs::write(&file_path, content)
            .await
            .map_err(|e| WorkflowError::ExportFailure(format!("{}: {}", file_path.display(), e)))?;

        tracing::info!("📄 Report exported: {}", file_path.display());
        Ok(file_path.display().to_string())
    }
}
