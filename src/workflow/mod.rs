/// Cannibalization Workflow Layer
///
/// This module holds the four-stage approval pipeline:
/// - Stage records and form validation (Block A, B, C and the report)
/// - Case path locator shared by every stage
/// - State machine deciding which transition is legal
/// - Engine sequencing persist → notify for each transition
/// - Report rendering and export

// Stage records, forms and required-field validation
pub mod types;

// Case path generation and parsing
pub mod locator;

// Case lifecycle derived from stored records
pub mod state;

// Transition engine over the store, push gateway and exporter
pub mod engine;

// Stage D report text and exporters
pub mod report;

// Re-export commonly used types
pub use engine::{CaseSnapshot, TransitionOutcome, WorkflowEngine, WorkflowEvent};
pub use locator::CasePath;
pub use report::{FileReportExporter, ReportExporter};
pub use state::{Action, CaseState, Recipient};
pub use types::{
    ActionForm, ActionRecord, DonorSection, PermissionForm, PermissionRecord, RecipientSection,
    ReportRecord, RequestForm, RequestRecord, Stage,
};
