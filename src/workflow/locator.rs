/// Case locator
///
/// A case is addressed by `request/<requesterIdentity>/<generatedId>`; its stage
/// records sit directly under it (`<case>/Block A` …) and its archived report at
/// `reports/<generatedId>`.

use crate::error::{Result, WorkflowError};
use crate::workflow::types::Stage;
use serde::{Deserialize, Serialize};

/// Collection holding every case, namespaced by requester
pub const CASE_COLLECTION: &str = "request";

/// Collection holding archived reports keyed by case id
pub const REPORT_COLLECTION: &str = "reports";

/// Structural key of one cannibalization case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CasePath {
    requester: String,
    case_id: String,
}

impl CasePath {
    /// Pure constructor from a requester identity and an already generated id
    pub fn new(requester: impl Into<String>, case_id: impl Into<String>) -> Result<Self> {
        let requester = requester.into();
        let case_id = case_id.into();
        for segment in [&requester, &case_id] {
            if segment.trim().is_empty() || segment.contains('/') {
                return Err(WorkflowError::InvalidCasePath(format!(
                    "{}/{}/{}",
                    CASE_COLLECTION, requester, case_id
                )));
            }
        }
        Ok(Self { requester, case_id })
    }

    /// Allocate a new case for a requester with a random opaque id
    pub fn generate(requester: impl Into<String>) -> Result<Self> {
        Self::new(requester, uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse `request/<identity>/<id>`; a leading slash is accepted
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            [collection, requester, case_id] if *collection == CASE_COLLECTION => {
                Self::new(*requester, *case_id)
            }
            _ => Err(WorkflowError::InvalidCasePath(path.to_string())),
        }
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Path of the record written for a stage; Stage D has none
    pub fn stage_path(&self, stage: Stage) -> Option<String> {
        stage
            .record_key()
            .map(|key| format!("{}/{}", self, key))
    }

    pub fn report_path(&self) -> String {
        format!("{}/{}", REPORT_COLLECTION, self.case_id)
    }
}

impl std::fmt::Display for CasePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", CASE_COLLECTION, self.requester, self.case_id)
    }
}

impl TryFrom<String> for CasePath {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self> {
        CasePath::parse(&value)
    }
}

impl From<CasePath> for String {
    fn from(path: CasePath) -> Self {
        path.to_string()
    }
}
