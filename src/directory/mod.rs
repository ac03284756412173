/// Role directory and session context
///
/// Users are bound to exactly one role at sign-up. Profiles live in one
/// collection per role (`user0` … `user6`, keyed by email) and each role has a
/// token slot (`users/user<N>`) holding the push token the workflow notifies.
/// Sign-in resolves the role by probing the role collections in a fixed order
/// and produces an immutable [`Session`] that is passed to every workflow call.

use crate::error::{AuthFailureKind, Result, WorkflowError};
use crate::store::{DocumentStore, SetOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Closed set of workflow roles, numbered 0–6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    /// Shift in-charge / certifying staff: raises requests and records the swap
    Requester,
    /// Rotable planning: grants permission (Stage B)
    RotablePlanning,
    /// Maintenance control: read-only access to cases and reports
    MaintenanceControl,
    /// Chief MOC: approves the granted permission
    ChiefMoc,
    /// RP office: verifies the action and generates the report
    RpOfficer,
    Observer5,
    Observer6,
}

impl Role {
    /// Order in which role collections are probed at sign-in; first match wins
    pub const SCAN_ORDER: [Role; 7] = [
        Role::Requester,
        Role::RotablePlanning,
        Role::MaintenanceControl,
        Role::ChiefMoc,
        Role::RpOfficer,
        Role::Observer5,
        Role::Observer6,
    ];

    pub fn number(self) -> u8 {
        match self {
            Role::Requester => 0,
            Role::RotablePlanning => 1,
            Role::MaintenanceControl => 2,
            Role::ChiefMoc => 3,
            Role::RpOfficer => 4,
            Role::Observer5 => 5,
            Role::Observer6 => 6,
        }
    }

    pub fn from_number(number: u8) -> Option<Role> {
        Role::SCAN_ORDER.get(number as usize).copied()
    }

    /// Silent roles never act in the workflow
    pub fn is_silent(self) -> bool {
        matches!(self, Role::Observer5 | Role::Observer6)
    }

    /// Collection holding the profiles of users bound to this role
    pub fn directory_collection(self) -> String {
        format!("user{}", self.number())
    }

    /// Document holding the push token notified for this role
    pub fn token_slot_path(self) -> String {
        format!("users/user{}", self.number())
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::RotablePlanning => "rotable planning",
            Role::MaintenanceControl => "maintenance control",
            Role::ChiefMoc => "chief MOC",
            Role::RpOfficer => "RP officer",
            Role::Observer5 | Role::Observer6 => "observer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user{} ({})", self.number(), self.label())
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.number()
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Role::from_number(value).ok_or_else(|| format!("unknown role number {}", value))
    }
}

/// Profile stored under `user<N>/<email>` at sign-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub profession: String,
    pub role: Option<Role>,
    pub email: String,
    /// Push token of the registering device
    pub token: String,
}

/// Explicit identity of the acting user, populated once at sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub push_token: Option<String>,
}

impl Session {
    pub fn new(
        email: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
        push_token: Option<String>,
    ) -> Self {
        Self {
            email: email.into(),
            role,
            display_name: display_name.into(),
            push_token,
        }
    }
}

/// Directory of users, roles and role token slots
#[derive(Clone)]
pub struct RoleDirectory {
    store: Arc<dyn DocumentStore>,
}

impl RoleDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Sign-up: bind the email to the chosen role and register its push token
    pub async fn register(&self, profile: &UserProfile) -> Result<Role> {
        let role = validate_profile(profile)?;

        // A role is bound once and never reassigned
        match self.resolve_role(&profile.email).await {
            Ok(bound) => {
                tracing::warn!("🚫 {} is already registered as {}", profile.email, bound);
                return Err(WorkflowError::AuthFailure(AuthFailureKind::EmailInUse));
            }
            Err(WorkflowError::AuthFailure(AuthFailureKind::RoleNotRecognized)) => {}
            Err(e) => return Err(e),
        }

        let profile_path = format!("{}/{}", role.directory_collection(), profile.email);
        self.store
            .set(&profile_path, serde_json::to_value(profile)?, SetOptions::replace())
            .await?;

        self.store
            .set(
                &role.token_slot_path(),
                json!({ "expoPushToken": profile.token }),
                SetOptions::merge(),
            )
            .await?;

        tracing::info!("👤 Registered {} as {}", profile.email, role);
        Ok(role)
    }

    /// Probe every role collection in scan order; the first one holding the email wins
    pub async fn resolve_role(&self, email: &str) -> Result<Role> {
        validate_email(email)?;

        for role in Role::SCAN_ORDER {
            let path = format!("{}/{}", role.directory_collection(), email);
            if self.store.get(&path).await?.is_some() {
                tracing::debug!("🔍 Resolved {} to {}", email, role);
                return Ok(role);
            }
        }

        tracing::warn!("❌ No role registered for {}", email);
        Err(WorkflowError::AuthFailure(AuthFailureKind::RoleNotRecognized))
    }

    /// Build the session for an authenticated email
    pub async fn sign_in(&self, email: &str) -> Result<Session> {
        let role = self.resolve_role(email).await?;
        let profile = self.profile(role, email).await?.unwrap_or_default();

        Ok(Session {
            email: email.to_string(),
            role,
            display_name: profile.name,
            push_token: Some(profile.token).filter(|t| !t.is_empty()),
        })
    }

    pub async fn profile(&self, role: Role, email: &str) -> Result<Option<UserProfile>> {
        let path = format!("{}/{}", role.directory_collection(), email);
        match self.store.get(&path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Push token currently registered for a role
    pub async fn token_for(&self, role: Role) -> Result<Option<String>> {
        let slot = self.store.get(&role.token_slot_path()).await?;
        Ok(slot
            .as_ref()
            .and_then(|doc| doc.get("expoPushToken"))
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }
}

fn validate_profile(profile: &UserProfile) -> Result<Role> {
    let required = [
        ("name", &profile.name),
        ("profession", &profile.profession),
        ("email", &profile.email),
        ("token", &profile.token),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(WorkflowError::ValidationFailure { field });
        }
    }
    profile
        .role
        .ok_or(WorkflowError::ValidationFailure { field: "role" })
}

fn validate_email(email: &str) -> Result<()> {
    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);
    if !well_formed || email.contains('/') || email.chars().any(char::is_whitespace) {
        return Err(WorkflowError::AuthFailure(AuthFailureKind::InvalidEmail));
    }
    Ok(())
}
