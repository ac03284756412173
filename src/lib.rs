/// Canniflow: aircraft part cannibalization approval workflow
///
/// This library provides the four-stage approval pipeline (request, permission,
/// post-permission action, report) with role-routed push notifications over a
/// document store.

// Core configuration and setup
pub mod config;

// Error taxonomy shared by every layer
pub mod error;

// Document store abstraction - in-memory and SQLite adapters with change feeds
pub mod store;

// Role directory - sign-up, role resolution and push token slots
pub mod directory;

// Notification layer - push relay client and the canonical inbox stream
pub mod notify;

// Workflow layer - stage records, state machine, engine and reports
pub mod workflow;

// HTTP API layer - REST endpoints for users, cases, notifications and reports
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use directory::{Role, RoleDirectory, Session, UserProfile};
pub use error::{Result, WorkflowError};
pub use workflow::{CasePath, CaseState, TransitionOutcome, WorkflowEngine, WorkflowEvent};
pub use server::start_server;
