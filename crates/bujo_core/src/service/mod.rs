//! Endpoint-level use cases.
//!
//! # Responsibility
//! - Turn wire-level request values into core queries.
//! - Wire the collaborator contracts to the aggregation and signal cores.
//!
//! # Invariants
//! - Services never decide access; they ask the project directory.
//! - Every call logs start and outcome under one request id.

pub mod project_items;
pub mod updates;

pub use project_items::ProjectItemsService;
pub use updates::SystemUpdatesService;

pub(crate) fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
