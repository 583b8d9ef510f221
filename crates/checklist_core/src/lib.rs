//! Core domain logic for clinician checklists.
//! This crate is the single source of truth for ordering and reconciliation
//! invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sequence;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::checklist::{
    Checklist, ChecklistDetails, ChecklistId, ChecklistSummary, OwnerId, SharedChecklist,
};
pub use model::document::{ChecklistDocument, ContactLine, DocumentItem, LineRole};
pub use model::entry::{EntryId, EntryPayload, EntryValidationError, OrderedEntry};
pub use model::profile::ClinicianProfile;
pub use repo::checklist_repo::{ChecklistRepository, SqliteChecklistRepository};
pub use repo::common::{RepoError, RepoResult};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::sequence_store::{SqliteSequenceStore, StoreSession};
pub use sequence::coordinator::{
    CoordinatorConfig, CoordinatorError, CoordinatorPhase, OperationKind, ReconcileFailure,
    ReconciliationCoordinator, ReconciliationEvent,
};
pub use sequence::reorder::{Assignment, MoveInstruction, ReorderError, ReorderOutcome};
pub use sequence::retry::RetryPolicy;
pub use sequence::store::{FailureKind, SequenceId, SequenceStore, StoreError, StoreResult};
pub use service::checklist_service::{share_link, ChecklistService, ChecklistServiceError};
pub use service::export_service::ExportService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
