//! Persistence contract for ordered sequences.
//!
//! # Responsibility
//! - Define the narrow store interface the coordinator drives.
//! - Classify store failures into the reconciliation taxonomy.
//!
//! # Invariants
//! - Writes are independent per entry; no multi-row atomicity is assumed.
//! - Implementations never return a partially applied single write.

use crate::model::entry::{EntryId, EntryPayload, OrderedEntry};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of one ordered sequence (the owning checklist id).
pub type SequenceId = Uuid;

/// Result type used by sequence store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reconciliation failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network/service unavailable or timed out. Caller may retry.
    TransientStoreFailure,
    /// Entry or sequence unknown to the store. Local cache is stale.
    NotFoundFailure,
    /// Payload rejected. Never retried automatically.
    ValidationFailure,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::TransientStoreFailure => "transient",
            Self::NotFoundFailure => "not_found",
            Self::ValidationFailure => "validation",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by `SequenceStore` implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store unreachable, busy, or timed out.
    Transient(String),
    /// Sequence, or entry within it, does not exist for this session.
    NotFound {
        sequence_id: SequenceId,
        entry_id: Option<EntryId>,
    },
    /// Payload rejected by store-side validation.
    Validation(String),
}

impl StoreError {
    pub fn sequence_not_found(sequence_id: SequenceId) -> Self {
        Self::NotFound {
            sequence_id,
            entry_id: None,
        }
    }

    pub fn entry_not_found(sequence_id: SequenceId, entry_id: EntryId) -> Self {
        Self::NotFound {
            sequence_id,
            entry_id: Some(entry_id),
        }
    }

    /// Maps this error to its failure class.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) => FailureKind::TransientStoreFailure,
            Self::NotFound { .. } => FailureKind::NotFoundFailure,
            Self::Validation(_) => FailureKind::ValidationFailure,
        }
    }

    /// Only transient failures may be retried without a resync.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient(message) => write!(f, "store temporarily unavailable: {message}"),
            Self::NotFound {
                sequence_id,
                entry_id: Some(entry_id),
            } => write!(f, "entry {entry_id} not found in sequence {sequence_id}"),
            Self::NotFound {
                sequence_id,
                entry_id: None,
            } => write!(f, "sequence not found: {sequence_id}"),
            Self::Validation(message) => write!(f, "payload rejected: {message}"),
        }
    }
}

impl Error for StoreError {}

/// Backing store for ordered sequences.
///
/// Implementations receive an already-authenticated session at construction
/// time; nothing here consults ambient auth state.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Reads the full sequence, ordered by position.
    async fn read_sequence(&self, sequence_id: SequenceId) -> StoreResult<Vec<OrderedEntry>>;
    /// Persists one entry position.
    async fn write_entry_position(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        position: i64,
    ) -> StoreResult<()>;
    /// Persists one entry payload.
    async fn write_entry_payload(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        payload: &EntryPayload,
    ) -> StoreResult<()>;
    /// Creates one entry and returns its new id.
    async fn create_entry(
        &self,
        sequence_id: SequenceId,
        payload: &EntryPayload,
        position: i64,
    ) -> StoreResult<EntryId>;
    /// Deletes one entry.
    async fn delete_entry(&self, sequence_id: SequenceId, entry_id: EntryId) -> StoreResult<()>;
}
