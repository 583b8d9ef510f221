//! Ordered entry domain model.
//!
//! # Responsibility
//! - Define the line item stored inside one checklist sequence.
//! - Validate entry payloads before any persistence attempt.
//!
//! # Invariants
//! - `id` is stable and unique within its owning sequence.
//! - `position` is non-negative and never shared by two persisted entries.
//! - Entries have no existence outside their owning sequence.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one checklist entry.
pub type EntryId = Uuid;

/// Maximum entry content length in characters after trim.
pub const MAX_ENTRY_CONTENT_CHARS: usize = 2000;

/// Validation failures for entry payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Content is blank after trim.
    EmptyContent,
    /// Content exceeds `MAX_ENTRY_CONTENT_CHARS`.
    ContentTooLong { chars: usize },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "entry content must not be blank"),
            Self::ContentTooLong { chars } => write!(
                f,
                "entry content has {chars} characters; limit is {MAX_ENTRY_CONTENT_CHARS}"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// Content carried by one checklist line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Line text shown to the patient.
    pub content: String,
    /// Tick state shown in the shared view.
    pub is_checked: bool,
}

impl EntryPayload {
    /// Creates an unchecked payload.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_checked: false,
        }
    }

    /// Returns a copy with the given tick state.
    pub fn checked(mut self, is_checked: bool) -> Self {
        self.is_checked = is_checked;
        self
    }

    /// Validates payload invariants.
    ///
    /// # Errors
    /// - `EmptyContent` when `content` is blank after trim.
    /// - `ContentTooLong` when trimmed content exceeds the limit.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        let trimmed = self.content.trim();
        if trimmed.is_empty() {
            return Err(EntryValidationError::EmptyContent);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_ENTRY_CONTENT_CHARS {
            return Err(EntryValidationError::ContentTooLong { chars });
        }
        Ok(())
    }
}

/// One item of an explicitly ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedEntry {
    /// Stable entry id.
    pub id: EntryId,
    /// Ordinal position. Display order is ascending `position`.
    pub position: i64,
    /// Opaque line content.
    pub payload: EntryPayload,
}

impl OrderedEntry {
    pub fn new(id: EntryId, position: i64, payload: EntryPayload) -> Self {
        Self {
            id,
            position,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryPayload, EntryValidationError, MAX_ENTRY_CONTENT_CHARS};

    #[test]
    fn blank_content_is_rejected() {
        let err = EntryPayload::new("   \n").validate().unwrap_err();
        assert_eq!(err, EntryValidationError::EmptyContent);
    }

    #[test]
    fn oversized_content_is_rejected() {
        let payload = EntryPayload::new("x".repeat(MAX_ENTRY_CONTENT_CHARS + 1));
        assert!(matches!(
            payload.validate(),
            Err(EntryValidationError::ContentTooLong { chars }) if chars == MAX_ENTRY_CONTENT_CHARS + 1
        ));
    }

    #[test]
    fn checked_builder_sets_flag() {
        let payload = EntryPayload::new("Take vitamin D").checked(true);
        assert!(payload.is_checked);
        assert!(payload.validate().is_ok());
    }
}
