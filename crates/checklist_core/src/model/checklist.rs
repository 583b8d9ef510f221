//! Checklist metadata model.
//!
//! # Responsibility
//! - Describe the checklist that owns one entry sequence.
//! - Provide dashboard-level aggregates over an owner's checklists.
//!
//! # Invariants
//! - `title` is non-blank after trim.
//! - A checklist belongs to exactly one owner.

use crate::model::entry::OrderedEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable checklist identifier. Also used as the sequence id.
pub type ChecklistId = Uuid;

/// Authenticated clinician identity.
pub type OwnerId = Uuid;

/// Title given to checklists created without one.
pub const DEFAULT_CHECKLIST_TITLE: &str = "New checklist";

/// Checklist read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub owner: OwnerId,
    pub title: String,
    pub description: Option<String>,
    /// Optional medical specialty label used for grouping.
    pub specialty_tag: Option<String>,
    /// Published checklists count toward the patient-facing total.
    pub is_published: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Checklist {
    /// Returns whether `term` matches title or description, ignoring case.
    ///
    /// A blank term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&needle))
    }
}

/// Editable checklist header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistDetails {
    pub title: String,
    pub description: Option<String>,
    pub specialty_tag: Option<String>,
}

impl Default for ChecklistDetails {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKLIST_TITLE)
    }
}

impl ChecklistDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            specialty_tag: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_specialty_tag(mut self, specialty_tag: impl Into<String>) -> Self {
        self.specialty_tag = Some(specialty_tag.into());
        self
    }
}

/// Public read-only view of a shared checklist.
///
/// Carries no owner id; author fields are absent when the author never
/// filled them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedChecklist {
    pub id: ChecklistId,
    pub title: String,
    pub description: Option<String>,
    pub author_name: Option<String>,
    pub clinic_name: Option<String>,
    /// Items in display order.
    pub entries: Vec<OrderedEntry>,
}

/// Dashboard counters for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSummary {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
}

impl ChecklistSummary {
    pub fn from_checklists<'a>(items: impl IntoIterator<Item = &'a Checklist>) -> Self {
        items
            .into_iter()
            .fold(Self::default(), |mut summary, checklist| {
                summary.total += 1;
                if checklist.is_published {
                    summary.published += 1;
                } else {
                    summary.drafts += 1;
                }
                summary
            })
    }
}
