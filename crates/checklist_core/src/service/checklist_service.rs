//! Checklist use-case service.
//!
//! # Responsibility
//! - Validate checklist header invariants above repository layer.
//! - Provide dashboard listing, search, summary and share-link helpers.
//! - Serve the public shared view of one checklist.
//!
//! # Invariants
//! - Titles are trimmed and never blank when persisted.
//! - Blank descriptions and specialty tags are stored as `None`.
//! - Mutations are scoped to the calling owner.

use crate::model::checklist::{
    Checklist, ChecklistDetails, ChecklistId, ChecklistSummary, OwnerId, SharedChecklist,
};
use crate::repo::checklist_repo::ChecklistRepository;
use crate::repo::common::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from checklist service operations.
#[derive(Debug)]
pub enum ChecklistServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target checklist does not exist.
    ChecklistNotFound(ChecklistId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ChecklistServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "checklist title must not be blank"),
            Self::ChecklistNotFound(id) => write!(f, "checklist not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChecklistServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ChecklistServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ChecklistNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Checklist service facade.
pub struct ChecklistService<R: ChecklistRepository> {
    repo: R,
}

impl<R: ChecklistRepository> ChecklistService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a checklist. `ChecklistDetails::default()` carries the
    /// default title.
    pub fn create_checklist(
        &self,
        owner: OwnerId,
        details: ChecklistDetails,
    ) -> Result<Checklist, ChecklistServiceError> {
        let details = normalize_details(details)?;
        let checklist = self.repo.create_checklist(owner, &details)?;
        info!(
            "event=checklist_create module=service status=ok checklist_id={} owner={}",
            checklist.id, owner
        );
        Ok(checklist)
    }

    /// Loads one checklist by id.
    pub fn get_checklist(&self, id: ChecklistId) -> Result<Checklist, ChecklistServiceError> {
        self.repo
            .get_checklist(id)?
            .ok_or(ChecklistServiceError::ChecklistNotFound(id))
    }

    /// Replaces title, description and specialty tag of an owned checklist.
    pub fn update_details(
        &self,
        owner: OwnerId,
        id: ChecklistId,
        details: ChecklistDetails,
    ) -> Result<(), ChecklistServiceError> {
        let details = normalize_details(details)?;
        self.repo
            .update_details(owner, id, &details)
            .map_err(Into::into)
    }

    /// Publishes or unpublishes an owned checklist.
    pub fn set_published(
        &self,
        owner: OwnerId,
        id: ChecklistId,
        is_published: bool,
    ) -> Result<(), ChecklistServiceError> {
        self.repo
            .set_published(owner, id, is_published)
            .map_err(Into::into)
    }

    /// Lists owner checklists, most recently updated first.
    pub fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<Checklist>, ChecklistServiceError> {
        self.repo.list_for_owner(owner).map_err(Into::into)
    }

    /// Filters owner checklists by a case-insensitive title/description term.
    pub fn search(
        &self,
        owner: OwnerId,
        term: &str,
    ) -> Result<Vec<Checklist>, ChecklistServiceError> {
        let mut items = self.repo.list_for_owner(owner)?;
        items.retain(|checklist| checklist.matches(term));
        Ok(items)
    }

    /// Counts total, published and draft checklists of one owner.
    pub fn summary(&self, owner: OwnerId) -> Result<ChecklistSummary, ChecklistServiceError> {
        let items = self.repo.list_for_owner(owner)?;
        Ok(ChecklistSummary::from_checklists(&items))
    }

    /// Deletes an owned checklist and every item in it.
    pub fn delete_checklist(
        &self,
        owner: OwnerId,
        id: ChecklistId,
    ) -> Result<(), ChecklistServiceError> {
        self.repo.delete_checklist(owner, id)?;
        info!(
            "event=checklist_delete module=service status=ok checklist_id={}",
            id
        );
        Ok(())
    }

    /// Loads what a share link shows. Needs no owner session.
    pub fn shared_view(&self, id: ChecklistId) -> Result<SharedChecklist, ChecklistServiceError> {
        let view = self
            .repo
            .shared_view(id)?
            .ok_or(ChecklistServiceError::ChecklistNotFound(id))?;
        info!(
            "event=checklist_shared_view module=service status=ok checklist_id={} entries={}",
            id,
            view.entries.len()
        );
        Ok(view)
    }
}

/// Builds the public read-only link for a checklist.
pub fn share_link(base_url: &str, id: ChecklistId) -> String {
    format!("{}/view/{id}", base_url.trim_end_matches('/'))
}

fn normalize_details(details: ChecklistDetails) -> Result<ChecklistDetails, ChecklistServiceError> {
    let title = details.title.trim();
    if title.is_empty() {
        return Err(ChecklistServiceError::InvalidTitle);
    }
    Ok(ChecklistDetails {
        title: title.to_string(),
        description: normalize_optional(details.description),
        specialty_tag: normalize_optional(details.specialty_tag),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_details, normalize_optional, share_link, ChecklistServiceError};
    use crate::model::checklist::ChecklistDetails;
    use uuid::Uuid;

    #[test]
    fn share_link_trims_trailing_slash() {
        let id = Uuid::nil();
        assert_eq!(
            share_link("https://clinic.example/", id),
            format!("https://clinic.example/view/{id}")
        );
    }

    #[test]
    fn blank_optional_field_becomes_none() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" Before surgery ".to_string())),
            Some("Before surgery".to_string())
        );
    }

    #[test]
    fn details_are_trimmed_and_blank_title_rejected() {
        let details = normalize_details(
            ChecklistDetails::new(" Rehab ")
                .with_description("")
                .with_specialty_tag(" Orthopedics "),
        )
        .unwrap();
        assert_eq!(details.title, "Rehab");
        assert_eq!(details.description, None);
        assert_eq!(details.specialty_tag.as_deref(), Some("Orthopedics"));

        assert!(matches!(
            normalize_details(ChecklistDetails::new("   ")),
            Err(ChecklistServiceError::InvalidTitle)
        ));
    }
}
