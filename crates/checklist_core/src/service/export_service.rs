//! Export document assembly.
//!
//! # Responsibility
//! - Turn a checklist, its entries and the author's profile into a
//!   layout-free `ChecklistDocument`.
//!
//! # Invariants
//! - Items are numbered in display order regardless of input order.
//! - Empty profile fields never produce a contact line.

use crate::model::checklist::Checklist;
use crate::model::document::{
    ChecklistDocument, ContactLine, DocumentInfo, DocumentItem, LineRole, DOCUMENT_BRAND,
};
use crate::model::entry::OrderedEntry;
use crate::model::profile::ClinicianProfile;
use crate::sequence::reorder::sort_for_display;
use log::debug;

const DOCUMENT_SUBJECT: &str = "Medical checklist";
const DOCUMENT_KEYWORDS: &str = "medicine, checklist, recommendations";

/// Builds export documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Assembles the export document.
    ///
    /// `issued_on` is a caller-formatted date label printed on the document.
    pub fn build_document(
        &self,
        checklist: &Checklist,
        entries: &[OrderedEntry],
        profile: Option<&ClinicianProfile>,
        issued_on: &str,
    ) -> ChecklistDocument {
        let mut ordered = entries.to_vec();
        sort_for_display(&mut ordered);

        let items: Vec<DocumentItem> = ordered
            .into_iter()
            .enumerate()
            .map(|(index, entry)| DocumentItem {
                number: index + 1,
                content: entry.payload.content,
                checked: entry.payload.is_checked,
            })
            .collect();

        let author = profile
            .map(|value| value.full_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DOCUMENT_BRAND)
            .to_string();

        let doctor_lines = profile.map_or_else(Vec::new, |value| {
            contact_lines([
                (value.full_name.as_str(), LineRole::Primary),
                (value.specialty.as_str(), LineRole::Secondary),
            ])
        });
        let clinic_lines = profile.map_or_else(Vec::new, |value| {
            contact_lines([
                (value.clinic_name.as_str(), LineRole::Primary),
                (value.clinic_address.as_str(), LineRole::Secondary),
                (value.clinic_phone.as_str(), LineRole::Secondary),
            ])
        });

        debug!(
            "event=export_build module=service checklist_id={} items={} has_profile={}",
            checklist.id,
            items.len(),
            profile.is_some()
        );

        ChecklistDocument {
            info: DocumentInfo {
                title: checklist.title.clone(),
                author,
                subject: DOCUMENT_SUBJECT.to_string(),
                keywords: DOCUMENT_KEYWORDS.to_string(),
            },
            title: checklist.title.clone(),
            description: checklist
                .description
                .as_ref()
                .filter(|text| !text.trim().is_empty())
                .cloned(),
            doctor_lines,
            clinic_lines,
            items,
            signature: profile.and_then(|value| value.signature.clone()),
            issued_on: issued_on.to_string(),
        }
    }
}

fn contact_lines<const N: usize>(fields: [(&str, LineRole); N]) -> Vec<ContactLine> {
    fields
        .into_iter()
        .filter_map(|(text, role)| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| ContactLine {
                text: trimmed.to_string(),
                role,
            })
        })
        .collect()
}
