//! Export document model.
//!
//! # Responsibility
//! - Describe a checklist export as structured, layout-free sections.
//! - Serialize to JSON for the external page layout renderer.
//!
//! # Invariants
//! - `items` are numbered from 1 in display order.
//! - Empty author/clinic fields never produce a line.

use serde::{Deserialize, Serialize};

/// Product name used in running headers and as fallback author.
pub const DOCUMENT_BRAND: &str = "Doctor Checklist";

/// Document metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
}

/// Role of one contact line, used by the renderer to pick emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    Primary,
    Secondary,
}

/// One line of the doctor or clinic block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLine {
    pub text: String,
    pub role: LineRole,
}

/// One numbered checklist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// 1-based row number.
    pub number: usize,
    pub content: String,
    pub checked: bool,
}

/// Structured export document handed to the layout renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistDocument {
    pub info: DocumentInfo,
    pub title: String,
    pub description: Option<String>,
    pub doctor_lines: Vec<ContactLine>,
    pub clinic_lines: Vec<ContactLine>,
    pub items: Vec<DocumentItem>,
    pub signature: Option<String>,
    pub issued_on: String,
}

impl ChecklistDocument {
    /// Running header text for one page.
    pub fn page_header(page: usize, page_count: usize) -> String {
        format!("{DOCUMENT_BRAND} • Page {page} of {page_count}")
    }

    /// Serializes the document for the renderer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
