//! Domain model for clinician checklists.
//!
//! # Responsibility
//! - Define canonical data structures used by sequence and service logic.
//! - Keep storage and transport details out of domain types.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Display order of entries is ascending `position`, nothing else.

pub mod checklist;
pub mod document;
pub mod entry;
pub mod profile;
