//! Clinician profile model.

use crate::model::checklist::OwnerId;
use serde::{Deserialize, Serialize};

/// Author details printed on exported checklists.
///
/// Every text field may be empty; exporters skip empty lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicianProfile {
    pub owner: OwnerId,
    pub full_name: String,
    pub specialty: String,
    pub clinic_name: String,
    pub clinic_address: String,
    pub clinic_phone: String,
    /// Opaque signature image reference (for example a data URL).
    pub signature: Option<String>,
}

impl ClinicianProfile {
    /// Creates an empty profile for `owner`.
    pub fn empty(owner: OwnerId) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }
}
