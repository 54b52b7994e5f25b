//! Vernacular (common) names attached to instances.

use serde::Serialize;
use taxonmerge_model::VernacularStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VernacularName {
    #[serde(rename = "nameID")]
    pub name_id: String,
    pub vernacular_name: String,
    pub language: Option<String>,
    pub status: VernacularStatus,
    pub forbidden: bool,
}

impl VernacularName {
    pub fn new(name_id: impl Into<String>, vernacular_name: impl Into<String>, status: VernacularStatus) -> Self {
        Self {
            name_id: name_id.into(),
            vernacular_name: vernacular_name.into(),
            language: None,
            status,
            forbidden: false,
        }
    }

    /// Ranking key; status weight first, then the provider's default score.
    pub fn score(&self, provider_score: i32) -> (i32, i32) {
        (self.status.weight(), provider_score)
    }
}

/// Map a verbatim status onto the vocabulary. Unknown or blank terms are
/// treated as common names.
pub fn parse_status(status: Option<&str>) -> VernacularStatus {
    match status.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("preferred") => VernacularStatus::Preferred,
        Some("local") => VernacularStatus::Local,
        Some("misapplied") => VernacularStatus::Misapplied,
        _ => VernacularStatus::Common,
    }
}
