//! Issue reporting and counters.
//!
//! Every issue goes to two places: the `tracing` stream, at a level chosen
//! by severity, and the injected [`DocumentIndex`] as a `TaxonomicIssue`
//! document. Writes to the index only become visible after a barrier.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use taxonmerge_storage::{Document, DocumentIndex};
use uuid::Uuid;

pub const ISSUE_DOCUMENT: &str = "TaxonomicIssue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Processing failed.
    Error,
    /// The taxonomy is structurally invalid.
    Validation,
    /// Recoverable anomaly that has been patched.
    Problem,
    /// Two things compete for the same name.
    Collision,
    Note,
    Count,
}

impl IssueType {
    pub fn label(self) -> &'static str {
        match self {
            IssueType::Error => "ERROR",
            IssueType::Validation => "VALIDATION",
            IssueType::Problem => "PROBLEM",
            IssueType::Collision => "COLLISION",
            IssueType::Note => "NOTE",
            IssueType::Count => "COUNT",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueType,
    pub code: String,
    pub message: String,
    #[serde(rename = "taxonID")]
    pub taxon_id: Option<String>,
    pub name_complete: Option<String>,
    pub scientific_name: Option<String>,
    pub author: Option<String>,
    pub rank: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "datasetID")]
    pub dataset_id: Option<String>,
    pub associated: Vec<String>,
}

impl Issue {
    pub fn new(kind: IssueType, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            taxon_id: None,
            name_complete: None,
            scientific_name: None,
            author: None,
            rank: None,
            status: None,
            dataset_id: None,
            associated: Vec::new(),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new(ISSUE_DOCUMENT)
            .with("id", Uuid::new_v4().to_string())
            .with("type", self.kind.label())
            .with("code", self.code.as_str())
            .with("description", self.message.as_str())
            .with("date", chrono::Utc::now().to_rfc3339())
            .with_opt("taxonID", self.taxon_id.clone())
            .with_opt("nameComplete", self.name_complete.clone())
            .with_opt("scientificName", self.scientific_name.clone())
            .with_opt("scientificNameAuthorship", self.author.clone())
            .with_opt("taxonRank", self.rank.clone())
            .with_opt("taxonomicStatus", self.status.clone())
            .with_opt("datasetID", self.dataset_id.clone());
        for a in &self.associated {
            doc.add("associatedTaxa", a.as_str());
        }
        doc
    }
}

/// Thread-safe sink for issues and counts.
pub struct Reporter {
    index: Arc<dyn DocumentIndex>,
    issues: Mutex<Vec<Issue>>,
    tallies: DashMap<IssueType, u64>,
    counts: DashMap<String, u64>,
}

impl Reporter {
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            index,
            issues: Mutex::new(Vec::new()),
            tallies: DashMap::new(),
            counts: DashMap::new(),
        }
    }

    pub fn index(&self) -> &Arc<dyn DocumentIndex> {
        &self.index
    }

    pub fn record(&self, issue: Issue) {
        match issue.kind {
            IssueType::Error | IssueType::Validation => {
                tracing::error!(code = %issue.code, taxon_id = ?issue.taxon_id, "{}", issue.message)
            }
            IssueType::Problem => {
                tracing::warn!(code = %issue.code, taxon_id = ?issue.taxon_id, "{}", issue.message)
            }
            IssueType::Collision => {
                tracing::info!(code = %issue.code, taxon_id = ?issue.taxon_id, "{}", issue.message)
            }
            IssueType::Note | IssueType::Count => {
                tracing::debug!(code = %issue.code, taxon_id = ?issue.taxon_id, "{}", issue.message)
            }
        }
        if let Err(e) = self.index.add(issue.to_document()) {
            tracing::error!(code = %issue.code, error = %e, "unable to store issue");
        }
        *self.tallies.entry(issue.kind).or_insert(0) += 1;
        self.issues.lock().push(issue);
    }

    pub fn count(&self, key: &str) {
        self.count_by(key, 1);
    }

    pub fn count_by(&self, key: &str, n: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += n;
    }

    pub fn counts(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    pub fn get_count(&self, key: &str) -> u64 {
        self.counts.get(key).map(|v| *v).unwrap_or(0)
    }

    pub fn tally(&self, kind: IssueType) -> u64 {
        self.tallies.get(&kind).map(|v| *v).unwrap_or(0)
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.issues.lock().clone()
    }

    pub fn issues_with_code(&self, code: &str) -> Vec<Issue> {
        self.issues
            .lock()
            .iter()
            .filter(|i| i.code == code)
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("issues", &self.issues.lock().len())
            .field("counts", &self.counts.len())
            .finish()
    }
}
