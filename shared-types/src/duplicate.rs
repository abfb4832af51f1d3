use crate::Record;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Which rule declared two records duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    ExactName,
    SimilarName,
    SamePhone,
    SameEmail,
    MultipleCriteria,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::ExactName => "Exact name",
            MatchType::SimilarName => "Similar name",
            MatchType::SamePhone => "Same phone",
            MatchType::SameEmail => "Same email",
            MatchType::MultipleCriteria => "Multiple criteria",
        }
    }
}

/// Records judged to be the same real-world contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DuplicateGroup {
    pub id: String,
    pub records: Vec<Record>,
    pub match_type: MatchType,
    pub confidence: f64,
}

impl DuplicateGroup {
    pub fn new(records: Vec<Record>, match_type: MatchType, confidence: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            records,
            match_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.records.iter().any(|r| r.id == record_id)
    }

    pub fn record_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct DuplicateGroupsResponse {
    pub groups: Vec<DuplicateGroup>,
}
