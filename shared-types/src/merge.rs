use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A phone number or email kept by a merge, with the records that had it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MergedValue {
    pub value: String,
    pub owners: Vec<String>,
}

/// Conflict-resolved proposal for collapsing a duplicate group into one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MergePlan {
    pub group_id: String,
    /// Record whose name survives. The merged record keeps this id.
    pub preferred_name_id: String,
    pub preferred_organization_id: Option<String>,
    pub preferred_photo_id: Option<String>,
    pub phones: Vec<MergedValue>,
    pub emails: Vec<MergedValue>,
}

impl MergePlan {
    pub fn primary_id(&self) -> &str {
        &self.preferred_name_id
    }

    pub fn phone_values(&self) -> Vec<&str> {
        self.phones.iter().map(|p| p.value.as_str()).collect()
    }

    pub fn email_values(&self) -> Vec<&str> {
        self.emails.iter().map(|e| e.value.as_str()).collect()
    }
}
