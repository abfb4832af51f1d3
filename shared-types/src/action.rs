use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Group every "mark reviewed" action files the contact under.
pub const REVIEWED_GROUP: &str = "Reviewed";

/// What a remediation does to the contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActionKind {
    AddPhone,
    AddEmail,
    AddToGroup { group: String },
    Archive,
    UpdateName,
    MarkReviewed,
}

/// Catalog entry offered for a data quality issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthIssueAction {
    pub title: String,
    pub kind: ActionKind,
    pub requires_input: bool,
    pub input_prompt: Option<String>,
    pub input_placeholder: Option<String>,
}

impl HealthIssueAction {
    pub fn with_input(
        title: impl Into<String>,
        kind: ActionKind,
        prompt: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            kind,
            requires_input: true,
            input_prompt: Some(prompt.into()),
            input_placeholder: Some(placeholder.into()),
        }
    }

    pub fn without_input(title: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            title: title.into(),
            kind,
            requires_input: false,
            input_prompt: None,
            input_placeholder: None,
        }
    }
}

/// Aggregated result of applying one action to many contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkFailure {
    pub contact_id: String,
    pub error: String,
}

impl BulkOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}
