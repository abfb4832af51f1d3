type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why an action, bulk item or merge did not apply.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("\"{action}\" needs a value")]
    MissingInput { action: String },

    #[error("\"{action}\" is not offered for {issue_type} issues")]
    UnsupportedAction { action: String, issue_type: String },

    #[error("Group {group_id} has {size} record(s); a merge needs at least 2")]
    MalformedGroup { group_id: String, size: usize },

    #[error("Merge plan for group {plan_group_id} does not match group {group_id}")]
    PlanMismatch {
        plan_group_id: String,
        group_id: String,
    },

    #[error("Contact {contact_id} changed or was removed since it was analyzed")]
    StaleRecord { contact_id: String },

    #[error("Record store rejected change to contact {contact_id}: {source}")]
    Store {
        contact_id: String,
        #[source]
        source: BoxError,
    },
}

impl ActionError {
    pub(crate) fn store(contact_id: &str, source: anyhow::Error) -> Self {
        ActionError::Store {
            contact_id: contact_id.to_string(),
            source: source.into(),
        }
    }

    /// Validation failures are rejected before the store is touched.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ActionError::Store { .. })
    }
}

/// Undo or redo reached the store and the store refused.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Undo of \"{description}\" failed: {source}")]
    UndoFailed {
        description: String,
        #[source]
        source: BoxError,
    },

    #[error("Redo of \"{description}\" failed: {source}")]
    RedoFailed {
        description: String,
        #[source]
        source: BoxError,
    },
}
