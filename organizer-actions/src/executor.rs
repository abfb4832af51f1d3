use crate::catalog::actions_for_type;
use crate::error::ActionError;
use crate::store::{apply_ops, RecordStore};
use shared_types::{
    ActionKind, DataQualityIssue, DuplicateGroup, HealthIssueAction, MergePlan, NameComponents,
    Record, UndoEffect, REVIEWED_GROUP,
};
use std::sync::Arc;

/// Applies catalog actions and merges against the record store.
///
/// The executor does not lock or record history; `Organizer` wraps it with
/// both.
#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn RecordStore>,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub async fn execute(
        &self,
        action: &HealthIssueAction,
        issue: &DataQualityIssue,
        input: Option<&str>,
    ) -> Result<UndoEffect, ActionError> {
        if !actions_for_type(issue.issue_type)
            .iter()
            .any(|offered| offered.kind == action.kind)
        {
            return Err(ActionError::UnsupportedAction {
                action: action.title.clone(),
                issue_type: issue.issue_type.label().to_string(),
            });
        }
        if action.requires_input {
            required_input(action, input)?;
        }
        let contact_id = issue.contact_id.as_str();

        let result = match &action.kind {
            ActionKind::AddPhone => {
                let phone = required_input(action, input)?;
                self.store
                    .add_phone(contact_id, &phone)
                    .await
                    .map(|_| UndoEffect::AddedPhone {
                        contact_id: contact_id.to_string(),
                        phone,
                    })
            }
            ActionKind::AddEmail => {
                let email = required_input(action, input)?;
                self.store
                    .add_email(contact_id, &email)
                    .await
                    .map(|_| UndoEffect::AddedEmail {
                        contact_id: contact_id.to_string(),
                        email,
                    })
            }
            ActionKind::AddToGroup { group } => self.add_to_group(contact_id, group).await,
            ActionKind::MarkReviewed => self.add_to_group(contact_id, REVIEWED_GROUP).await,
            ActionKind::Archive => {
                self.store
                    .archive(contact_id)
                    .await
                    .map(|_| UndoEffect::Archived {
                        contact_id: contact_id.to_string(),
                    })
            }
            ActionKind::UpdateName => {
                let full_name = required_input(action, input)?;
                self.update_name(contact_id, &full_name).await
            }
        };

        match result {
            Ok(effect) => {
                tracing::info!(
                    contact_id,
                    action = %action.title,
                    "Applied health issue action"
                );
                Ok(effect)
            }
            Err(e) => {
                tracing::warn!(
                    contact_id,
                    action = %action.title,
                    error = %e,
                    "Health issue action failed"
                );
                Err(ActionError::store(contact_id, e))
            }
        }
    }

    /// Collapse a duplicate group into its primary record.
    ///
    /// Every member must still match the analysis that produced the group;
    /// a member changed since then is reported as stale instead of merged
    /// from outdated values. If any step fails the steps already applied are
    /// rolled back.
    pub async fn execute_merge(
        &self,
        plan: &MergePlan,
        group: &DuplicateGroup,
    ) -> Result<UndoEffect, ActionError> {
        if group.len() < 2 {
            return Err(ActionError::MalformedGroup {
                group_id: group.id.clone(),
                size: group.len(),
            });
        }
        if plan.group_id != group.id {
            return Err(ActionError::PlanMismatch {
                plan_group_id: plan.group_id.clone(),
                group_id: group.id.clone(),
            });
        }

        let primary_after =
            analyzers::merged_record(plan, group).ok_or_else(|| ActionError::PlanMismatch {
                plan_group_id: plan.group_id.clone(),
                group_id: group.id.clone(),
            })?;

        let mut primary_before = None;
        let mut absorbed = Vec::new();
        for record in &group.records {
            let current = self.unchanged(record).await?;
            if current.id == plan.primary_id() {
                primary_before = Some(current);
            } else {
                absorbed.push(current);
            }
        }
        let primary_before = primary_before.ok_or_else(|| ActionError::PlanMismatch {
            plan_group_id: plan.group_id.clone(),
            group_id: group.id.clone(),
        })?;

        let effect = UndoEffect::Merged {
            primary_before,
            primary_after,
            absorbed,
        };

        if let Err(e) = apply_ops(self.store.as_ref(), &effect.forward_ops()).await {
            tracing::warn!(
                group_id = %group.id,
                error = %e,
                "Merge failed, rolled back"
            );
            return Err(ActionError::store(plan.primary_id(), e));
        }

        tracing::info!(
            group_id = %group.id,
            primary = plan.primary_id(),
            merged = group.len(),
            "Merged duplicate group"
        );
        Ok(effect)
    }

    /// The store's copy of a group member, provided it has not changed.
    async fn unchanged(&self, expected: &Record) -> Result<Record, ActionError> {
        let current = self
            .store
            .fetch_record(&expected.id)
            .await
            .map_err(|e| ActionError::store(&expected.id, e))?;
        match current {
            Some(current) if current == *expected => Ok(current),
            _ => Err(ActionError::StaleRecord {
                contact_id: expected.id.clone(),
            }),
        }
    }

    async fn add_to_group(&self, contact_id: &str, group: &str) -> anyhow::Result<UndoEffect> {
        let already_member = self.store.is_in_group(contact_id, group).await?;
        if !already_member {
            self.store.add_to_group(contact_id, group).await?;
        }
        Ok(UndoEffect::AddedToGroup {
            contact_id: contact_id.to_string(),
            group: group.to_string(),
            already_member,
        })
    }

    async fn update_name(&self, contact_id: &str, full_name: &str) -> anyhow::Result<UndoEffect> {
        let previous = self.store.fetch_name_components(contact_id).await?;
        let previous_display_name = self
            .store
            .fetch_record(contact_id)
            .await?
            .map(|record| record.display_name)
            .unwrap_or_else(|| previous.display_name());
        let updated = NameComponents::parse(full_name);
        self.store.update_name(contact_id, &updated, None).await?;
        Ok(UndoEffect::UpdatedName {
            contact_id: contact_id.to_string(),
            previous,
            previous_display_name,
            updated,
        })
    }
}

fn required_input(action: &HealthIssueAction, input: Option<&str>) -> Result<String, ActionError> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ActionError::MissingInput {
            action: action.title.clone(),
        })
}
