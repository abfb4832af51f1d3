use crate::{NameComponents, Record};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One completed mutation, recorded with enough detail to invert it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UndoEffect {
    AddedPhone {
        contact_id: String,
        phone: String,
    },
    AddedEmail {
        contact_id: String,
        email: String,
    },
    AddedToGroup {
        contact_id: String,
        group: String,
        /// The contact was already in the group; nothing to add or remove.
        #[serde(default)]
        already_member: bool,
    },
    Archived {
        contact_id: String,
    },
    UpdatedName {
        contact_id: String,
        previous: NameComponents,
        /// Display name exactly as stored before the rename.
        #[serde(default)]
        previous_display_name: String,
        updated: NameComponents,
    },
    Merged {
        primary_before: Record,
        primary_after: Record,
        absorbed: Vec<Record>,
    },
}

/// A single primitive call against the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum StoreOp {
    AddPhone { contact_id: String, phone: String },
    RemovePhone { contact_id: String, phone: String },
    AddEmail { contact_id: String, email: String },
    RemoveEmail { contact_id: String, email: String },
    AddToGroup { contact_id: String, group: String },
    RemoveFromGroup { contact_id: String, group: String },
    Archive { contact_id: String },
    Unarchive { contact_id: String },
    UpdateName {
        contact_id: String,
        name: NameComponents,
        /// Stored verbatim when set; otherwise derived from `name`.
        #[serde(default)]
        display_name: Option<String>,
    },
    UpsertRecord { record: Record },
    DeleteRecord { contact_id: String },
}

impl UndoEffect {
    /// Operations that re-apply the mutation.
    pub fn forward_ops(&self) -> Vec<StoreOp> {
        match self {
            UndoEffect::AddedPhone { contact_id, phone } => vec![StoreOp::AddPhone {
                contact_id: contact_id.clone(),
                phone: phone.clone(),
            }],
            UndoEffect::AddedEmail { contact_id, email } => vec![StoreOp::AddEmail {
                contact_id: contact_id.clone(),
                email: email.clone(),
            }],
            UndoEffect::AddedToGroup {
                already_member: true,
                ..
            } => Vec::new(),
            UndoEffect::AddedToGroup {
                contact_id, group, ..
            } => vec![StoreOp::AddToGroup {
                contact_id: contact_id.clone(),
                group: group.clone(),
            }],
            UndoEffect::Archived { contact_id } => vec![StoreOp::Archive {
                contact_id: contact_id.clone(),
            }],
            UndoEffect::UpdatedName {
                contact_id,
                updated,
                ..
            } => vec![StoreOp::UpdateName {
                contact_id: contact_id.clone(),
                name: updated.clone(),
                display_name: None,
            }],
            UndoEffect::Merged {
                primary_after,
                absorbed,
                ..
            } => {
                let mut ops = vec![StoreOp::UpsertRecord {
                    record: primary_after.clone(),
                }];
                ops.extend(absorbed.iter().map(|r| StoreOp::DeleteRecord {
                    contact_id: r.id.clone(),
                }));
                ops
            }
        }
    }

    /// Operations that roll the mutation back.
    pub fn inverse_ops(&self) -> Vec<StoreOp> {
        match self {
            UndoEffect::AddedPhone { contact_id, phone } => vec![StoreOp::RemovePhone {
                contact_id: contact_id.clone(),
                phone: phone.clone(),
            }],
            UndoEffect::AddedEmail { contact_id, email } => vec![StoreOp::RemoveEmail {
                contact_id: contact_id.clone(),
                email: email.clone(),
            }],
            UndoEffect::AddedToGroup {
                already_member: true,
                ..
            } => Vec::new(),
            UndoEffect::AddedToGroup {
                contact_id, group, ..
            } => vec![StoreOp::RemoveFromGroup {
                contact_id: contact_id.clone(),
                group: group.clone(),
            }],
            UndoEffect::Archived { contact_id } => vec![StoreOp::Unarchive {
                contact_id: contact_id.clone(),
            }],
            UndoEffect::UpdatedName {
                contact_id,
                previous,
                previous_display_name,
                ..
            } => vec![StoreOp::UpdateName {
                contact_id: contact_id.clone(),
                name: previous.clone(),
                display_name: (!previous_display_name.is_empty())
                    .then(|| previous_display_name.clone()),
            }],
            UndoEffect::Merged {
                primary_before,
                absorbed,
                ..
            } => {
                let mut ops: Vec<StoreOp> = absorbed
                    .iter()
                    .map(|r| StoreOp::UpsertRecord { record: r.clone() })
                    .collect();
                ops.push(StoreOp::UpsertRecord {
                    record: primary_before.clone(),
                });
                ops
            }
        }
    }

    /// Every record id the effect touches, sorted and de-duplicated.
    pub fn contact_ids(&self) -> Vec<String> {
        let mut ids = match self {
            UndoEffect::AddedPhone { contact_id, .. }
            | UndoEffect::AddedEmail { contact_id, .. }
            | UndoEffect::AddedToGroup { contact_id, .. }
            | UndoEffect::Archived { contact_id }
            | UndoEffect::UpdatedName { contact_id, .. } => vec![contact_id.clone()],
            UndoEffect::Merged {
                primary_after,
                absorbed,
                ..
            } => std::iter::once(primary_after.id.clone())
                .chain(absorbed.iter().map(|r| r.id.clone()))
                .collect(),
        };
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn describe(&self, contact_name: &str) -> String {
        match self {
            UndoEffect::AddedPhone { phone, .. } => {
                format!("Add phone {} to {}", phone, contact_name)
            }
            UndoEffect::AddedEmail { email, .. } => {
                format!("Add email {} to {}", email, contact_name)
            }
            UndoEffect::AddedToGroup { group, .. } => {
                format!("Add {} to group \"{}\"", contact_name, group)
            }
            UndoEffect::Archived { .. } => format!("Archive {}", contact_name),
            UndoEffect::UpdatedName {
                previous,
                previous_display_name,
                updated,
                ..
            } => {
                let before = if previous_display_name.is_empty() {
                    previous.display_name()
                } else {
                    previous_display_name.clone()
                };
                format!("Rename \"{}\" to \"{}\"", before, updated.display_name())
            }
            UndoEffect::Merged {
                primary_after,
                absorbed,
                ..
            } => format!(
                "Merge {} contacts into {}",
                absorbed.len() + 1,
                primary_after.display_name
            ),
        }
    }
}

impl StoreOp {
    pub fn contact_id(&self) -> &str {
        match self {
            StoreOp::AddPhone { contact_id, .. }
            | StoreOp::RemovePhone { contact_id, .. }
            | StoreOp::AddEmail { contact_id, .. }
            | StoreOp::RemoveEmail { contact_id, .. }
            | StoreOp::AddToGroup { contact_id, .. }
            | StoreOp::RemoveFromGroup { contact_id, .. }
            | StoreOp::Archive { contact_id }
            | StoreOp::Unarchive { contact_id }
            | StoreOp::UpdateName { contact_id, .. }
            | StoreOp::DeleteRecord { contact_id } => contact_id,
            StoreOp::UpsertRecord { record } => &record.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_phone_inverts_to_remove() {
        let effect = UndoEffect::AddedPhone {
            contact_id: "c1".to_string(),
            phone: "555-0100".to_string(),
        };
        assert_eq!(
            effect.inverse_ops(),
            vec![StoreOp::RemovePhone {
                contact_id: "c1".to_string(),
                phone: "555-0100".to_string(),
            }]
        );
        assert_eq!(effect.describe("Jane"), "Add phone 555-0100 to Jane");
    }

    #[test]
    fn test_updated_name_restores_previous() {
        let effect = UndoEffect::UpdatedName {
            contact_id: "c1".to_string(),
            previous: NameComponents::new("Jon", "Doe"),
            previous_display_name: "Jon  Doe".to_string(),
            updated: NameComponents::new("John", "Doe"),
        };
        match &effect.inverse_ops()[0] {
            StoreOp::UpdateName {
                name, display_name, ..
            } => {
                assert_eq!(name.given_name, "Jon");
                assert_eq!(display_name.as_deref(), Some("Jon  Doe"));
            }
            other => panic!("unexpected op {:?}", other),
        }
        match &effect.forward_ops()[0] {
            StoreOp::UpdateName {
                name, display_name, ..
            } => {
                assert_eq!(name.given_name, "John");
                assert!(display_name.is_none());
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_existing_membership_is_left_alone() {
        let effect = UndoEffect::AddedToGroup {
            contact_id: "c1".to_string(),
            group: "Reviewed".to_string(),
            already_member: true,
        };
        assert!(effect.forward_ops().is_empty());
        assert!(effect.inverse_ops().is_empty());
        assert_eq!(effect.contact_ids(), vec!["c1".to_string()]);
    }

    #[test]
    fn test_merge_touches_every_member() {
        let before = Record::new("b", "Alice").with_phone("1");
        let after = Record::new("b", "Alice").with_phone("1").with_phone("2");
        let absorbed = Record::new("a", "alice").with_phone("2");
        let effect = UndoEffect::Merged {
            primary_before: before,
            primary_after: after,
            absorbed: vec![absorbed],
        };

        assert_eq!(effect.contact_ids(), vec!["a".to_string(), "b".to_string()]);

        let forward = effect.forward_ops();
        assert_eq!(forward.len(), 2);
        assert!(matches!(forward[1], StoreOp::DeleteRecord { ref contact_id } if contact_id == "a"));

        let inverse = effect.inverse_ops();
        assert_eq!(inverse.len(), 2);
        assert!(inverse
            .iter()
            .all(|op| matches!(op, StoreOp::UpsertRecord { .. })));
        assert_eq!(effect.describe("ignored"), "Merge 2 contacts into Alice");
    }

    #[test]
    fn test_effect_wire_tag() {
        let effect = UndoEffect::Archived {
            contact_id: "c9".to_string(),
        };
        let json = serde_json::to_string(&effect).unwrap();
        assert_eq!(json, r#"{"type":"archived","contact_id":"c9"}"#);
    }
}
