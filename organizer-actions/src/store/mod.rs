pub mod memory_store;

pub use memory_store::{MemoryRecordStore, MemoryStoreState};

use anyhow::Result;
use async_trait::async_trait;
use shared_types::{NameComponents, Record, StoreOp};

/// The contact database the organizer reads from and writes to.
///
/// Every mutation is addressed by record id and either fully applies or
/// returns an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Record>>;
    async fn fetch_record(&self, contact_id: &str) -> Result<Option<Record>>;

    async fn add_phone(&self, contact_id: &str, phone: &str) -> Result<()>;
    async fn remove_phone(&self, contact_id: &str, phone: &str) -> Result<()>;

    async fn add_email(&self, contact_id: &str, email: &str) -> Result<()>;
    async fn remove_email(&self, contact_id: &str, email: &str) -> Result<()>;

    async fn add_to_group(&self, contact_id: &str, group: &str) -> Result<()>;
    async fn is_in_group(&self, contact_id: &str, group: &str) -> Result<bool>;
    async fn remove_from_group(&self, contact_id: &str, group: &str) -> Result<()>;

    async fn archive(&self, contact_id: &str) -> Result<()>;
    async fn unarchive(&self, contact_id: &str) -> Result<()>;

    /// Set the structured name. `display_name` is stored verbatim when
    /// given, otherwise it is derived from `name`.
    async fn update_name(
        &self,
        contact_id: &str,
        name: &NameComponents,
        display_name: Option<&str>,
    ) -> Result<()>;
    async fn fetch_name_components(&self, contact_id: &str) -> Result<NameComponents>;

    async fn upsert_record(&self, record: &Record) -> Result<()>;
    async fn delete_record(&self, contact_id: &str) -> Result<()>;
}

/// Dispatch one primitive operation to the store.
pub async fn apply_op(store: &dyn RecordStore, op: &StoreOp) -> Result<()> {
    match op {
        StoreOp::AddPhone { contact_id, phone } => store.add_phone(contact_id, phone).await,
        StoreOp::RemovePhone { contact_id, phone } => store.remove_phone(contact_id, phone).await,
        StoreOp::AddEmail { contact_id, email } => store.add_email(contact_id, email).await,
        StoreOp::RemoveEmail { contact_id, email } => store.remove_email(contact_id, email).await,
        StoreOp::AddToGroup { contact_id, group } => store.add_to_group(contact_id, group).await,
        StoreOp::RemoveFromGroup { contact_id, group } => {
            store.remove_from_group(contact_id, group).await
        }
        StoreOp::Archive { contact_id } => store.archive(contact_id).await,
        StoreOp::Unarchive { contact_id } => store.unarchive(contact_id).await,
        StoreOp::UpdateName {
            contact_id,
            name,
            display_name,
        } => {
            store
                .update_name(contact_id, name, display_name.as_deref())
                .await
        }
        StoreOp::UpsertRecord { record } => store.upsert_record(record).await,
        StoreOp::DeleteRecord { contact_id } => store.delete_record(contact_id).await,
    }
}

/// Apply operations in order, all or nothing.
///
/// If an operation fails, the ones already applied are reverted newest
/// first and the original error is returned.
pub async fn apply_ops(store: &dyn RecordStore, ops: &[StoreOp]) -> Result<()> {
    let mut applied: Vec<StoreOp> = Vec::new();

    for op in ops {
        let step = match revert_op(store, op).await {
            Ok(revert) => apply_op(store, op).await.map(|_| revert),
            Err(e) => Err(e),
        };
        match step {
            Ok(revert) => applied.extend(revert),
            Err(e) => {
                revert_applied(store, &applied).await;
                return Err(e);
            }
        }
    }
    Ok(())
}

/// The operation that puts the store back the way it is now, once `op` has
/// been applied. `None` when `op` will not change anything worth restoring.
async fn revert_op(store: &dyn RecordStore, op: &StoreOp) -> Result<Option<StoreOp>> {
    let revert = match op {
        StoreOp::AddPhone { contact_id, phone } => Some(StoreOp::RemovePhone {
            contact_id: contact_id.clone(),
            phone: phone.clone(),
        }),
        StoreOp::RemovePhone { contact_id, phone } => Some(StoreOp::AddPhone {
            contact_id: contact_id.clone(),
            phone: phone.clone(),
        }),
        StoreOp::AddEmail { contact_id, email } => Some(StoreOp::RemoveEmail {
            contact_id: contact_id.clone(),
            email: email.clone(),
        }),
        StoreOp::RemoveEmail { contact_id, email } => Some(StoreOp::AddEmail {
            contact_id: contact_id.clone(),
            email: email.clone(),
        }),
        StoreOp::AddToGroup { contact_id, group } => {
            if store.is_in_group(contact_id, group).await? {
                None
            } else {
                Some(StoreOp::RemoveFromGroup {
                    contact_id: contact_id.clone(),
                    group: group.clone(),
                })
            }
        }
        StoreOp::RemoveFromGroup { contact_id, group } => Some(StoreOp::AddToGroup {
            contact_id: contact_id.clone(),
            group: group.clone(),
        }),
        StoreOp::Archive { contact_id } => Some(StoreOp::Unarchive {
            contact_id: contact_id.clone(),
        }),
        StoreOp::Unarchive { contact_id } => Some(StoreOp::Archive {
            contact_id: contact_id.clone(),
        }),
        StoreOp::UpdateName { contact_id, .. } => {
            let name = store.fetch_name_components(contact_id).await?;
            let display_name = store
                .fetch_record(contact_id)
                .await?
                .map(|record| record.display_name);
            Some(StoreOp::UpdateName {
                contact_id: contact_id.clone(),
                name,
                display_name,
            })
        }
        StoreOp::UpsertRecord { record } => match store.fetch_record(&record.id).await? {
            Some(current) => Some(StoreOp::UpsertRecord { record: current }),
            None => Some(StoreOp::DeleteRecord {
                contact_id: record.id.clone(),
            }),
        },
        StoreOp::DeleteRecord { contact_id } => store
            .fetch_record(contact_id)
            .await?
            .map(|current| StoreOp::UpsertRecord { record: current }),
    };
    Ok(revert)
}

async fn revert_applied(store: &dyn RecordStore, applied: &[StoreOp]) {
    for op in applied.iter().rev() {
        if let Err(e) = apply_op(store, op).await {
            tracing::error!(
                contact_id = op.contact_id(),
                error = %e,
                "Failed to revert a partially applied change"
            );
        }
    }
}
