use super::RecordStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{NameComponents, Record};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// Everything the in-memory store holds. Plain data so a driver can load and
/// save it with serde.
///
/// Records are kept ordered by id, so a record deleted and re-inserted lands
/// where it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreState {
    pub records: Vec<Record>,
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub archived: BTreeSet<String>,
    /// Structured names set through `update_name` that differ from what
    /// parsing the display name gives.
    #[serde(default)]
    pub names: BTreeMap<String, NameComponents>,
}

#[derive(Debug, Default)]
struct Faults {
    read_only: bool,
    rejected: BTreeSet<String>,
}

/// Record store backed by process memory.
pub struct MemoryRecordStore {
    state: RwLock<MemoryStoreState>,
    faults: RwLock<Faults>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::from_state(MemoryStoreState::default())
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self::from_state(MemoryStoreState {
            records,
            ..MemoryStoreState::default()
        })
    }

    pub fn from_state(mut state: MemoryStoreState) -> Self {
        state.records.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            state: RwLock::new(state),
            faults: RwLock::new(Faults::default()),
        }
    }

    pub async fn snapshot(&self) -> MemoryStoreState {
        self.state.read().await.clone()
    }

    pub async fn group_members(&self, group: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn is_archived(&self, contact_id: &str) -> bool {
        self.state.read().await.archived.contains(contact_id)
    }

    /// Make every write fail, as a locked or permission-less store would.
    pub async fn set_read_only(&self, read_only: bool) {
        self.faults.write().await.read_only = read_only;
    }

    /// Make writes addressed to one record fail.
    pub async fn reject_writes_for(&self, contact_id: &str) {
        self.faults
            .write()
            .await
            .rejected
            .insert(contact_id.to_string());
    }

    async fn check_writable(&self, contact_id: &str) -> Result<()> {
        let faults = self.faults.read().await;
        if faults.read_only {
            return Err(anyhow!("Record store is read-only"));
        }
        if faults.rejected.contains(contact_id) {
            return Err(anyhow!("Write to contact {} was rejected", contact_id));
        }
        Ok(())
    }

    async fn modify<F>(&self, contact_id: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut Record) -> Result<()> + Send,
    {
        self.check_writable(contact_id).await?;
        let mut state = self.state.write().await;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == contact_id)
            .ok_or_else(|| anyhow!("Contact {} not found", contact_id))?;
        change(record)
    }

    async fn require_record(&self, contact_id: &str) -> Result<()> {
        let state = self.state.read().await;
        if state.records.iter().any(|r| r.id == contact_id) {
            Ok(())
        } else {
            Err(anyhow!("Contact {} not found", contact_id))
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_last(values: &mut Vec<String>, value: &str) -> bool {
    match values.iter().rposition(|v| v == value) {
        Some(pos) => {
            values.remove(pos);
            true
        }
        None => false,
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| !state.archived.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn fetch_record(&self, contact_id: &str) -> Result<Option<Record>> {
        let state = self.state.read().await;
        Ok(state.records.iter().find(|r| r.id == contact_id).cloned())
    }

    async fn add_phone(&self, contact_id: &str, phone: &str) -> Result<()> {
        self.modify(contact_id, |record| {
            record.phones.push(phone.to_string());
            Ok(())
        })
        .await
    }

    async fn remove_phone(&self, contact_id: &str, phone: &str) -> Result<()> {
        self.modify(contact_id, |record| {
            if remove_last(&mut record.phones, phone) {
                Ok(())
            } else {
                Err(anyhow!("Contact {} has no phone {}", record.id, phone))
            }
        })
        .await
    }

    async fn add_email(&self, contact_id: &str, email: &str) -> Result<()> {
        self.modify(contact_id, |record| {
            record.emails.push(email.to_string());
            Ok(())
        })
        .await
    }

    async fn remove_email(&self, contact_id: &str, email: &str) -> Result<()> {
        self.modify(contact_id, |record| {
            if remove_last(&mut record.emails, email) {
                Ok(())
            } else {
                Err(anyhow!("Contact {} has no email {}", record.id, email))
            }
        })
        .await
    }

    async fn add_to_group(&self, contact_id: &str, group: &str) -> Result<()> {
        self.check_writable(contact_id).await?;
        self.require_record(contact_id).await?;
        let mut state = self.state.write().await;
        state
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(contact_id.to_string());
        Ok(())
    }

    async fn is_in_group(&self, contact_id: &str, group: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .get(group)
            .is_some_and(|members| members.contains(contact_id)))
    }

    async fn remove_from_group(&self, contact_id: &str, group: &str) -> Result<()> {
        self.check_writable(contact_id).await?;
        let mut state = self.state.write().await;
        let removed = state
            .groups
            .get_mut(group)
            .map(|members| members.remove(contact_id))
            .unwrap_or(false);
        if !removed {
            return Err(anyhow!("Contact {} is not in group {}", contact_id, group));
        }
        if state.groups.get(group).is_some_and(|m| m.is_empty()) {
            state.groups.remove(group);
        }
        Ok(())
    }

    async fn archive(&self, contact_id: &str) -> Result<()> {
        self.check_writable(contact_id).await?;
        self.require_record(contact_id).await?;
        let mut state = self.state.write().await;
        if !state.archived.insert(contact_id.to_string()) {
            return Err(anyhow!("Contact {} is already archived", contact_id));
        }
        Ok(())
    }

    async fn unarchive(&self, contact_id: &str) -> Result<()> {
        self.check_writable(contact_id).await?;
        let mut state = self.state.write().await;
        if !state.archived.remove(contact_id) {
            return Err(anyhow!("Contact {} is not archived", contact_id));
        }
        Ok(())
    }

    async fn update_name(
        &self,
        contact_id: &str,
        name: &NameComponents,
        display_name: Option<&str>,
    ) -> Result<()> {
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| name.display_name());
        let parses_back = NameComponents::parse(&display_name) == *name;

        self.modify(contact_id, |record| {
            record.display_name = display_name;
            Ok(())
        })
        .await?;

        let mut state = self.state.write().await;
        if parses_back {
            state.names.remove(contact_id);
        } else {
            state.names.insert(contact_id.to_string(), name.clone());
        }
        Ok(())
    }

    async fn fetch_name_components(&self, contact_id: &str) -> Result<NameComponents> {
        let state = self.state.read().await;
        if let Some(name) = state.names.get(contact_id) {
            return Ok(name.clone());
        }
        state
            .records
            .iter()
            .find(|r| r.id == contact_id)
            .map(|r| NameComponents::parse(&r.display_name))
            .ok_or_else(|| anyhow!("Contact {} not found", contact_id))
    }

    async fn upsert_record(&self, record: &Record) -> Result<()> {
        self.check_writable(&record.id).await?;
        let mut state = self.state.write().await;
        match state
            .records
            .binary_search_by(|existing| existing.id.as_str().cmp(&record.id))
        {
            Ok(pos) => state.records[pos] = record.clone(),
            Err(pos) => state.records.insert(pos, record.clone()),
        }
        // The structured name no longer describes a replaced record.
        if state
            .names
            .get(&record.id)
            .is_some_and(|name| name.display_name() != record.display_name)
        {
            state.names.remove(&record.id);
        }
        Ok(())
    }

    async fn delete_record(&self, contact_id: &str) -> Result<()> {
        self.check_writable(contact_id).await?;
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|r| r.id != contact_id);
        if state.records.len() == before {
            return Err(anyhow!("Contact {} not found", contact_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryRecordStore {
        MemoryRecordStore::with_records(vec![
            Record::new("1", "Ada Lovelace").with_phone("111"),
            Record::new("2", "Alan Turing"),
        ])
    }

    #[tokio::test]
    async fn test_phone_add_and_remove() {
        let store = store();
        store.add_phone("1", "222").await.unwrap();
        store.remove_phone("1", "111").await.unwrap();

        let record = store.fetch_record("1").await.unwrap().unwrap();
        assert_eq!(record.phones, vec!["222"]);
        assert!(store.remove_phone("1", "999").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_contact_is_an_error() {
        let store = store();
        assert!(store.add_email("missing", "x@y.z").await.is_err());
        assert!(store.add_to_group("missing", "Reviewed").await.is_err());
        assert!(store.fetch_name_components("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_archive_hides_from_fetch_all() {
        let store = store();
        store.archive("2").await.unwrap();
        let ids: Vec<String> = store
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1"]);
        assert!(store.archive("2").await.is_err());

        store.unarchive("2").await.unwrap();
        assert_eq!(store.fetch_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_groups() {
        let store = store();
        assert!(!store.is_in_group("1", "Reviewed").await.unwrap());
        store.add_to_group("1", "Reviewed").await.unwrap();
        assert_eq!(store.group_members("Reviewed").await, vec!["1"]);
        assert!(store.is_in_group("1", "Reviewed").await.unwrap());

        store.remove_from_group("1", "Reviewed").await.unwrap();
        assert!(store.group_members("Reviewed").await.is_empty());
        assert!(store.remove_from_group("1", "Reviewed").await.is_err());
    }

    #[tokio::test]
    async fn test_name_components_round_trip() {
        let store = store();
        let before = store.fetch_name_components("1").await.unwrap();
        assert_eq!(before, NameComponents::new("Ada", "Lovelace"));

        let updated = NameComponents::new("Augusta Ada", "King");
        store.update_name("1", &updated, None).await.unwrap();
        assert_eq!(store.fetch_name_components("1").await.unwrap(), updated);

        let record = store.fetch_record("1").await.unwrap().unwrap();
        assert_eq!(record.display_name, "Augusta Ada King");
    }

    #[tokio::test]
    async fn test_verbatim_display_name_restores_state() {
        let store = MemoryRecordStore::with_records(vec![Record::new("1", "Grace  Hopper")]);
        let before = store.snapshot().await;
        let previous = store.fetch_name_components("1").await.unwrap();

        store
            .update_name("1", &NameComponents::new("Amazing", "Grace"), None)
            .await
            .unwrap();
        store
            .update_name("1", &previous, Some("Grace  Hopper"))
            .await
            .unwrap();

        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_components_kept_when_display_name_disagrees() {
        let store = store();
        let name = NameComponents::new("Ada", "Lovelace");
        store
            .update_name("1", &name, Some("Countess of Lovelace"))
            .await
            .unwrap();
        assert_eq!(store.fetch_name_components("1").await.unwrap(), name);
        assert_eq!(
            store.fetch_record("1").await.unwrap().unwrap().display_name,
            "Countess of Lovelace"
        );
    }

    #[tokio::test]
    async fn test_reinserted_record_keeps_its_position() {
        let store = MemoryRecordStore::with_records(vec![
            Record::new("3", "Carol"),
            Record::new("1", "Ada"),
            Record::new("2", "Bea"),
        ]);
        let before = store.snapshot().await;
        let bea = store.fetch_record("2").await.unwrap().unwrap();

        store.delete_record("2").await.unwrap();
        store.upsert_record(&bea).await.unwrap();

        assert_eq!(store.snapshot().await, before);
        let ids: Vec<String> = before.records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_faults() {
        let store = store();
        store.reject_writes_for("2").await;
        assert!(store.add_phone("2", "1").await.is_err());
        assert!(store.add_phone("1", "1").await.is_ok());

        store.set_read_only(true).await;
        assert!(store.add_phone("1", "1").await.is_err());
        assert!(store.fetch_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let store = store();
        store
            .upsert_record(&Record::new("3", "Grace Hopper"))
            .await
            .unwrap();
        store
            .upsert_record(&Record::new("1", "Ada King").with_phone("111"))
            .await
            .unwrap();
        store.delete_record("2").await.unwrap();

        let names: Vec<String> = store
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["Ada King", "Grace Hopper"]);
        assert!(store.delete_record("2").await.is_err());
    }
}
