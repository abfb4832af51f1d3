use anyhow::{Context, Result};
use organizer_actions::{MemoryStoreState, UndoLedger};
use serde::{Deserialize, Serialize};
use shared_types::Record;
use std::path::Path;

/// Contacts file contents: a full store dump or a bare list of records.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContactsFile {
    State(MemoryStoreState),
    Records(Vec<Record>),
}

pub fn load_contacts(path: &Path) -> Result<MemoryStoreState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contacts file at {:?}", path))?;
    let parsed: ContactsFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse contacts file at {:?}", path))?;

    Ok(match parsed {
        ContactsFile::State(state) => state,
        ContactsFile::Records(records) => MemoryStoreState {
            records,
            ..MemoryStoreState::default()
        },
    })
}

pub fn save_contacts(path: &Path, state: &MemoryStoreState) -> Result<()> {
    write_json(path, state).with_context(|| format!("Failed to save contacts to {:?}", path))
}

/// A missing history file means an empty history.
pub fn load_history(path: &Path) -> Result<UndoLedger> {
    if !path.exists() {
        return Ok(UndoLedger::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file at {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse history file at {:?}", path))
}

pub fn save_history(path: &Path, ledger: &UndoLedger) -> Result<()> {
    write_json(path, ledger).with_context(|| format!("Failed to save history to {:?}", path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
