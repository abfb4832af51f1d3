use crate::error::LedgerError;
use crate::store::{apply_ops, RecordStore};
use serde::{Deserialize, Serialize};
use shared_types::UndoEffect;

pub const DEFAULT_MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic per ledger; lets callers detect that the top entry changed.
    pub sequence: u64,
    pub effect: UndoEffect,
    pub description: String,
    pub registered_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    Undone(LedgerEntry),
    Redone(LedgerEntry),
    NothingToUndo,
    NothingToRedo,
}

impl LedgerOutcome {
    pub fn message(&self) -> String {
        match self {
            LedgerOutcome::Undone(entry) => format!("Undid: {}", entry.description),
            LedgerOutcome::Redone(entry) => format!("Redid: {}", entry.description),
            LedgerOutcome::NothingToUndo => "Nothing to undo".to_string(),
            LedgerOutcome::NothingToRedo => "Nothing to redo".to_string(),
        }
    }
}

/// Linear undo/redo history of applied effects.
///
/// Registering a new effect discards the redo history. Inverse and forward
/// operations are derived from the effect itself, so the ledger is plain
/// data and can be saved between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLedger {
    undo_stack: Vec<LedgerEntry>,
    redo_stack: Vec<LedgerEntry>,
    max_history: usize,
    next_sequence: u64,
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl UndoLedger {
    /// `max_history` of zero keeps everything.
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
            next_sequence: 1,
        }
    }

    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history;
        self.trim();
    }

    pub fn register(&mut self, effect: UndoEffect, description: impl Into<String>) -> &LedgerEntry {
        let entry = LedgerEntry {
            sequence: self.next_sequence,
            effect,
            description: description.into(),
            registered_at: chrono::Utc::now().timestamp(),
        };
        self.next_sequence += 1;

        self.redo_stack.clear();
        self.undo_stack.push(entry);
        self.trim();

        &self.undo_stack[self.undo_stack.len() - 1]
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&LedgerEntry> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&LedgerEntry> {
        self.redo_stack.last()
    }

    /// Undo history, oldest first.
    pub fn history(&self) -> &[LedgerEntry] {
        &self.undo_stack
    }

    pub fn redo_history(&self) -> &[LedgerEntry] {
        &self.redo_stack
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Roll back the most recent effect.
    ///
    /// A failed inverse drops the entry instead of putting it back; the redo
    /// stack is left untouched.
    pub async fn undo(&mut self, store: &dyn RecordStore) -> Result<LedgerOutcome, LedgerError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(LedgerOutcome::NothingToUndo);
        };

        if let Err(e) = apply_ops(store, &entry.effect.inverse_ops()).await {
            tracing::warn!(
                description = %entry.description,
                error = %e,
                "Undo failed"
            );
            return Err(LedgerError::UndoFailed {
                description: entry.description,
                source: e.into(),
            });
        }

        tracing::info!(description = %entry.description, "Undid action");
        self.redo_stack.push(entry.clone());
        Ok(LedgerOutcome::Undone(entry))
    }

    /// Re-apply the most recently undone effect.
    pub async fn redo(&mut self, store: &dyn RecordStore) -> Result<LedgerOutcome, LedgerError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(LedgerOutcome::NothingToRedo);
        };

        if let Err(e) = apply_ops(store, &entry.effect.forward_ops()).await {
            tracing::warn!(
                description = %entry.description,
                error = %e,
                "Redo failed"
            );
            return Err(LedgerError::RedoFailed {
                description: entry.description,
                source: e.into(),
            });
        }

        tracing::info!(description = %entry.description, "Redid action");
        self.undo_stack.push(entry.clone());
        self.trim();
        Ok(LedgerOutcome::Redone(entry))
    }

    fn trim(&mut self) {
        if self.max_history > 0 && self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(..excess);
        }
    }
}
