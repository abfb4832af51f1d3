//! Organizer Actions Crate
//!
//! Everything that changes records: the record-store seam, the remediation
//! catalog, the executor, the undo/redo ledger and the `Organizer` service
//! that serializes mutations per record.

pub mod analysis;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod locks;
pub mod organizer;
pub mod store;

pub use analysis::{AnalysisRunner, AnalysisSnapshot};
pub use catalog::{actions_for, actions_for_type};
pub use error::{ActionError, LedgerError};
pub use executor::ActionExecutor;
pub use ledger::{LedgerEntry, LedgerOutcome, UndoLedger, DEFAULT_MAX_HISTORY};
pub use locks::{RecordGuard, RecordLocks};
pub use organizer::{Organizer, OrganizerConfig};
pub use store::{apply_op, apply_ops, MemoryRecordStore, MemoryStoreState, RecordStore};
