use crate::analysis::{AnalysisRunner, AnalysisSnapshot};
use crate::error::{ActionError, LedgerError};
use crate::executor::ActionExecutor;
use crate::ledger::{LedgerEntry, LedgerOutcome, UndoLedger, DEFAULT_MAX_HISTORY};
use crate::locks::RecordLocks;
use crate::store::RecordStore;
use analyzers::{Matcher, MatcherConfig, PlanError, QualityScorer, ScorerConfig};
use shared_types::{
    BulkFailure, BulkOutcome, DataQualityIssue, DuplicateGroup, HealthIssueAction, MergePlan,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct OrganizerConfig {
    pub matcher: MatcherConfig,
    pub scorer: ScorerConfig,
    /// Zero keeps every entry.
    pub max_history: usize,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            scorer: ScorerConfig::default(),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Entry point for everything that mutates records.
///
/// Each mutation holds the locks of the records it touches, is registered
/// on the ledger and bumps the mutation epoch. Cloning shares the same
/// store, ledger and locks.
#[derive(Clone)]
pub struct Organizer {
    store: Arc<dyn RecordStore>,
    executor: ActionExecutor,
    ledger: Arc<Mutex<UndoLedger>>,
    locks: RecordLocks,
    epoch: Arc<AtomicU64>,
    analysis: AnalysisRunner,
}

impl Organizer {
    pub fn new(store: Arc<dyn RecordStore>, config: OrganizerConfig) -> Self {
        let ledger = UndoLedger::new(config.max_history);
        Self::with_ledger(store, config, ledger)
    }

    /// Resume with a previously saved ledger.
    pub fn with_ledger(
        store: Arc<dyn RecordStore>,
        config: OrganizerConfig,
        mut ledger: UndoLedger,
    ) -> Self {
        ledger.set_max_history(config.max_history);
        Self {
            executor: ActionExecutor::new(store.clone()),
            store,
            ledger: Arc::new(Mutex::new(ledger)),
            locks: RecordLocks::new(),
            epoch: Arc::new(AtomicU64::new(0)),
            analysis: AnalysisRunner::new(
                Matcher::new(config.matcher),
                QualityScorer::new(config.scorer),
            ),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn matcher(&self) -> &Matcher {
        self.analysis.matcher()
    }

    pub fn scorer(&self) -> &QualityScorer {
        self.analysis.scorer()
    }

    /// Number of successful mutations so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn apply_action(
        &self,
        action: &HealthIssueAction,
        issue: &DataQualityIssue,
        input: Option<&str>,
    ) -> Result<LedgerEntry, ActionError> {
        let _guard = self.locks.acquire([issue.contact_id.as_str()]).await;

        let effect = self.executor.execute(action, issue, input).await?;
        let description = effect.describe(&issue.contact_name);
        Ok(self.record(effect, description).await)
    }

    /// Apply one action to many issues, one after another.
    ///
    /// Every success is its own ledger entry; a failure does not stop the
    /// remaining items.
    pub async fn apply_bulk(
        &self,
        action: &HealthIssueAction,
        issues: &[DataQualityIssue],
        input: Option<&str>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            attempted: issues.len(),
            ..BulkOutcome::default()
        };

        for issue in issues {
            match self.apply_action(action, issue, input).await {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => outcome.failures.push(BulkFailure {
                    contact_id: issue.contact_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        tracing::info!(
            action = %action.title,
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            "Bulk action finished"
        );
        outcome
    }

    pub async fn merge(
        &self,
        plan: &MergePlan,
        group: &DuplicateGroup,
    ) -> Result<LedgerEntry, ActionError> {
        let _guard = self.locks.acquire(group.record_ids()).await;

        let effect = self.executor.execute_merge(plan, group).await?;
        let primary_name = group
            .records
            .iter()
            .find(|r| r.id == plan.primary_id())
            .map(|r| r.display_name.as_str())
            .unwrap_or_default();
        let description = effect.describe(primary_name);
        Ok(self.record(effect, description).await)
    }

    /// Build the default plan for `group` and merge it.
    pub async fn merge_group(&self, group: &DuplicateGroup) -> Result<LedgerEntry, ActionError> {
        let plan = analyzers::build_plan(group).map_err(|e| match e {
            PlanError::MalformedGroup { group_id, size } => {
                ActionError::MalformedGroup { group_id, size }
            }
        })?;
        self.merge(&plan, group).await
    }

    pub async fn undo(&self) -> Result<LedgerOutcome, LedgerError> {
        loop {
            let (sequence, ids) = {
                let ledger = self.ledger.lock().await;
                match ledger.peek_undo() {
                    Some(entry) => (entry.sequence, entry.effect.contact_ids()),
                    None => return Ok(LedgerOutcome::NothingToUndo),
                }
            };

            // Record locks first, ledger second, same as a forward mutation.
            let _guard = self.locks.acquire(ids).await;
            let mut ledger = self.ledger.lock().await;
            if ledger.peek_undo().map(|entry| entry.sequence) != Some(sequence) {
                continue;
            }

            let outcome = ledger.undo(self.store.as_ref()).await?;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            return Ok(outcome);
        }
    }

    pub async fn redo(&self) -> Result<LedgerOutcome, LedgerError> {
        loop {
            let (sequence, ids) = {
                let ledger = self.ledger.lock().await;
                match ledger.peek_redo() {
                    Some(entry) => (entry.sequence, entry.effect.contact_ids()),
                    None => return Ok(LedgerOutcome::NothingToRedo),
                }
            };

            let _guard = self.locks.acquire(ids).await;
            let mut ledger = self.ledger.lock().await;
            if ledger.peek_redo().map(|entry| entry.sequence) != Some(sequence) {
                continue;
            }

            let outcome = ledger.redo(self.store.as_ref()).await?;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            return Ok(outcome);
        }
    }

    /// Undo history, oldest first.
    pub async fn history(&self) -> Vec<LedgerEntry> {
        self.ledger.lock().await.history().to_vec()
    }

    pub async fn can_undo(&self) -> bool {
        self.ledger.lock().await.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.ledger.lock().await.can_redo()
    }

    /// Copy of the ledger, for saving between sessions.
    pub async fn ledger_snapshot(&self) -> UndoLedger {
        self.ledger.lock().await.clone()
    }

    /// Re-run analysis over the store's current records.
    pub async fn refresh_analysis(&self) -> anyhow::Result<Arc<AnalysisSnapshot>> {
        // Read the epoch first so a mutation racing the fetch marks this report stale.
        let epoch = self.epoch();
        let records = self.store.fetch_all().await?;
        self.analysis.run(records, epoch).await
    }

    pub async fn latest_analysis(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.analysis.latest().await
    }

    pub fn is_stale(&self, snapshot: &AnalysisSnapshot) -> bool {
        snapshot.epoch < self.epoch()
    }

    async fn record(&self, effect: shared_types::UndoEffect, description: String) -> LedgerEntry {
        let entry = self.ledger.lock().await.register(effect, description).clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entry
    }
}
