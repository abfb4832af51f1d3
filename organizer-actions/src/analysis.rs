use analyzers::{run_analysis, AnalysisReport, Matcher, QualityScorer};
use anyhow::{Context, Result};
use shared_types::Record;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A published report and the mutation epoch its snapshot was taken at.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub epoch: u64,
    pub report: AnalysisReport,
}

/// Runs analysis off the async runtime and publishes the newest result.
#[derive(Clone)]
pub struct AnalysisRunner {
    matcher: Arc<Matcher>,
    scorer: Arc<QualityScorer>,
    published: Arc<RwLock<Option<Arc<AnalysisSnapshot>>>>,
}

impl AnalysisRunner {
    pub fn new(matcher: Matcher, scorer: QualityScorer) -> Self {
        Self {
            matcher: Arc::new(matcher),
            scorer: Arc::new(scorer),
            published: Arc::new(RwLock::new(None)),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Analyze `records`, taken at `epoch`, on a blocking worker.
    ///
    /// The result replaces the published report unless a report from a later
    /// epoch was published while this one was running.
    pub async fn run(&self, records: Vec<Record>, epoch: u64) -> Result<Arc<AnalysisSnapshot>> {
        let matcher = self.matcher.clone();
        let scorer = self.scorer.clone();

        let report = tokio::task::spawn_blocking(move || run_analysis(&records, &matcher, &scorer))
            .await
            .context("Analysis worker did not finish")?;

        let snapshot = Arc::new(AnalysisSnapshot { epoch, report });

        let mut published = self.published.write().await;
        match published.as_ref() {
            Some(current) if current.epoch > epoch => {
                tracing::debug!(
                    epoch,
                    published_epoch = current.epoch,
                    "Discarding analysis from an older snapshot"
                );
            }
            _ => {
                tracing::debug!(
                    epoch,
                    records = snapshot.report.record_count,
                    groups = snapshot.report.duplicates.len(),
                    issues = snapshot.report.issues.len(),
                    "Published analysis"
                );
                *published = Some(snapshot.clone());
            }
        }

        Ok(snapshot)
    }

    pub async fn latest(&self) -> Option<Arc<AnalysisSnapshot>> {
        self.published.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publishes_report() {
        let runner = AnalysisRunner::new(Matcher::default(), QualityScorer::default());
        assert!(runner.latest().await.is_none());

        let records = vec![Record::new("1", "Alice"), Record::new("2", "alice")];
        let snapshot = runner.run(records, 3).await.unwrap();
        assert_eq!(snapshot.report.duplicates.len(), 1);

        let latest = runner.latest().await.unwrap();
        assert_eq!(latest.epoch, 3);
    }

    #[tokio::test]
    async fn test_older_epoch_does_not_replace_newer() {
        let runner = AnalysisRunner::new(Matcher::default(), QualityScorer::default());
        runner.run(vec![Record::new("1", "Alice")], 5).await.unwrap();

        let stale = runner.run(Vec::new(), 4).await.unwrap();
        assert_eq!(stale.epoch, 4);

        let latest = runner.latest().await.unwrap();
        assert_eq!(latest.epoch, 5);
        assert_eq!(latest.report.record_count, 1);
    }
}
