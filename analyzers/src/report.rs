use crate::{summarize, Matcher, QualityScorer};
use serde::{Deserialize, Serialize};
use shared_types::{DataQualityIssue, DataQualitySummary, DuplicateGroup, Record};

/// Everything one analysis pass produces over a snapshot of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub record_count: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub issues: Vec<DataQualityIssue>,
    pub summary: DataQualitySummary,
    pub generated_at: i64,
}

/// Runs matching, scoring and summarizing over the same snapshot.
pub fn run_analysis(
    records: &[Record],
    matcher: &Matcher,
    scorer: &QualityScorer,
) -> AnalysisReport {
    let duplicates = matcher.find_duplicates(records);
    let issues = scorer.analyze(records);
    let summary = summarize(&issues);

    AnalysisReport {
        record_count: records.len(),
        duplicates,
        issues,
        summary,
        generated_at: chrono::Utc::now().timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let report = run_analysis(&[], &Matcher::default(), &QualityScorer::default());
        assert_eq!(report.record_count, 0);
        assert!(report.duplicates.is_empty());
        assert!(report.issues.is_empty());
        assert_eq!(report.summary.health_score, 100.0);
    }
}
