use serde::{Deserialize, Serialize};
use shared_types::{DataQualityIssue, DataQualitySummary, IssueType, Record, Severity};
use std::collections::BTreeMap;

const HIGH_PENALTY: f64 = 10.0;
const MEDIUM_PENALTY: f64 = 3.0;
const LOW_PENALTY: f64 = 0.5;
const LOW_PENALTY_CAP: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Names treated as missing, compared case-insensitively after trimming.
    pub placeholder_names: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            placeholder_names: vec!["No Name".to_string()],
        }
    }
}

/// Inspects records for completeness problems.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScorerConfig,
}

impl QualityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Issues across all records, worst severity first. Records keep their
    /// relative order within a severity.
    pub fn analyze(&self, records: &[Record]) -> Vec<DataQualityIssue> {
        let mut issues: Vec<DataQualityIssue> = records
            .iter()
            .flat_map(|record| self.inspect(record))
            .collect();

        issues.sort_by_key(|issue| issue.severity);

        tracing::debug!(
            records = records.len(),
            issues = issues.len(),
            "Quality analysis finished"
        );

        issues
    }

    /// Issues for one record. Every rule is evaluated independently.
    pub fn inspect(&self, record: &Record) -> Vec<DataQualityIssue> {
        let mut issues = Vec::new();
        let has_phone = !record.phones.is_empty();
        let has_email = !record.emails.is_empty();

        let issue = |issue_type: IssueType, severity: Severity, description: String| {
            DataQualityIssue {
                contact_id: record.id.clone(),
                contact_name: record.display_name.clone(),
                issue_type,
                description,
                severity,
            }
        };

        if self.is_missing_name(&record.display_name) {
            issues.push(issue(
                IssueType::MissingName,
                Severity::High,
                "Contact has no name".to_string(),
            ));
        }

        if !has_phone && !has_email {
            issues.push(issue(
                IssueType::NoContactInfo,
                Severity::High,
                "Contact has no phone number or email address".to_string(),
            ));
        }

        if !has_phone && has_email {
            issues.push(issue(
                IssueType::MissingPhone,
                Severity::Medium,
                "Contact has an email address but no phone number".to_string(),
            ));
        }

        if !has_email && has_phone {
            issues.push(issue(
                IssueType::MissingEmail,
                Severity::Low,
                "Contact has a phone number but no email address".to_string(),
            ));
        }

        if record.organization().is_none() && has_phone && has_email {
            issues.push(issue(
                IssueType::Suggestion,
                Severity::Suggestion,
                "Consider adding a company or organization".to_string(),
            ));
        }

        issues
    }

    fn is_missing_name(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        name.is_empty()
            || self
                .config
                .placeholder_names
                .iter()
                .any(|placeholder| placeholder.trim().to_lowercase() == name)
    }
}

/// Scores records with the default placeholder list.
pub fn analyze(records: &[Record]) -> Vec<DataQualityIssue> {
    QualityScorer::default().analyze(records)
}

/// Counts per severity and type, plus the 0-100 health score.
///
/// Each high issue costs 10 points and each medium 3. Low issues cost half a
/// point each but never more than 5 in total. Suggestions are free.
pub fn summarize(issues: &[DataQualityIssue]) -> DataQualitySummary {
    let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    let mut by_type: BTreeMap<IssueType, usize> = BTreeMap::new();

    for issue in issues {
        *by_severity.entry(issue.severity).or_default() += 1;
        *by_type.entry(issue.issue_type).or_default() += 1;
    }

    let count = |severity: Severity| by_severity.get(&severity).copied().unwrap_or(0) as f64;

    let health_score = if issues.is_empty() {
        100.0
    } else {
        let penalty = count(Severity::High) * HIGH_PENALTY
            + count(Severity::Medium) * MEDIUM_PENALTY
            + (count(Severity::Low) * LOW_PENALTY).min(LOW_PENALTY_CAP);
        (100.0 - penalty).max(0.0)
    };

    DataQualitySummary {
        total_issues: issues.len(),
        by_severity,
        by_type,
        health_score,
    }
}
