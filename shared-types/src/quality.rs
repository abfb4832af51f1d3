use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Kind of completeness problem found on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    MissingName,
    MissingPhone,
    MissingEmail,
    NoContactInfo,
    IncompleteData,
    Suggestion,
}

impl IssueType {
    pub fn label(&self) -> &'static str {
        match self {
            IssueType::MissingName => "Missing name",
            IssueType::MissingPhone => "Missing phone",
            IssueType::MissingEmail => "Missing email",
            IssueType::NoContactInfo => "No contact info",
            IssueType::IncompleteData => "Incomplete data",
            IssueType::Suggestion => "Suggestion",
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing-name" => Ok(IssueType::MissingName),
            "missing-phone" => Ok(IssueType::MissingPhone),
            "missing-email" => Ok(IssueType::MissingEmail),
            "no-contact-info" => Ok(IssueType::NoContactInfo),
            "incomplete-data" => Ok(IssueType::IncompleteData),
            "suggestion" => Ok(IssueType::Suggestion),
            other => Err(format!("Unknown issue type: {}", other)),
        }
    }
}

/// Severity, declared worst first so the derived `Ord` is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    High,
    Medium,
    Low,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DataQualityIssue {
    pub contact_id: String,
    pub contact_name: String,
    pub issue_type: IssueType,
    pub description: String,
    pub severity: Severity,
}

/// Aggregate view over one analysis run. Recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DataQualitySummary {
    pub total_issues: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<IssueType, usize>,
    pub health_score: f64,
}

impl DataQualitySummary {
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn count_of_type(&self, issue_type: IssueType) -> usize {
        self.by_type.get(&issue_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_orders_worst_first() {
        let mut severities = vec![
            Severity::Suggestion,
            Severity::Low,
            Severity::High,
            Severity::Medium,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Suggestion
            ]
        );
    }

    #[test]
    fn test_issue_type_parses_wire_name() {
        let parsed: IssueType = "no-contact-info".parse().unwrap();
        assert_eq!(parsed, IssueType::NoContactInfo);
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            "\"no-contact-info\""
        );
        assert!("nope".parse::<IssueType>().is_err());
    }
}
