mod index;

use crate::similarity::{intersects, normalized_similarity};
use index::{CandidateIndex, Prepared};
use serde::{Deserialize, Serialize};
use shared_types::{DuplicateGroup, MatchType, Record};

/// Confidences and thresholds for pair classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub exact_name_confidence: f64,
    pub shared_channel_confidence: f64,
    /// Similarity a pair must exceed when both records share an organization.
    pub same_org_similarity: f64,
    /// Similarity a pair must exceed regardless of organization.
    pub similarity: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            exact_name_confidence: 1.0,
            shared_channel_confidence: 0.95,
            same_org_similarity: 0.85,
            similarity: 0.90,
        }
    }
}

/// Groups records that probably describe the same person.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Classify a single pair. The first rule that fires wins.
    pub fn classify(&self, a: &Record, b: &Record) -> Option<(MatchType, f64)> {
        self.classify_prepared(&Prepared::new(a), &Prepared::new(b))
    }

    fn classify_prepared(&self, a: &Prepared<'_>, b: &Prepared<'_>) -> Option<(MatchType, f64)> {
        if !a.name.is_empty() && a.name == b.name {
            return Some((MatchType::ExactName, self.config.exact_name_confidence));
        }
        if intersects(&a.record.phones, &b.record.phones) {
            return Some((MatchType::SamePhone, self.config.shared_channel_confidence));
        }
        if intersects(&a.record.emails, &b.record.emails) {
            return Some((MatchType::SameEmail, self.config.shared_channel_confidence));
        }

        let similarity = normalized_similarity(&a.name, &b.name);
        let same_org = matches!(
            (&a.organization, &b.organization),
            (Some(left), Some(right)) if left == right
        );
        if same_org && similarity > self.config.same_org_similarity {
            return Some((MatchType::SimilarName, similarity));
        }
        if similarity > self.config.similarity {
            return Some((MatchType::SimilarName, similarity));
        }

        None
    }

    /// Duplicate groups ordered by descending confidence.
    ///
    /// Each record not yet grouped seeds a group and pulls in every later
    /// ungrouped record that matches the seed. A group reports the highest
    /// pair confidence it saw, with that pair's match type.
    pub fn find_duplicates(&self, records: &[Record]) -> Vec<DuplicateGroup> {
        if records.len() < 2 {
            return Vec::new();
        }

        let prepared: Vec<Prepared> = records.iter().map(Prepared::new).collect();
        let min_similarity = self
            .config
            .same_org_similarity
            .min(self.config.similarity);
        let index = CandidateIndex::build(&prepared, min_similarity);

        let mut grouped = vec![false; records.len()];
        let mut groups = Vec::new();
        let mut comparisons = 0usize;

        for seed in 0..prepared.len() {
            if grouped[seed] {
                continue;
            }

            let mut members = vec![seed];
            let mut best: Option<(MatchType, f64)> = None;

            for candidate in index.candidates(seed, &prepared) {
                if grouped[candidate] {
                    continue;
                }
                comparisons += 1;

                if let Some((match_type, confidence)) =
                    self.classify_prepared(&prepared[seed], &prepared[candidate])
                {
                    members.push(candidate);
                    grouped[candidate] = true;
                    if best.map_or(true, |(_, current)| confidence > current) {
                        best = Some((match_type, confidence));
                    }
                }
            }

            if let Some((match_type, confidence)) = best {
                grouped[seed] = true;
                let group_records = members.iter().map(|&i| records[i].clone()).collect();
                groups.push(DuplicateGroup::new(group_records, match_type, confidence));
            }
        }

        groups.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            records = records.len(),
            comparisons,
            groups = groups.len(),
            "Duplicate scan finished"
        );

        groups
    }
}

/// Runs the matcher with default thresholds.
pub fn find_duplicates(records: &[Record]) -> Vec<DuplicateGroup> {
    Matcher::default().find_duplicates(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight pairwise scan, kept to check the bucketed path against.
    fn naive_groups(matcher: &Matcher, records: &[Record]) -> Vec<(Vec<String>, MatchType, f64)> {
        let mut grouped = vec![false; records.len()];
        let mut out = Vec::new();

        for seed in 0..records.len() {
            if grouped[seed] {
                continue;
            }
            let mut members = vec![records[seed].id.clone()];
            let mut best: Option<(MatchType, f64)> = None;
            for other in (seed + 1)..records.len() {
                if grouped[other] {
                    continue;
                }
                if let Some((t, c)) = matcher.classify(&records[seed], &records[other]) {
                    members.push(records[other].id.clone());
                    grouped[other] = true;
                    if best.map_or(true, |(_, current)| c > current) {
                        best = Some((t, c));
                    }
                }
            }
            if let Some((t, c)) = best {
                grouped[seed] = true;
                out.push((members, t, c));
            }
        }

        out.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    fn summarize(groups: &[DuplicateGroup]) -> Vec<(Vec<String>, MatchType, f64)> {
        groups
            .iter()
            .map(|g| {
                (
                    g.records.iter().map(|r| r.id.clone()).collect(),
                    g.match_type,
                    g.confidence,
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_and_singleton() {
        assert!(find_duplicates(&[]).is_empty());
        assert!(find_duplicates(&[Record::new("1", "Alice")]).is_empty());
    }

    #[test]
    fn test_exact_name_case_insensitive() {
        let records = vec![
            Record::new("1", "alice example").with_phone("111"),
            Record::new("2", "Alice Example").with_email("a@x.com"),
        ];
        let groups = find_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_type, MatchType::ExactName);
        assert_eq!(groups[0].confidence, 1.0);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_alice_example() {
        let records = vec![
            Record::new("a", "Alice Example")
                .with_organization("Acme")
                .with_phone("111-1111")
                .with_email("alice@x.com"),
            Record::new("b", "Alice Example")
                .with_phone("222-2222")
                .with_email("alice@work.com")
                .with_image(),
        ];
        let groups = find_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].confidence, 1.0);
        assert_eq!(groups[0].record_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_shared_phone_and_email() {
        let records = vec![
            Record::new("1", "Robert Jones").with_phone("555-0100"),
            Record::new("2", "Bob J").with_phone("555-0100"),
            Record::new("3", "Carol King").with_email("carol@x.com"),
            Record::new("4", "C. King").with_email("carol@x.com"),
        ];
        let groups = find_duplicates(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].match_type, MatchType::SamePhone);
        assert_eq!(groups[0].confidence, 0.95);
        assert_eq!(groups[1].match_type, MatchType::SameEmail);
    }

    #[test]
    fn test_similar_name_needs_shared_org_below_ninety() {
        // distance 2 over 14 chars: similarity ~0.857
        let with_org = vec![
            Record::new("1", "Katherine Wood").with_organization("Acme"),
            Record::new("2", "Katharine Woad").with_organization("acme"),
        ];
        let groups = find_duplicates(&with_org);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_type, MatchType::SimilarName);
        assert!(groups[0].confidence > 0.85 && groups[0].confidence < 0.90);

        let without_org = vec![
            Record::new("1", "Katherine Wood").with_organization("Acme"),
            Record::new("2", "Katharine Woad"),
        ];
        assert!(find_duplicates(&without_org).is_empty());
    }

    #[test]
    fn test_similar_name_above_ninety_without_org() {
        let records = vec![
            Record::new("1", "Jonathan Smith"),
            Record::new("2", "Johnathan Smith"),
        ];
        let groups = find_duplicates(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_type, MatchType::SimilarName);
        assert!(groups[0].confidence > 0.9);
    }

    #[test]
    fn test_group_reports_highest_confidence() {
        let records = vec![
            Record::new("1", "Jonathan Smith").with_phone("111"),
            Record::new("2", "Johnathan Smith"),
            Record::new("3", "Someone Else").with_phone("111"),
        ];
        let groups = find_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0].match_type, MatchType::SamePhone);
        assert_eq!(groups[0].confidence, 0.95);
    }

    #[test]
    fn test_blank_names_are_not_exact_matches() {
        let records = vec![Record::new("1", ""), Record::new("2", "  ")];
        assert!(find_duplicates(&records).is_empty());
    }

    #[test]
    fn test_sorted_by_confidence_stable() {
        let records = vec![
            Record::new("1", "Jonathan Smith"),
            Record::new("2", "Johnathan Smith"),
            Record::new("3", "Dana Scully").with_phone("9"),
            Record::new("4", "Fox Mulder").with_phone("9"),
            Record::new("5", "Walter Skinner"),
            Record::new("6", "walter skinner"),
            Record::new("7", "Monica Reyes").with_phone("7"),
            Record::new("8", "John Doggett").with_phone("7"),
        ];
        let groups = find_duplicates(&records);
        let ids: Vec<Vec<&str>> = groups.iter().map(|g| g.record_ids()).collect();

        assert_eq!(
            ids,
            vec![
                vec!["5", "6"],
                vec!["3", "4"],
                vec!["7", "8"],
                vec!["1", "2"],
            ]
        );
    }

    #[test]
    fn test_bucketed_scan_matches_pairwise_reference() {
        let first = ["Ann", "Anne", "Annie", "Bob", "Robert", "Rob", "Katherine", "Kathryn"];
        let last = ["Lee", "Leigh", "Smith", "Smyth", "Johnson", "Jonson"];
        let orgs = [None, Some("Acme"), Some("Globex")];

        let mut records = Vec::new();
        let mut n = 0u32;
        for (fi, f) in first.iter().enumerate() {
            for (li, l) in last.iter().enumerate() {
                n += 1;
                let mut record = Record::new(n.to_string(), format!("{} {}", f, l));
                if let Some(org) = orgs[(fi + li) % orgs.len()] {
                    record = record.with_organization(org);
                }
                if n % 7 == 0 {
                    record = record.with_phone(format!("555-{:04}", n % 3));
                }
                if n % 5 == 0 {
                    record = record.with_email(format!("{}@x.com", n % 4));
                }
                records.push(record);
            }
        }
        records.push(Record::new("blank", ""));
        records.push(Record::new("upper", "ANN LEE"));

        for config in [
            MatcherConfig::default(),
            MatcherConfig {
                same_org_similarity: 0.6,
                similarity: 0.7,
                ..MatcherConfig::default()
            },
        ] {
            let matcher = Matcher::new(config);
            let bucketed = summarize(&matcher.find_duplicates(&records));
            let naive = naive_groups(&matcher, &records);
            assert_eq!(bucketed, naive);
        }
    }
}
