use shared_types::{DuplicateGroup, MergePlan, MergedValue, Record};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Group {group_id} has {size} record(s); a merge needs at least 2")]
    MalformedGroup { group_id: String, size: usize },
}

/// Build the merge proposal for a duplicate group.
///
/// The most complete record supplies the name and keeps its id. Phones and
/// emails are the union over the group in first-seen order, each tagged with
/// every record that carried it.
pub fn build_plan(group: &DuplicateGroup) -> Result<MergePlan, PlanError> {
    if group.records.len() < 2 {
        return Err(PlanError::MalformedGroup {
            group_id: group.id.clone(),
            size: group.records.len(),
        });
    }

    let primary = most_complete(&group.records);

    let preferred_organization_id = if primary.organization().is_some() {
        Some(primary.id.clone())
    } else {
        group
            .records
            .iter()
            .find(|r| r.organization().is_some())
            .map(|r| r.id.clone())
    };

    let preferred_photo_id = group
        .records
        .iter()
        .find(|r| r.has_image)
        .map(|r| r.id.clone());

    Ok(MergePlan {
        group_id: group.id.clone(),
        preferred_name_id: primary.id.clone(),
        preferred_organization_id,
        preferred_photo_id,
        phones: union_with_owners(&group.records, |r| &r.phones),
        emails: union_with_owners(&group.records, |r| &r.emails),
    })
}

/// The record a plan resolves to, ready to replace the primary.
///
/// Returns `None` if the plan references a record that is not in the group.
pub fn merged_record(plan: &MergePlan, group: &DuplicateGroup) -> Option<Record> {
    let find = |id: &str| group.records.iter().find(|r| r.id == id);

    let primary = find(&plan.preferred_name_id)?;
    let organization = match &plan.preferred_organization_id {
        Some(id) => find(id)?.organization.clone(),
        None => None,
    };
    let has_image = match &plan.preferred_photo_id {
        Some(id) => find(id)?.has_image,
        None => false,
    };

    let created_at = group.records.iter().filter_map(|r| r.created_at).min();

    Some(Record {
        id: primary.id.clone(),
        display_name: primary.display_name.clone(),
        organization,
        phones: plan.phones.iter().map(|p| p.value.clone()).collect(),
        emails: plan.emails.iter().map(|e| e.value.clone()).collect(),
        has_image,
        created_at: created_at.or(primary.created_at),
        modified_at: Some(chrono::Utc::now().timestamp()),
    })
}

fn most_complete(records: &[Record]) -> &Record {
    let mut best = &records[0];
    for record in &records[1..] {
        if record.completeness() > best.completeness() {
            best = record;
        }
    }
    best
}

fn union_with_owners<F>(records: &[Record], values: F) -> Vec<MergedValue>
where
    F: Fn(&Record) -> &Vec<String>,
{
    let mut merged: Vec<MergedValue> = Vec::new();

    for record in records {
        for value in values(record) {
            match merged.iter_mut().find(|m| &m.value == value) {
                Some(existing) => {
                    if !existing.owners.contains(&record.id) {
                        existing.owners.push(record.id.clone());
                    }
                }
                None => merged.push(MergedValue {
                    value: value.clone(),
                    owners: vec![record.id.clone()],
                }),
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::MatchType;

    fn group(records: Vec<Record>) -> DuplicateGroup {
        DuplicateGroup::new(records, MatchType::ExactName, 1.0)
    }

    #[test]
    fn test_alice_example_plan() {
        let a = Record::new("a", "Alice Example")
            .with_organization("Acme")
            .with_phone("111-1111")
            .with_email("alice@x.com");
        let b = Record::new("b", "Alice Example")
            .with_phone("222-2222")
            .with_email("alice@work.com")
            .with_image();
        let plan = build_plan(&group(vec![a, b])).unwrap();

        assert_eq!(plan.phone_values(), vec!["111-1111", "222-2222"]);
        assert_eq!(plan.email_values(), vec!["alice@x.com", "alice@work.com"]);
        assert_eq!(plan.preferred_photo_id.as_deref(), Some("b"));
        assert_eq!(plan.preferred_name_id, "a");
        assert_eq!(plan.preferred_organization_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_shared_values_collapse_with_owners() {
        let records = vec![
            Record::new("1", "Sam").with_phone("555").with_phone("555"),
            Record::new("2", "Sam").with_phone("555").with_phone("777"),
            Record::new("3", "Sam").with_email("Sam@x.com"),
            Record::new("4", "Sam").with_email("sam@x.com"),
        ];
        let plan = build_plan(&group(records)).unwrap();

        assert_eq!(plan.phones.len(), 2);
        assert_eq!(plan.phones[0].owners, vec!["1", "2"]);
        assert_eq!(plan.phones[1].owners, vec!["2"]);
        // exact, case-sensitive matching keeps both spellings
        assert_eq!(plan.emails.len(), 2);
    }

    #[test]
    fn test_plan_is_superset_of_members() {
        let records = vec![
            Record::new("1", "Pat").with_phone("1").with_email("p@a.com"),
            Record::new("2", "Pat").with_phone("2").with_phone("1"),
            Record::new("3", "Pat").with_email("p@b.com").with_email("p@a.com"),
        ];
        let g = group(records.clone());
        let plan = build_plan(&g).unwrap();

        for record in &records {
            for phone in &record.phones {
                assert!(plan.phone_values().contains(&phone.as_str()));
            }
            for email in &record.emails {
                assert!(plan.email_values().contains(&email.as_str()));
            }
        }
        assert!(g.contains(&plan.preferred_name_id));
        for value in plan.phones.iter().chain(plan.emails.iter()) {
            assert!(value.owners.iter().all(|o| g.contains(o)));
        }
    }

    #[test]
    fn test_completeness_tie_keeps_first() {
        let records = vec![
            Record::new("1", "Lee").with_phone("1"),
            Record::new("2", "Lee").with_email("lee@x.com"),
        ];
        let plan = build_plan(&group(records)).unwrap();
        assert_eq!(plan.preferred_name_id, "1");
        assert_eq!(plan.preferred_organization_id, None);
        assert_eq!(plan.preferred_photo_id, None);
    }

    #[test]
    fn test_organization_falls_back_to_first_with_org() {
        let records = vec![
            Record::new("1", "Lee").with_phone("1").with_phone("2"),
            Record::new("2", "Lee").with_organization("Initech"),
        ];
        let plan = build_plan(&group(records)).unwrap();
        assert_eq!(plan.preferred_name_id, "1");
        assert_eq!(plan.preferred_organization_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_malformed_group_rejected() {
        let g = group(vec![Record::new("1", "Solo")]);
        let err = build_plan(&g).unwrap_err();
        assert_eq!(
            err,
            PlanError::MalformedGroup {
                group_id: g.id.clone(),
                size: 1
            }
        );
    }

    #[test]
    fn test_merged_record_takes_preferred_fields() {
        let mut a = Record::new("a", "Alice Example").with_phone("1");
        a.created_at = Some(200);
        let mut b = Record::new("b", "Alice")
            .with_organization("Acme")
            .with_email("a@x.com")
            .with_image();
        b.created_at = Some(100);
        let g = group(vec![a, b]);
        let plan = build_plan(&g).unwrap();
        let merged = merged_record(&plan, &g).unwrap();

        assert_eq!(merged.id, "b");
        assert_eq!(merged.display_name, "Alice");
        assert_eq!(merged.organization.as_deref(), Some("Acme"));
        assert!(merged.has_image);
        assert_eq!(merged.phones, vec!["1"]);
        assert_eq!(merged.emails, vec!["a@x.com"]);
        assert_eq!(merged.created_at, Some(100));
    }
}
