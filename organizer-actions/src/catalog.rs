use shared_types::{ActionKind, DataQualityIssue, HealthIssueAction, IssueType};

pub const FOLLOW_UP_GROUP: &str = "Follow Up";
pub const EMAIL_FOLLOW_UP_GROUP: &str = "Email Follow-Up";
pub const GENERAL_FOLLOW_UP_GROUP: &str = "General Follow-Up";

/// Remediations offered for an issue, ending with "mark reviewed".
pub fn actions_for(issue: &DataQualityIssue) -> Vec<HealthIssueAction> {
    actions_for_type(issue.issue_type)
}

pub fn actions_for_type(issue_type: IssueType) -> Vec<HealthIssueAction> {
    let mut actions = match issue_type {
        IssueType::MissingPhone => vec![add_phone(), add_to_group(FOLLOW_UP_GROUP)],
        IssueType::MissingEmail => vec![add_email(), add_to_group(EMAIL_FOLLOW_UP_GROUP)],
        IssueType::NoContactInfo => vec![
            add_to_group(FOLLOW_UP_GROUP),
            HealthIssueAction::without_input("Archive contact", ActionKind::Archive),
        ],
        IssueType::Suggestion => vec![add_to_group(GENERAL_FOLLOW_UP_GROUP)],
        IssueType::MissingName => vec![HealthIssueAction::with_input(
            "Add name",
            ActionKind::UpdateName,
            "Full name",
            "Jane Appleseed",
        )],
        IssueType::IncompleteData => vec![add_to_group(FOLLOW_UP_GROUP)],
    };

    actions.push(HealthIssueAction::without_input(
        "Mark as reviewed",
        ActionKind::MarkReviewed,
    ));
    actions
}

fn add_phone() -> HealthIssueAction {
    HealthIssueAction::with_input(
        "Add phone number",
        ActionKind::AddPhone,
        "Phone number",
        "+1 555 0100",
    )
}

fn add_email() -> HealthIssueAction {
    HealthIssueAction::with_input(
        "Add email address",
        ActionKind::AddEmail,
        "Email address",
        "name@example.com",
    )
}

fn add_to_group(group: &str) -> HealthIssueAction {
    HealthIssueAction::without_input(
        format!("Add to \"{}\"", group),
        ActionKind::AddToGroup {
            group: group.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [IssueType; 6] = [
        IssueType::MissingName,
        IssueType::MissingPhone,
        IssueType::MissingEmail,
        IssueType::NoContactInfo,
        IssueType::IncompleteData,
        IssueType::Suggestion,
    ];

    fn kinds(issue_type: IssueType) -> Vec<ActionKind> {
        actions_for_type(issue_type)
            .into_iter()
            .map(|a| a.kind)
            .collect()
    }

    #[test]
    fn test_every_list_ends_with_mark_reviewed() {
        for issue_type in ALL_TYPES {
            let actions = actions_for_type(issue_type);
            assert_eq!(
                actions.last().map(|a| &a.kind),
                Some(&ActionKind::MarkReviewed),
                "{:?}",
                issue_type
            );
        }
    }

    #[test]
    fn test_missing_phone_actions() {
        assert_eq!(
            kinds(IssueType::MissingPhone),
            vec![
                ActionKind::AddPhone,
                ActionKind::AddToGroup {
                    group: "Follow Up".to_string()
                },
                ActionKind::MarkReviewed,
            ]
        );
        assert!(actions_for_type(IssueType::MissingPhone)[0].requires_input);
    }

    #[test]
    fn test_missing_email_actions() {
        assert_eq!(
            kinds(IssueType::MissingEmail),
            vec![
                ActionKind::AddEmail,
                ActionKind::AddToGroup {
                    group: "Email Follow-Up".to_string()
                },
                ActionKind::MarkReviewed,
            ]
        );
    }

    #[test]
    fn test_no_contact_info_and_suggestion_actions() {
        assert_eq!(
            kinds(IssueType::NoContactInfo),
            vec![
                ActionKind::AddToGroup {
                    group: "Follow Up".to_string()
                },
                ActionKind::Archive,
                ActionKind::MarkReviewed,
            ]
        );
        assert_eq!(
            kinds(IssueType::Suggestion),
            vec![
                ActionKind::AddToGroup {
                    group: "General Follow-Up".to_string()
                },
                ActionKind::MarkReviewed,
            ]
        );
    }

    #[test]
    fn test_input_prompts_only_when_required() {
        for issue_type in ALL_TYPES {
            for action in actions_for_type(issue_type) {
                assert_eq!(action.requires_input, action.input_prompt.is_some());
            }
        }
    }
}
