use crate::models::{BulkClassifyOutcome, BulkPostOutcome, Status};

/// A state-transition request the user can issue for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Classify,
    Approve,
    Post,
    MarkDuplicate,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Classify => "classify",
            Action::Approve => "approve",
            Action::Post => "post",
            Action::MarkDuplicate => "mark duplicate",
        }
    }

    pub fn key_hint(&self) -> &'static str {
        match self {
            Action::Classify => "c:classify",
            Action::Approve => "v:approve",
            Action::Post => "p:post",
            Action::MarkDuplicate => "x:duplicate",
        }
    }
}

/// Actions available for a status. A pure function of the freshly loaded
/// status, never of prior client actions.
pub fn available_actions(status: Status) -> &'static [Action] {
    match status {
        Status::Pending => &[Action::Classify, Action::MarkDuplicate],
        Status::Classified => &[Action::Approve, Action::MarkDuplicate],
        Status::Approved => &[Action::Post],
        Status::Posted | Status::Duplicate | Status::Excluded => &[],
    }
}

/// Partial-failure outcomes are always reported with explicit counts, never
/// collapsed into a bare success message.
pub fn bulk_classify_summary(outcome: &BulkClassifyOutcome) -> String {
    format!(
        "Bulk classification complete: success={}, errors={}, total={}",
        outcome.success_count, outcome.error_count, outcome.total
    )
}

pub fn bulk_post_summary(outcome: &BulkPostOutcome) -> String {
    let mut summary = format!(
        "Bulk post complete: success={}, errors={}",
        outcome.posted.len(),
        outcome.errors.len()
    );
    if let Some(first) = outcome.errors.first() {
        summary.push_str(&format!(" (first error: {}: {})", first.transaction, first.error));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BulkItemError, PostedRef};

    #[test]
    fn test_pending_shows_classify_not_approve() {
        let actions = available_actions(Status::Pending);
        assert!(actions.contains(&Action::Classify));
        assert!(actions.contains(&Action::MarkDuplicate));
        assert!(!actions.contains(&Action::Approve));
        assert!(!actions.contains(&Action::Post));
    }

    #[test]
    fn test_classified_shows_approve_hides_classify() {
        let actions = available_actions(Status::Classified);
        assert!(actions.contains(&Action::Approve));
        assert!(!actions.contains(&Action::Classify));
    }

    #[test]
    fn test_approved_shows_only_post() {
        assert_eq!(available_actions(Status::Approved), &[Action::Post]);
    }

    #[test]
    fn test_terminal_states_offer_nothing() {
        assert!(available_actions(Status::Posted).is_empty());
        assert!(available_actions(Status::Duplicate).is_empty());
        assert!(available_actions(Status::Excluded).is_empty());
    }

    #[test]
    fn test_bulk_classify_summary_reports_all_counts() {
        let summary = bulk_classify_summary(&BulkClassifyOutcome {
            success_count: 2,
            error_count: 1,
            total: 3,
        });
        assert!(summary.contains("success=2"));
        assert!(summary.contains("errors=1"));
        assert!(summary.contains("total=3"));
    }

    #[test]
    fn test_bulk_post_summary_never_hides_errors() {
        let outcome = BulkPostOutcome {
            posted: vec![
                PostedRef {
                    transaction: "AMEX-1".to_string(),
                    journal_entry: "JE-1".to_string(),
                },
                PostedRef {
                    transaction: "AMEX-2".to_string(),
                    journal_entry: "JE-2".to_string(),
                },
            ],
            errors: vec![BulkItemError {
                transaction: "AMEX-3".to_string(),
                error: "missing cost center".to_string(),
            }],
        };
        let summary = bulk_post_summary(&outcome);
        assert!(summary.contains("success=2"));
        assert!(summary.contains("errors=1"));
        assert!(summary.contains("AMEX-3"));
    }
}
