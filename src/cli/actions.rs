use colored::Colorize;

use crate::api::ReviewApi;
use crate::error::Result;

pub fn approve(api: &dyn ReviewApi, transaction_name: &str) -> Result<()> {
    let outcome = api.approve_transaction(transaction_name)?;
    println!(
        "{} {transaction_name} (status: {})",
        "Approved".green(),
        outcome.status
    );
    Ok(())
}

pub fn post(api: &dyn ReviewApi, transaction_name: &str) -> Result<()> {
    let outcome = api.post_transaction(transaction_name)?;
    println!(
        "{} {transaction_name} to journal entry {}",
        "Posted".green(),
        outcome.journal_entry
    );
    Ok(())
}

pub fn duplicate(api: &dyn ReviewApi, transaction_name: &str) -> Result<()> {
    let outcome = api.mark_as_duplicate(transaction_name)?;
    println!(
        "{} {transaction_name} (status: {})",
        "Marked duplicate".yellow(),
        outcome.status
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;

    #[test]
    fn test_one_shot_actions_each_issue_one_call() {
        let api = MockApi::new(vec![]);
        approve(&api, "AMEX-1").unwrap();
        post(&api, "AMEX-1").unwrap();
        duplicate(&api, "AMEX-2").unwrap();
        assert_eq!(api.calls_for("approve_transaction"), 1);
        assert_eq!(api.calls_for("post_transaction"), 1);
        assert_eq!(api.calls_for("mark_as_duplicate"), 1);
    }
}
