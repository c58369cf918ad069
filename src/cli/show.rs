use crate::api::ReviewApi;
use crate::error::Result;
use crate::fmt::{money, percent};
use crate::lifecycle::available_actions;

pub fn run(api: &dyn ReviewApi, transaction_name: &str) -> Result<()> {
    let bundle = api.get_transaction_details(transaction_name)?;
    let t = &bundle.transaction;

    println!("Transaction:  {}", t.name);
    println!("Reference:    {}", t.reference);
    println!("Date:         {}", t.transaction_date);
    println!("Description:  {}", t.description);
    println!("Card member:  {}", t.card_member);
    println!("Amount:       {}", money(t.amount));
    println!("Category:     {}", t.category.as_deref().unwrap_or("(none)"));
    println!("Status:       {}", t.status);

    println!();
    println!("Vendor:           {}", t.vendor.as_deref().unwrap_or("(unclassified)"));
    println!("Expense account:  {}", t.expense_account.as_deref().unwrap_or("(unclassified)"));
    if t.cost_center_splits.is_empty() {
        println!("Cost center:      {}", t.cost_center.as_deref().unwrap_or("(unclassified)"));
    } else {
        println!("Cost centers:");
        for split in &t.cost_center_splits {
            let amount = split.amount.map(money).unwrap_or_default();
            let pct = split.percentage.map(percent).unwrap_or_default();
            println!("  {:<28} {:>12} {:>8}", split.cost_center, amount, pct);
        }
    }
    if let Some(ref notes) = t.notes {
        println!("Notes:            {notes}");
    }

    if let Some(ref s) = bundle.suggestion {
        println!();
        println!(
            "Suggestion ({:.0}% confidence):",
            s.confidence * 100.0
        );
        if let Some(ref v) = s.vendor {
            println!("  Vendor:          {v}");
        }
        if let Some(ref a) = s.expense_account {
            println!("  Expense account: {a}");
        }
        if let Some(ref c) = s.cost_center {
            println!("  Cost center:     {c}");
        }
    }

    let actions = available_actions(t.status);
    if actions.is_empty() {
        println!("\nNo actions available in status {}.", t.status);
    } else {
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        println!("\nAvailable actions: {}", labels.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{detail_bundle, MockApi};
    use crate::models::{Status, Suggestion};

    #[test]
    fn test_show_fetches_detail() {
        let mut api = MockApi::new(vec![]);
        api.bundles.push(detail_bundle(
            "AMEX-1",
            4250,
            Status::Pending,
            Some(Suggestion {
                vendor: Some("SUP-UBER".to_string()),
                expense_account: None,
                cost_center: None,
                confidence: 0.9,
            }),
        ));
        run(&api, "AMEX-1").unwrap();
        assert_eq!(api.calls_for("get_transaction_details"), 1);
    }

    #[test]
    fn test_show_unknown_transaction_is_an_error() {
        let api = MockApi::new(vec![]);
        assert!(run(&api, "AMEX-404").is_err());
    }
}
