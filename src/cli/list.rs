use comfy_table::{Cell, Table};

use crate::api::ReviewApi;
use crate::error::Result;
use crate::fmt::money;
use crate::models::FilterCriteria;

pub fn run(api: &dyn ReviewApi, filters: &FilterCriteria) -> Result<()> {
    let transactions = api.get_pending_transactions(filters)?;

    if transactions.is_empty() {
        if filters.is_empty() {
            println!("No pending transactions.");
        } else {
            println!("No pending transactions match: {}", filters.describe());
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Date",
        "Description",
        "Card Member",
        "Amount",
        "Status",
    ]);
    for t in &transactions {
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(t.transaction_date),
            Cell::new(&t.description),
            Cell::new(&t.card_member),
            Cell::new(money(t.amount)),
            Cell::new(t.status),
        ]);
    }

    let pending_total: rust_decimal::Decimal = transactions
        .iter()
        .filter(|t| t.status.counts_toward_pending())
        .map(|t| t.amount)
        .sum();

    println!("Pending Transactions\n{table}");
    println!(
        "{} transaction(s) | Pending total: {}",
        transactions.len(),
        money(pending_total)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{summary, MockApi};
    use crate::models::Status;

    #[test]
    fn test_list_queries_the_server_once() {
        let api = MockApi::new(vec![
            summary("AMEX-1", 1000, Status::Pending, "2025-03-01"),
            summary("AMEX-2", 500, Status::Classified, "2025-03-02"),
        ]);
        run(&api, &FilterCriteria::default()).unwrap();
        assert_eq!(api.calls_for("get_pending_transactions"), 1);
    }

    #[test]
    fn test_list_handles_empty_result() {
        let api = MockApi::new(vec![]);
        run(&api, &FilterCriteria::default()).unwrap();
        assert_eq!(api.calls_for("get_pending_transactions"), 1);
    }
}
