pub mod actions;
pub mod init;
pub mod list;
pub mod review;
pub mod show;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::error::{Result, ReviewError};

pub(crate) fn parse_date_opt(value: &Option<String>) -> Result<Option<NaiveDate>> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ReviewError::BadDate(s.clone())),
        None => Ok(None),
    }
}

#[derive(Parser)]
#[command(
    name = "cardreview",
    about = "Terminal review workspace for corporate-card transactions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Point cardreview at a review server and save settings.
    Init {
        /// Base URL of the review server, e.g. https://erp.example.com
        #[arg(long)]
        server: String,
        /// API key sent as an Authorization token
        #[arg(long = "api-key")]
        api_key: Option<String>,
        /// Reject split allocations whose totals do not reconcile
        #[arg(long = "enforce-split-totals")]
        enforce_split_totals: bool,
    },
    /// List pending transactions.
    List {
        /// Filter by import batch
        #[arg(long)]
        batch: Option<String>,
        /// Filter by card member name
        #[arg(long = "card-member")]
        card_member: Option<String>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Free-text keyword filter
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Show one transaction's detail, suggestion, and available actions.
    Show {
        /// Transaction name, e.g. AMEX-00042
        transaction: String,
    },
    /// Interactively review, classify, approve, and post transactions.
    Review,
    /// Approve a classified transaction.
    Approve {
        /// Transaction name
        transaction: String,
    },
    /// Post an approved transaction to a journal entry.
    Post {
        /// Transaction name
        transaction: String,
    },
    /// Mark a transaction as a duplicate.
    Duplicate {
        /// Transaction name
        transaction: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_opt() {
        assert_eq!(parse_date_opt(&None).unwrap(), None);
        assert_eq!(
            parse_date_opt(&Some("2025-03-14".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
        assert!(parse_date_opt(&Some("03/14/2025".to_string())).is_err());
    }
}
