use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};
use crate::models::{
    BulkClassifyOutcome, BulkClassifyRequest, BulkPostOutcome, ClassifyRequest, FilterCriteria,
    FilterOptions, NamedOption, PostOutcome, StatusOutcome, TransactionBundle, TransactionSummary,
    VendorCreated, VendorRequest,
};
use crate::settings::Settings;

/// Call surface of the review server. One method per remote call; every
/// failure is terminal for that attempt (no retries) and surfaced to the
/// caller.
pub trait ReviewApi {
    fn get_filter_options(&self) -> Result<FilterOptions>;
    fn get_pending_transactions(&self, filters: &FilterCriteria)
        -> Result<Vec<TransactionSummary>>;
    fn get_transaction_details(&self, transaction_name: &str) -> Result<TransactionBundle>;
    fn classify_transaction(&self, request: &ClassifyRequest) -> Result<StatusOutcome>;
    fn approve_transaction(&self, transaction_name: &str) -> Result<StatusOutcome>;
    fn post_transaction(&self, transaction_name: &str) -> Result<PostOutcome>;
    fn mark_as_duplicate(&self, transaction_name: &str) -> Result<StatusOutcome>;
    fn bulk_classify_transactions(
        &self,
        request: &BulkClassifyRequest,
    ) -> Result<BulkClassifyOutcome>;
    fn bulk_approve_and_post(&self, transaction_names: &[String]) -> Result<BulkPostOutcome>;
    fn create_vendor_quick(&self, request: &VendorRequest) -> Result<VendorCreated>;
    fn get_supplier_list(&self) -> Result<Vec<NamedOption>>;
    fn get_account_list(&self, account_type: &str) -> Result<Vec<NamedOption>>;
    fn get_cost_center_list(&self) -> Result<Vec<NamedOption>>;
}

/// HTTP implementation: JSON POST to `{base_url}/api/{method}`.
pub struct HttpApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Serialize)]
struct NameArg<'a> {
    transaction_name: &'a str,
}

#[derive(Serialize)]
struct NamesArg<'a> {
    transaction_names: &'a [String],
}

#[derive(Serialize)]
struct FiltersArg<'a> {
    filters: &'a FilterCriteria,
}

#[derive(Serialize)]
struct AccountTypeArg<'a> {
    account_type: &'a str,
}

#[derive(Serialize)]
struct NoArgs {}

impl HttpApi {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = if settings.api_key.is_empty() {
            None
        } else {
            Some(settings.api_key.clone())
        };
        Self::new(&settings.server_url, key)
    }

    fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/api/{}", self.base_url, method);
        debug!("POST {url}");

        let mut request = self.client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("token {key}"));
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json()?);
        }

        let text = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("{status}: {text}"));
        Err(ReviewError::Api {
            method: method.to_string(),
            message,
        })
    }
}

impl ReviewApi for HttpApi {
    fn get_filter_options(&self) -> Result<FilterOptions> {
        self.call("get_filter_options", &NoArgs {})
    }

    fn get_pending_transactions(
        &self,
        filters: &FilterCriteria,
    ) -> Result<Vec<TransactionSummary>> {
        self.call("get_pending_transactions", &FiltersArg { filters })
    }

    fn get_transaction_details(&self, transaction_name: &str) -> Result<TransactionBundle> {
        self.call("get_transaction_details", &NameArg { transaction_name })
    }

    fn classify_transaction(&self, request: &ClassifyRequest) -> Result<StatusOutcome> {
        self.call("classify_transaction", request)
    }

    fn approve_transaction(&self, transaction_name: &str) -> Result<StatusOutcome> {
        self.call("approve_transaction", &NameArg { transaction_name })
    }

    fn post_transaction(&self, transaction_name: &str) -> Result<PostOutcome> {
        self.call("post_transaction", &NameArg { transaction_name })
    }

    fn mark_as_duplicate(&self, transaction_name: &str) -> Result<StatusOutcome> {
        self.call("mark_as_duplicate", &NameArg { transaction_name })
    }

    fn bulk_classify_transactions(
        &self,
        request: &BulkClassifyRequest,
    ) -> Result<BulkClassifyOutcome> {
        self.call("bulk_classify_transactions", request)
    }

    fn bulk_approve_and_post(&self, transaction_names: &[String]) -> Result<BulkPostOutcome> {
        self.call("bulk_approve_and_post", &NamesArg { transaction_names })
    }

    fn create_vendor_quick(&self, request: &VendorRequest) -> Result<VendorCreated> {
        self.call("create_vendor_quick", request)
    }

    fn get_supplier_list(&self) -> Result<Vec<NamedOption>> {
        self.call("get_supplier_list", &NoArgs {})
    }

    fn get_account_list(&self, account_type: &str) -> Result<Vec<NamedOption>> {
        self.call("get_account_list", &AccountTypeArg { account_type })
    }

    fn get_cost_center_list(&self) -> Result<Vec<NamedOption>> {
        self.call("get_cost_center_list", &NoArgs {})
    }
}

#[cfg(test)]
pub mod mock {
    use std::cell::{Cell, RefCell};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{Status, Suggestion, TransactionDetail};

    /// In-memory `ReviewApi` with canned responses and a call log, used by
    /// controller and command tests.
    pub struct MockApi {
        pub rows: RefCell<Vec<TransactionSummary>>,
        pub bundles: Vec<TransactionBundle>,
        pub bulk_classify_outcome: BulkClassifyOutcome,
        pub bulk_post_outcome: BulkPostOutcome,
        /// When set, `get_pending_transactions` fails until cleared.
        pub fail_loads: Cell<bool>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MockApi {
        pub fn new(rows: Vec<TransactionSummary>) -> Self {
            Self {
                rows: RefCell::new(rows),
                bundles: Vec::new(),
                bulk_classify_outcome: BulkClassifyOutcome {
                    success_count: 0,
                    error_count: 0,
                    total: 0,
                },
                bulk_post_outcome: BulkPostOutcome::default(),
                fail_loads: Cell::new(false),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn calls_for(&self, method: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == method).count()
        }

        fn record(&self, method: &str) {
            self.calls.borrow_mut().push(method.to_string());
        }
    }

    impl ReviewApi for MockApi {
        fn get_filter_options(&self) -> Result<FilterOptions> {
            self.record("get_filter_options");
            Ok(FilterOptions::default())
        }

        fn get_pending_transactions(
            &self,
            _filters: &FilterCriteria,
        ) -> Result<Vec<TransactionSummary>> {
            self.record("get_pending_transactions");
            if self.fail_loads.get() {
                return Err(ReviewError::Other("connection refused".to_string()));
            }
            Ok(self.rows.borrow().clone())
        }

        fn get_transaction_details(&self, transaction_name: &str) -> Result<TransactionBundle> {
            self.record("get_transaction_details");
            self.bundles
                .iter()
                .find(|b| b.transaction.name == transaction_name)
                .cloned()
                .ok_or_else(|| ReviewError::Other(format!("no detail for {transaction_name}")))
        }

        fn classify_transaction(&self, _request: &ClassifyRequest) -> Result<StatusOutcome> {
            self.record("classify_transaction");
            Ok(StatusOutcome {
                status: Status::Classified,
            })
        }

        fn approve_transaction(&self, _transaction_name: &str) -> Result<StatusOutcome> {
            self.record("approve_transaction");
            Ok(StatusOutcome {
                status: Status::Approved,
            })
        }

        fn post_transaction(&self, _transaction_name: &str) -> Result<PostOutcome> {
            self.record("post_transaction");
            Ok(PostOutcome {
                status: Status::Posted,
                journal_entry: "JE-0001".to_string(),
            })
        }

        fn mark_as_duplicate(&self, _transaction_name: &str) -> Result<StatusOutcome> {
            self.record("mark_as_duplicate");
            Ok(StatusOutcome {
                status: Status::Duplicate,
            })
        }

        fn bulk_classify_transactions(
            &self,
            _request: &BulkClassifyRequest,
        ) -> Result<BulkClassifyOutcome> {
            self.record("bulk_classify_transactions");
            Ok(self.bulk_classify_outcome.clone())
        }

        fn bulk_approve_and_post(&self, _transaction_names: &[String]) -> Result<BulkPostOutcome> {
            self.record("bulk_approve_and_post");
            Ok(self.bulk_post_outcome.clone())
        }

        fn create_vendor_quick(&self, request: &VendorRequest) -> Result<VendorCreated> {
            self.record("create_vendor_quick");
            Ok(VendorCreated {
                supplier: request.vendor_name.clone(),
            })
        }

        fn get_supplier_list(&self) -> Result<Vec<NamedOption>> {
            self.record("get_supplier_list");
            Ok(vec![
                option("SUP-ACME", "Acme Supplies"),
                option("SUP-UBER", "Uber"),
            ])
        }

        fn get_account_list(&self, _account_type: &str) -> Result<Vec<NamedOption>> {
            self.record("get_account_list");
            Ok(vec![
                option("5100 - Travel", "Travel"),
                option("5200 - Software", "Software"),
            ])
        }

        fn get_cost_center_list(&self) -> Result<Vec<NamedOption>> {
            self.record("get_cost_center_list");
            Ok(vec![
                option("CC-OPS", "Operations"),
                option("CC-ENG", "Engineering"),
            ])
        }
    }

    fn option(name: &str, display: &str) -> NamedOption {
        NamedOption {
            name: name.to_string(),
            display_name: display.to_string(),
        }
    }

    pub fn summary(name: &str, cents: i64, status: Status, date: &str) -> TransactionSummary {
        TransactionSummary {
            name: name.to_string(),
            transaction_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: format!("CHARGE {name}"),
            card_member: "J SMITH".to_string(),
            amount: Decimal::new(cents, 2),
            status,
            has_suggestion: false,
        }
    }

    pub fn detail_bundle(
        name: &str,
        cents: i64,
        status: Status,
        suggestion: Option<Suggestion>,
    ) -> TransactionBundle {
        TransactionBundle {
            transaction: TransactionDetail {
                name: name.to_string(),
                transaction_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                description: format!("CHARGE {name}"),
                card_member: "J SMITH".to_string(),
                amount: Decimal::new(cents, 2),
                status,
                reference: format!("REF-{name}"),
                category: Some("Travel".to_string()),
                vendor: None,
                expense_account: None,
                cost_center: None,
                notes: None,
                cost_center_splits: Vec::new(),
            },
            suggestion,
        }
    }
}
