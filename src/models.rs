use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a transaction. Transitions are server-authoritative;
/// the client only requests them and re-renders on confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Classified,
    Approved,
    Posted,
    Duplicate,
    Excluded,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Classified => "Classified",
            Status::Approved => "Approved",
            Status::Posted => "Posted",
            Status::Duplicate => "Duplicate",
            Status::Excluded => "Excluded",
        }
    }

    /// Whether this row contributes to the pending-total aggregate.
    pub fn counts_toward_pending(self) -> bool {
        matches!(self, Status::Pending | Status::Classified)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub name: String,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub card_member: String,
    pub amount: Decimal,
    pub status: Status,
    #[serde(default)]
    pub has_suggestion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCenterSplit {
    pub cost_center: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub name: String,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub card_member: String,
    pub amount: Decimal,
    pub status: Status,
    pub reference: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub expense_account: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost_center_splits: Vec<CostCenterSplit>,
}

/// Server-computed best-guess classification, used only to pre-fill the form.
#[derive(Debug, Clone, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub expense_account: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBundle {
    pub transaction: TransactionDetail,
    #[serde(default)]
    pub suggestion: Option<Suggestion>,
}

/// Filter criteria for the pending list. All fields optional, combined with
/// AND semantics server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_member: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.batch_id.is_none()
            && self.card_member.is_none()
            && self.from_date.is_none()
            && self.to_date.is_none()
            && self.keyword.is_none()
    }

    /// One-line description of the active filters for the footer.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref b) = self.batch_id {
            parts.push(format!("batch={b}"));
        }
        if let Some(ref m) = self.card_member {
            parts.push(format!("member={m}"));
        }
        match (self.from_date, self.to_date) {
            (Some(f), Some(t)) => parts.push(format!("{f}..{t}")),
            (Some(f), None) => parts.push(format!("from {f}")),
            (None, Some(t)) => parts.push(format!("to {t}")),
            (None, None) => {}
        }
        if let Some(ref k) = self.keyword {
            parts.push(format!("keyword={k}"));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchOption {
    pub name: String,
    pub import_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub batches: Vec<BatchOption>,
    #[serde(default)]
    pub card_members: Vec<String>,
}

/// One entry of a supplier/account/cost-center picker list.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedOption {
    pub name: String,
    pub display_name: String,
}

impl NamedOption {
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifyRequest {
    pub transaction_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub expense_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center_splits: Option<Vec<CostCenterSplit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkClassifyRequest {
    pub transaction_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub expense_account: String,
    pub cost_center: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorRequest {
    pub vendor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusOutcome {
    pub status: Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostOutcome {
    pub status: Status,
    pub journal_entry: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkClassifyOutcome {
    pub success_count: u32,
    pub error_count: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostedRef {
    pub transaction: String,
    pub journal_entry: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemError {
    pub transaction: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkPostOutcome {
    #[serde(default)]
    pub posted: Vec<PostedRef>,
    #[serde(default)]
    pub errors: Vec<BulkItemError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorCreated {
    pub supplier: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_pending_aggregate_membership() {
        assert!(Status::Pending.counts_toward_pending());
        assert!(Status::Classified.counts_toward_pending());
        assert!(!Status::Approved.counts_toward_pending());
        assert!(!Status::Posted.counts_toward_pending());
        assert!(!Status::Duplicate.counts_toward_pending());
        assert!(!Status::Excluded.counts_toward_pending());
    }

    #[test]
    fn test_filter_criteria_describe() {
        let mut f = FilterCriteria::default();
        assert!(f.is_empty());
        assert_eq!(f.describe(), "");

        f.batch_id = Some("BATCH-0007".to_string());
        f.keyword = Some("uber".to_string());
        assert!(!f.is_empty());
        assert_eq!(f.describe(), "batch=BATCH-0007, keyword=uber");
    }

    #[test]
    fn test_filter_criteria_serializes_only_set_fields() {
        let f = FilterCriteria {
            card_member: Some("J SMITH".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["card_member"], "J SMITH");
        assert!(json.get("batch_id").is_none());
        assert!(json.get("keyword").is_none());
    }

    #[test]
    fn test_detail_deserializes_with_missing_classification() {
        let json = r#"{
            "name": "AMEX-00042",
            "transaction_date": "2025-03-14",
            "description": "UBER TRIP",
            "card_member": "J SMITH",
            "amount": "42.50",
            "status": "Pending",
            "reference": "REF-1"
        }"#;
        let d: TransactionDetail = serde_json::from_str(json).unwrap();
        assert_eq!(d.status, Status::Pending);
        assert!(d.vendor.is_none());
        assert!(d.cost_center_splits.is_empty());
    }
}
