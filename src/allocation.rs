use rust_decimal::Decimal;
use thiserror::Error;

use crate::fmt::{money, percent};
use crate::models::{ClassifyRequest, CostCenterSplit, Suggestion, TransactionDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    Single,
    Split,
}

/// One editable row of a split allocation. Amount and percentage are both
/// optional; totals are recomputed from whatever is entered.
#[derive(Debug, Clone, Default)]
pub struct SplitRow {
    pub cost_center: Option<String>,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Copy)]
pub struct SplitTotals {
    pub amount: Decimal,
    pub percentage: Decimal,
    pub amount_entered: bool,
    pub percentage_entered: bool,
}

/// Local validation failures. Raised before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select an expense account before classifying")]
    MissingExpenseAccount,
    #[error("Select a cost center")]
    MissingCostCenter,
    #[error("Add at least one split row with a cost center")]
    EmptySplit,
    #[error("Split totals do not reconcile: {0}")]
    TotalsMismatch(String),
}

/// The classification form for one transaction: vendor, expense account,
/// notes, and a single cost center or an N-way split.
#[derive(Debug, Clone)]
pub struct ClassifyForm {
    pub transaction_name: String,
    pub transaction_amount: Decimal,
    pub vendor: Option<String>,
    pub expense_account: Option<String>,
    pub cost_center: Option<String>,
    pub notes: String,
    pub mode: AllocationMode,
    pub splits: Vec<SplitRow>,
}

impl ClassifyForm {
    /// Pre-fill from the transaction's existing classification, falling back
    /// per field to the server suggestion. Existing values always win.
    pub fn for_transaction(detail: &TransactionDetail, suggestion: Option<&Suggestion>) -> Self {
        let pick = |existing: &Option<String>, suggested: fn(&Suggestion) -> &Option<String>| {
            existing
                .clone()
                .or_else(|| suggestion.and_then(|s| suggested(s).clone()))
        };

        let splits: Vec<SplitRow> = detail
            .cost_center_splits
            .iter()
            .map(|s| SplitRow {
                cost_center: Some(s.cost_center.clone()),
                amount: s.amount,
                percentage: s.percentage,
            })
            .collect();

        Self {
            transaction_name: detail.name.clone(),
            transaction_amount: detail.amount,
            vendor: pick(&detail.vendor, |s| &s.vendor),
            expense_account: pick(&detail.expense_account, |s| &s.expense_account),
            cost_center: pick(&detail.cost_center, |s| &s.cost_center),
            notes: detail.notes.clone().unwrap_or_default(),
            mode: if splits.is_empty() {
                AllocationMode::Single
            } else {
                AllocationMode::Split
            },
            splits,
        }
    }

    /// Switching to split mode with zero rows seeds one empty row.
    pub fn set_mode(&mut self, mode: AllocationMode) {
        self.mode = mode;
        if mode == AllocationMode::Split && self.splits.is_empty() {
            self.splits.push(SplitRow::default());
        }
    }

    pub fn add_split(&mut self) {
        self.splits.push(SplitRow::default());
    }

    pub fn remove_split(&mut self, index: usize) {
        if index < self.splits.len() {
            self.splits.remove(index);
        }
    }

    /// Running totals over all entered values, recomputed on every edit.
    pub fn split_totals(&self) -> SplitTotals {
        let mut totals = SplitTotals {
            amount: Decimal::ZERO,
            percentage: Decimal::ZERO,
            amount_entered: false,
            percentage_entered: false,
        };
        for row in &self.splits {
            if let Some(a) = row.amount {
                totals.amount += a;
                totals.amount_entered = true;
            }
            if let Some(p) = row.percentage {
                totals.percentage += p;
                totals.percentage_entered = true;
            }
        }
        totals
    }

    /// Describes how the entered split totals fail to reconcile with the
    /// transaction, or None when they do (or nothing is entered yet).
    pub fn totals_mismatch(&self) -> Option<String> {
        if self.mode != AllocationMode::Split {
            return None;
        }
        let totals = self.split_totals();
        if totals.amount_entered && totals.amount != self.transaction_amount {
            return Some(format!(
                "amounts sum to {} of {}",
                money(totals.amount),
                money(self.transaction_amount)
            ));
        }
        if totals.percentage_entered && totals.percentage != Decimal::ONE_HUNDRED {
            return Some(format!(
                "percentages sum to {}",
                percent(totals.percentage)
            ));
        }
        None
    }

    /// Validate locally and build the request. An expense account is always
    /// required; single mode requires a cost center, split mode at least one
    /// row with a cost center. With `enforce_totals`, a mismatched split is
    /// rejected instead of submitted with a warning.
    pub fn validate(&self, enforce_totals: bool) -> Result<ClassifyRequest, ValidationError> {
        let expense_account = self
            .expense_account
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or(ValidationError::MissingExpenseAccount)?;

        let notes = if self.notes.trim().is_empty() {
            None
        } else {
            Some(self.notes.trim().to_string())
        };

        match self.mode {
            AllocationMode::Single => {
                let cost_center = self
                    .cost_center
                    .clone()
                    .filter(|c| !c.is_empty())
                    .ok_or(ValidationError::MissingCostCenter)?;
                Ok(ClassifyRequest {
                    transaction_name: self.transaction_name.clone(),
                    vendor: self.vendor.clone(),
                    expense_account,
                    cost_center: Some(cost_center),
                    cost_center_splits: None,
                    notes,
                })
            }
            AllocationMode::Split => {
                let splits: Vec<CostCenterSplit> = self
                    .splits
                    .iter()
                    .filter_map(|row| {
                        row.cost_center.as_ref().map(|cc| CostCenterSplit {
                            cost_center: cc.clone(),
                            amount: row.amount,
                            percentage: row.percentage,
                        })
                    })
                    .collect();
                if splits.is_empty() {
                    return Err(ValidationError::EmptySplit);
                }
                if enforce_totals {
                    if let Some(mismatch) = self.totals_mismatch() {
                        return Err(ValidationError::TotalsMismatch(mismatch));
                    }
                }
                Ok(ClassifyRequest {
                    transaction_name: self.transaction_name.clone(),
                    vendor: self.vendor.clone(),
                    expense_account,
                    cost_center: None,
                    cost_center_splits: Some(splits),
                    notes,
                })
            }
        }
    }
}
