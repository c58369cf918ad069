use std::collections::HashSet;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::models::{FilterCriteria, TransactionSummary};

/// Delay between the last keystroke in the keyword filter and the reload it
/// triggers. Other filter changes reload immediately.
pub const KEYWORD_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Description,
    CardMember,
    Amount,
    Status,
}

impl SortField {
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Date => "Date",
            SortField::Description => "Description",
            SortField::CardMember => "Card Member",
            SortField::Amount => "Amount",
            SortField::Status => "Status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Which secondary panel is visible. A strict function of selection
/// cardinality, recomputed on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Hidden,
    Detail,
    Bulk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// Request succeeded with zero rows. Not an error.
    Empty,
    Failed,
}

/// Authoritative in-memory state for the transaction list: the page-scoped
/// collection, sort descriptor, and selection set. Rendering is derived from
/// this state one-way; nothing is ever read back out of rendered output.
pub struct Workspace {
    transactions: Vec<TransactionSummary>,
    pub filters: FilterCriteria,
    sort: Option<SortSpec>,
    selection: HashSet<String>,
    generation: u64,
    load_state: LoadState,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            filters: FilterCriteria::default(),
            sort: None,
            selection: HashSet::new(),
            generation: 0,
            load_state: LoadState::Loading,
        }
    }

    /// Start a load. Returns the generation tag the caller must hand back to
    /// `apply_load`/`load_failed`; a response carrying a stale tag is
    /// discarded so it can never overwrite a newer filter's result.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.load_state = LoadState::Loading;
        self.generation
    }

    /// Replace the collection with a load result. Returns false when the
    /// result is stale and was discarded. Selection is pruned to names still
    /// present, and the persisted sort descriptor is reapplied.
    pub fn apply_load(&mut self, generation: u64, rows: Vec<TransactionSummary>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.transactions = rows;
        let present: HashSet<&str> = self.transactions.iter().map(|t| t.name.as_str()).collect();
        self.selection.retain(|name| present.contains(name.as_str()));
        if let Some(spec) = self.sort {
            Self::sort_rows(&mut self.transactions, spec);
        }
        self.load_state = if self.transactions.is_empty() {
            LoadState::Empty
        } else {
            LoadState::Ready
        };
        true
    }

    /// Record a failed load. The loading indicator must clear even on error.
    pub fn load_failed(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.load_state = LoadState::Failed;
        true
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn rows(&self) -> &[TransactionSummary] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sort by a field: clicking the active column reverses order, a new
    /// column resets to ascending.
    pub fn sort_by(&mut self, field: SortField) {
        let spec = match self.sort {
            Some(current) if current.field == field => SortSpec {
                field,
                order: current.order.flipped(),
            },
            _ => SortSpec {
                field,
                order: SortOrder::Asc,
            },
        };
        self.sort = Some(spec);
        Self::sort_rows(&mut self.transactions, spec);
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    fn sort_rows(rows: &mut [TransactionSummary], spec: SortSpec) {
        rows.sort_by(|a, b| {
            let ord = match spec.field {
                SortField::Amount => a.amount.cmp(&b.amount),
                SortField::Date => a.transaction_date.cmp(&b.transaction_date),
                SortField::Description => a
                    .description
                    .to_lowercase()
                    .cmp(&b.description.to_lowercase()),
                SortField::CardMember => a
                    .card_member
                    .to_lowercase()
                    .cmp(&b.card_member.to_lowercase()),
                SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            };
            match spec.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    /// Exact decimal sum of amounts still awaiting approval/posting.
    pub fn pending_total(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.status.counts_toward_pending())
            .map(|t| t.amount)
            .sum()
    }

    pub fn toggle_selected(&mut self, name: &str) {
        if !self.selection.remove(name) {
            self.selection.insert(name.to_string());
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selection.contains(name)
    }

    pub fn set_all_selected(&mut self, on: bool) {
        if on {
            self.selection = self.transactions.iter().map(|t| t.name.clone()).collect();
        } else {
            self.selection.clear();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Selected names in list order.
    pub fn selected_names(&self) -> Vec<String> {
        self.transactions
            .iter()
            .filter(|t| self.selection.contains(&t.name))
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn sole_selection(&self) -> Option<&str> {
        if self.selection.len() == 1 {
            self.selection.iter().next().map(|s| s.as_str())
        } else {
            None
        }
    }

    pub fn panel(&self) -> Panel {
        match self.selection.len() {
            0 => Panel::Hidden,
            1 => Panel::Detail,
            _ => Panel::Bulk,
        }
    }
}

/// Single-shot reset-on-keystroke timer for the keyword filter.
pub struct Debounce {
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Each keystroke resets (never accumulates) the timer.
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + KEYWORD_DEBOUNCE);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True exactly once, when the window has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::Status;

    fn txn(name: &str, cents: i64, status: Status, date: &str) -> TransactionSummary {
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

    fn loaded(rows: Vec<TransactionSummary>) -> Workspace {
        let mut ws = Workspace::new();
        let gen = ws.begin_load();
        assert!(ws.apply_load(gen, rows));
        ws
    }

    fn amounts(ws: &Workspace) -> Vec<Decimal> {
        ws.rows().iter().map(|t| t.amount).collect()
    }

    #[test]
    fn test_sort_amount_asc_then_toggle_desc() {
        let mut ws = loaded(vec![
            txn("a", -500, Status::Pending, "2025-01-01"),
            txn("b", 1000, Status::Pending, "2025-01-02"),
            txn("c", 0, Status::Pending, "2025-01-03"),
        ]);

        ws.sort_by(SortField::Amount);
        assert_eq!(
            amounts(&ws),
            vec![Decimal::new(-500, 2), Decimal::new(0, 2), Decimal::new(1000, 2)]
        );

        ws.sort_by(SortField::Amount);
        assert_eq!(
            amounts(&ws),
            vec![Decimal::new(1000, 2), Decimal::new(0, 2), Decimal::new(-500, 2)]
        );
    }

    #[test]
    fn test_sort_new_column_resets_to_ascending() {
        let mut ws = loaded(vec![
            txn("a", 100, Status::Pending, "2025-02-01"),
            txn("b", 200, Status::Pending, "2025-01-01"),
        ]);

        ws.sort_by(SortField::Amount);
        ws.sort_by(SortField::Amount); // now descending
        ws.sort_by(SortField::Date);
        let spec = ws.sort().unwrap();
        assert_eq!(spec.field, SortField::Date);
        assert_eq!(spec.order, SortOrder::Asc);
        assert_eq!(ws.rows()[0].name, "b");
    }

    #[test]
    fn test_sort_text_is_case_insensitive() {
        let mut rows = vec![
            txn("a", 100, Status::Pending, "2025-01-01"),
            txn("b", 200, Status::Pending, "2025-01-01"),
        ];
        rows[0].card_member = "smith".to_string();
        rows[1].card_member = "ADAMS".to_string();
        let mut ws = loaded(rows);

        ws.sort_by(SortField::CardMember);
        assert_eq!(ws.rows()[0].card_member, "ADAMS");
    }

    #[test]
    fn test_pending_total_is_order_independent() {
        let rows = vec![
            txn("a", 1000, Status::Pending, "2025-01-01"),
            txn("b", 500, Status::Classified, "2025-01-02"),
            txn("c", 10000, Status::Approved, "2025-01-03"),
            txn("d", 5000, Status::Posted, "2025-01-04"),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let ws = loaded(rows);
        let ws_rev = loaded(reversed);
        assert_eq!(ws.pending_total(), Decimal::new(1500, 2));
        assert_eq!(ws_rev.pending_total(), Decimal::new(1500, 2));
    }

    #[test]
    fn test_panel_follows_selection_cardinality() {
        let mut ws = loaded(vec![
            txn("a", 100, Status::Pending, "2025-01-01"),
            txn("b", 200, Status::Pending, "2025-01-02"),
            txn("c", 300, Status::Pending, "2025-01-03"),
        ]);

        assert_eq!(ws.panel(), Panel::Hidden);

        ws.toggle_selected("a");
        assert_eq!(ws.panel(), Panel::Detail);
        assert_eq!(ws.sole_selection(), Some("a"));

        ws.toggle_selected("b");
        assert_eq!(ws.panel(), Panel::Bulk);
        assert_eq!(ws.sole_selection(), None);

        ws.toggle_selected("a");
        assert_eq!(ws.panel(), Panel::Detail);

        ws.toggle_selected("b");
        assert_eq!(ws.panel(), Panel::Hidden);
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut ws = loaded(vec![
            txn("a", 100, Status::Pending, "2025-01-01"),
            txn("b", 200, Status::Pending, "2025-01-02"),
        ]);

        ws.set_all_selected(true);
        assert_eq!(ws.selection_len(), 2);
        assert_eq!(ws.panel(), Panel::Bulk);

        ws.set_all_selected(false);
        assert_eq!(ws.selection_len(), 0);
        assert_eq!(ws.panel(), Panel::Hidden);
    }

    #[test]
    fn test_selected_names_in_list_order() {
        let mut ws = loaded(vec![
            txn("a", 100, Status::Pending, "2025-01-01"),
            txn("b", 200, Status::Pending, "2025-01-02"),
            txn("c", 300, Status::Pending, "2025-01-03"),
        ]);
        ws.toggle_selected("c");
        ws.toggle_selected("a");
        assert_eq!(ws.selected_names(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_stale_load_response_is_discarded() {
        let mut ws = Workspace::new();
        let first = ws.begin_load();
        let second = ws.begin_load();

        // The superseded response arrives late and must not win.
        assert!(!ws.apply_load(first, vec![txn("stale", 100, Status::Pending, "2025-01-01")]));
        assert!(ws.rows().is_empty());
        assert_eq!(ws.load_state(), LoadState::Loading);

        assert!(ws.apply_load(second, vec![txn("fresh", 200, Status::Pending, "2025-01-02")]));
        assert_eq!(ws.rows().len(), 1);
        assert_eq!(ws.rows()[0].name, "fresh");
        assert_eq!(ws.load_state(), LoadState::Ready);
    }

    #[test]
    fn test_stale_failure_is_discarded_too() {
        let mut ws = Workspace::new();
        let first = ws.begin_load();
        let second = ws.begin_load();
        assert!(!ws.load_failed(first));
        assert!(ws.apply_load(second, vec![]));
        assert_eq!(ws.load_state(), LoadState::Empty);
    }

    #[test]
    fn test_reload_prunes_selection_and_reapplies_sort() {
        let mut ws = loaded(vec![
            txn("a", 300, Status::Pending, "2025-01-01"),
            txn("b", 100, Status::Pending, "2025-01-02"),
        ]);
        ws.sort_by(SortField::Amount);
        ws.toggle_selected("a");
        ws.toggle_selected("b");

        // "a" was posted server-side and drops out of the pending page.
        let gen = ws.begin_load();
        assert!(ws.apply_load(
            gen,
            vec![
                txn("b", 100, Status::Pending, "2025-01-02"),
                txn("c", 50, Status::Pending, "2025-01-03"),
            ],
        ));
        assert_eq!(ws.selected_names(), vec!["b".to_string()]);
        // Sort descriptor persisted across the reload.
        assert_eq!(ws.rows()[0].name, "c");
    }

    #[test]
    fn test_empty_result_is_distinct_from_failure() {
        let mut ws = Workspace::new();
        let gen = ws.begin_load();
        assert_eq!(ws.load_state(), LoadState::Loading);
        assert!(ws.apply_load(gen, vec![]));
        assert_eq!(ws.load_state(), LoadState::Empty);

        let gen = ws.begin_load();
        assert!(ws.load_failed(gen));
        assert_eq!(ws.load_state(), LoadState::Failed);
    }

    #[test]
    fn test_debounce_is_single_shot_and_resets() {
        let mut d = Debounce::new();
        let t0 = Instant::now();
        assert!(!d.fire(t0));

        d.poke(t0);
        assert!(!d.fire(t0 + Duration::from_millis(100)));

        // A second keystroke resets the window rather than accumulating.
        d.poke(t0 + Duration::from_millis(400));
        assert!(!d.fire(t0 + Duration::from_millis(600)));
        assert!(d.fire(t0 + Duration::from_millis(900)));

        // Single-shot: it does not fire again.
        assert!(!d.fire(t0 + Duration::from_millis(2000)));
    }
}
