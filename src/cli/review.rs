use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};

use crate::allocation::{AllocationMode, ClassifyForm, SplitRow, ValidationError};
use crate::api::ReviewApi;
use crate::error::Result;
use crate::fmt::{money, percent};
use crate::lifecycle::{self, available_actions, Action};
use crate::models::{
    BulkClassifyRequest, NamedOption, Suggestion, TransactionDetail, VendorRequest,
};
use crate::settings::load_settings;
use crate::tui::{money_span, wrap_text, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE, WARN_STYLE};
use crate::workspace::{Debounce, LoadState, Panel, SortField, SortOrder, Workspace};

/// Incremental fuzzy picker over a list of named options, shared by every
/// vendor/account/cost-center prompt in the workspace.
struct Picker {
    query: String,
    selection: usize,
}

enum PickerEvent {
    Pending,
    Chosen(usize),
    /// Enter with an empty query: the caller decides whether that means
    /// "keep the prefilled value" or "this field is required".
    Empty,
    /// Enter on a query with no matches. Vendor pickers treat this as a
    /// quick-create; everything else stays put.
    Unmatched,
    Cancelled,
}

impl Picker {
    fn new() -> Self {
        Self {
            query: String::new(),
            selection: 0,
        }
    }

    fn matches<'a>(&self, options: &'a [NamedOption]) -> Vec<(usize, &'a str)> {
        let q = self.query.to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        options
            .iter()
            .enumerate()
            .filter(|(_, o)| {
                o.label().to_lowercase().contains(&q) || o.name.to_lowercase().contains(&q)
            })
            .map(|(i, o)| (i, o.label()))
            .take(9)
            .collect()
    }

    fn handle_key(&mut self, code: KeyCode, options: &[NamedOption]) -> PickerEvent {
        match code {
            KeyCode::Char(c) => {
                self.query.push(c);
                self.selection = 0;
                PickerEvent::Pending
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.selection = 0;
                PickerEvent::Pending
            }
            KeyCode::Up => {
                self.selection = self.selection.saturating_sub(1);
                PickerEvent::Pending
            }
            KeyCode::Down => {
                let count = self.matches(options).len();
                if count > 0 {
                    self.selection = (self.selection + 1).min(count - 1);
                }
                PickerEvent::Pending
            }
            KeyCode::Enter => {
                let matched = self.matches(options);
                if let Some(&(idx, _)) = matched.get(self.selection.min(matched.len().saturating_sub(1))) {
                    PickerEvent::Chosen(idx)
                } else if self.query.is_empty() {
                    PickerEvent::Empty
                } else {
                    PickerEvent::Unmatched
                }
            }
            KeyCode::Esc => PickerEvent::Cancelled,
            _ => PickerEvent::Pending,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SplitCol {
    CostCenter,
    Amount,
    Percentage,
}

impl SplitCol {
    fn next(self) -> Self {
        match self {
            SplitCol::CostCenter => SplitCol::Amount,
            SplitCol::Amount => SplitCol::Percentage,
            SplitCol::Percentage => SplitCol::CostCenter,
        }
    }

    fn prev(self) -> Self {
        match self {
            SplitCol::CostCenter => SplitCol::Percentage,
            SplitCol::Amount => SplitCol::CostCenter,
            SplitCol::Percentage => SplitCol::Amount,
        }
    }
}

enum ClassifyStep {
    Vendor(Picker),
    Account(Picker),
    Allocation { split: bool },
    CostCenter(Picker),
    Splits { row: usize, col: SplitCol },
    SplitPick { row: usize, picker: Picker },
    SplitEdit { row: usize, col: SplitCol, input: String },
    Notes,
}

enum BulkStep {
    Vendor(Picker),
    Account(Picker),
    CostCenter(Picker),
    Notes,
}

#[derive(Clone, Copy)]
enum DateField {
    From,
    To,
}

enum Mode {
    Browse,
    Keyword,
    FilterMenu { selection: usize },
    PickBatch(Picker),
    PickMember(Picker),
    DateInput { which: DateField, input: String },
    Classify(ClassifyStep),
    Bulk(BulkStep),
    ConfirmBulkPost,
}

const FILTER_MENU_ITEMS: &[&str] = &["Batch", "Card member", "From date", "To date", "Clear filters"];

#[derive(Default)]
struct BulkDraft {
    vendor: Option<String>,
    expense_account: Option<String>,
    cost_center: Option<String>,
    notes: String,
}

pub enum ControllerAction {
    Continue,
    Close,
}

pub struct ReviewController<'a> {
    api: &'a dyn ReviewApi,
    workspace: Workspace,
    cursor: usize,
    table_state: TableState,
    batch_options: Vec<NamedOption>,
    member_options: Vec<NamedOption>,
    suppliers: Vec<NamedOption>,
    accounts: Vec<NamedOption>,
    cost_centers: Vec<NamedOption>,
    detail: Option<TransactionDetail>,
    suggestion: Option<Suggestion>,
    form: Option<ClassifyForm>,
    bulk: BulkDraft,
    mode: Mode,
    status_message: Option<String>,
    debounce: Debounce,
    enforce_split_totals: bool,
}

impl<'a> ReviewController<'a> {
    pub fn new(api: &'a dyn ReviewApi, enforce_split_totals: bool) -> Result<Self> {
        let options = api.get_filter_options()?;
        let batch_options = options
            .batches
            .iter()
            .map(|b| NamedOption {
                name: b.name.clone(),
                display_name: format!("{} ({})", b.name, b.import_date),
            })
            .collect();
        let member_options = options
            .card_members
            .iter()
            .map(|m| NamedOption {
                name: m.clone(),
                display_name: m.clone(),
            })
            .collect();
        let suppliers = api.get_supplier_list()?;
        let accounts = api.get_account_list("Expense")?;
        let cost_centers = api.get_cost_center_list()?;

        let mut controller = Self {
            api,
            workspace: Workspace::new(),
            cursor: 0,
            table_state: TableState::default(),
            batch_options,
            member_options,
            suppliers,
            accounts,
            cost_centers,
            detail: None,
            suggestion: None,
            form: None,
            bulk: BulkDraft::default(),
            mode: Mode::Browse,
            status_message: None,
            debounce: Debounce::new(),
            enforce_split_totals,
        };
        controller.reload();
        Ok(controller)
    }

    fn reload(&mut self) {
        let generation = self.workspace.begin_load();
        match self.api.get_pending_transactions(&self.workspace.filters) {
            Ok(rows) => {
                if self.workspace.apply_load(generation, rows) {
                    self.cursor = self.cursor.min(self.workspace.len().saturating_sub(1));
                    self.sync_detail();
                }
            }
            Err(e) => {
                if self.workspace.load_failed(generation) {
                    self.status_message = Some(format!("Load failed: {e}"));
                }
            }
        }
    }

    /// Keep the detail panel in step with the selection: fetch on a new sole
    /// selection, drop it when the panel hides.
    fn sync_detail(&mut self) {
        let target = self.workspace.sole_selection().map(|s| s.to_string());
        match target {
            Some(name) => {
                if self.detail.as_ref().map(|d| d.name.as_str()) != Some(name.as_str()) {
                    self.fetch_detail(&name);
                }
            }
            None => {
                self.detail = None;
                self.suggestion = None;
                self.form = None;
            }
        }
    }

    fn fetch_detail(&mut self, name: &str) {
        match self.api.get_transaction_details(name) {
            Ok(bundle) => {
                self.detail = Some(bundle.transaction);
                self.suggestion = bundle.suggestion;
            }
            Err(e) => {
                self.detail = None;
                self.suggestion = None;
                self.status_message = Some(format!("Detail load failed: {e}"));
            }
        }
    }

    /// Force a refetch so action visibility derives from the current status.
    fn refresh_detail(&mut self) {
        self.detail = None;
        self.sync_detail();
    }

    /// Fires the keyword debounce. Called from the event loop on every poll
    /// timeout.
    pub fn tick(&mut self, now: Instant) {
        if self.debounce.fire(now) {
            self.reload();
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> ControllerAction {
        self.status_message = None;

        match &self.mode {
            Mode::Browse => return self.handle_browse_key(code),
            Mode::Keyword => self.handle_keyword_key(code),
            Mode::FilterMenu { .. } => self.handle_filter_menu_key(code),
            Mode::PickBatch(_) | Mode::PickMember(_) => self.handle_filter_picker_key(code),
            Mode::DateInput { .. } => self.handle_date_key(code),
            Mode::Classify(_) => self.handle_classify_key(code),
            Mode::Bulk(_) => self.handle_bulk_key(code),
            Mode::ConfirmBulkPost => self.handle_confirm_key(code),
        }
        ControllerAction::Continue
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> ControllerAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ControllerAction::Close,
            KeyCode::Down => {
                if self.cursor + 1 < self.workspace.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') => {
                if let Some(name) = self.cursor_name() {
                    self.workspace.toggle_selected(&name);
                    self.sync_detail();
                }
            }
            KeyCode::Enter => {
                if let Some(name) = self.cursor_name() {
                    self.workspace.clear_selection();
                    self.workspace.toggle_selected(&name);
                    self.sync_detail();
                }
            }
            KeyCode::Char('a') => {
                let all = self.workspace.selection_len() == self.workspace.len()
                    && !self.workspace.is_empty();
                self.workspace.set_all_selected(!all);
                self.sync_detail();
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('/') => self.mode = Mode::Keyword,
            KeyCode::Char('f') => self.mode = Mode::FilterMenu { selection: 0 },
            KeyCode::Char('1') => self.workspace.sort_by(SortField::Date),
            KeyCode::Char('2') => self.workspace.sort_by(SortField::Description),
            KeyCode::Char('3') => self.workspace.sort_by(SortField::CardMember),
            KeyCode::Char('4') => self.workspace.sort_by(SortField::Amount),
            KeyCode::Char('5') => self.workspace.sort_by(SortField::Status),
            KeyCode::Char('c') => self.begin_classify(),
            KeyCode::Char('v') => self.approve_current(),
            KeyCode::Char('p') => self.post_current(),
            KeyCode::Char('x') => self.duplicate_current(),
            KeyCode::Char('b') => self.begin_bulk_classify(),
            KeyCode::Char('P') => {
                if self.workspace.panel() == Panel::Bulk {
                    self.mode = Mode::ConfirmBulkPost;
                } else {
                    self.status_message =
                        Some("Select two or more transactions to bulk post".to_string());
                }
            }
            _ => {}
        }
        ControllerAction::Continue
    }

    fn cursor_name(&self) -> Option<String> {
        self.workspace.rows().get(self.cursor).map(|t| t.name.clone())
    }

    fn handle_keyword_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                self.workspace
                    .filters
                    .keyword
                    .get_or_insert_with(String::new)
                    .push(c);
                self.debounce.poke(Instant::now());
            }
            KeyCode::Backspace => {
                let emptied = match self.workspace.filters.keyword.as_mut() {
                    Some(kw) => {
                        kw.pop();
                        kw.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.workspace.filters.keyword = None;
                }
                self.debounce.poke(Instant::now());
            }
            KeyCode::Enter => {
                self.debounce.cancel();
                self.mode = Mode::Browse;
                self.reload();
            }
            KeyCode::Esc => {
                self.workspace.filters.keyword = None;
                self.debounce.cancel();
                self.mode = Mode::Browse;
                self.reload();
            }
            _ => {}
        }
    }

    fn handle_filter_menu_key(&mut self, code: KeyCode) {
        let Mode::FilterMenu { selection } = std::mem::replace(&mut self.mode, Mode::Browse)
        else {
            return;
        };
        match code {
            KeyCode::Up => {
                self.mode = Mode::FilterMenu {
                    selection: selection.saturating_sub(1),
                };
            }
            KeyCode::Down => {
                self.mode = Mode::FilterMenu {
                    selection: (selection + 1).min(FILTER_MENU_ITEMS.len() - 1),
                };
            }
            KeyCode::Enter => match selection {
                0 => {
                    if self.batch_options.is_empty() {
                        self.status_message = Some("No import batches available".to_string());
                        self.mode = Mode::FilterMenu { selection };
                    } else {
                        self.mode = Mode::PickBatch(Picker::new());
                    }
                }
                1 => {
                    if self.member_options.is_empty() {
                        self.status_message = Some("No card members available".to_string());
                        self.mode = Mode::FilterMenu { selection };
                    } else {
                        self.mode = Mode::PickMember(Picker::new());
                    }
                }
                2 => {
                    let input = self
                        .workspace
                        .filters
                        .from_date
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    self.mode = Mode::DateInput {
                        which: DateField::From,
                        input,
                    };
                }
                3 => {
                    let input = self
                        .workspace
                        .filters
                        .to_date
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    self.mode = Mode::DateInput {
                        which: DateField::To,
                        input,
                    };
                }
                _ => {
                    self.workspace.filters = Default::default();
                    self.reload();
                }
            },
            KeyCode::Esc => {}
            _ => self.mode = Mode::FilterMenu { selection },
        }
    }

    fn handle_filter_picker_key(&mut self, code: KeyCode) {
        let mode = std::mem::replace(&mut self.mode, Mode::Browse);
        match mode {
            Mode::PickBatch(mut picker) => match picker.handle_key(code, &self.batch_options) {
                PickerEvent::Chosen(i) => {
                    self.workspace.filters.batch_id = Some(self.batch_options[i].name.clone());
                    self.reload();
                }
                PickerEvent::Empty => {
                    self.workspace.filters.batch_id = None;
                    self.reload();
                }
                PickerEvent::Cancelled => {}
                PickerEvent::Pending | PickerEvent::Unmatched => {
                    self.mode = Mode::PickBatch(picker)
                }
            },
            Mode::PickMember(mut picker) => match picker.handle_key(code, &self.member_options) {
                PickerEvent::Chosen(i) => {
                    self.workspace.filters.card_member =
                        Some(self.member_options[i].name.clone());
                    self.reload();
                }
                PickerEvent::Empty => {
                    self.workspace.filters.card_member = None;
                    self.reload();
                }
                PickerEvent::Cancelled => {}
                PickerEvent::Pending | PickerEvent::Unmatched => {
                    self.mode = Mode::PickMember(picker)
                }
            },
            other => self.mode = other,
        }
    }

    fn handle_date_key(&mut self, code: KeyCode) {
        let Mode::DateInput { which, mut input } =
            std::mem::replace(&mut self.mode, Mode::Browse)
        else {
            return;
        };
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                input.push(c);
                self.mode = Mode::DateInput { which, input };
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::DateInput { which, input };
            }
            KeyCode::Enter => {
                let trimmed = input.trim();
                let parsed = if trimmed.is_empty() {
                    Ok(None)
                } else {
                    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(Some)
                };
                match parsed {
                    Ok(date) => {
                        match which {
                            DateField::From => self.workspace.filters.from_date = date,
                            DateField::To => self.workspace.filters.to_date = date,
                        }
                        self.reload();
                    }
                    Err(_) => {
                        self.status_message =
                            Some(format!("Invalid date '{trimmed}' (expected YYYY-MM-DD)"));
                        self.mode = Mode::DateInput { which, input };
                    }
                }
            }
            KeyCode::Esc => {}
            _ => self.mode = Mode::DateInput { which, input },
        }
    }

    fn begin_classify(&mut self) {
        let Some(detail) = &self.detail else {
            self.status_message = Some("Select one transaction to classify".to_string());
            return;
        };
        if !available_actions(detail.status).contains(&Action::Classify) {
            self.status_message = Some(format!("Cannot classify in status {}", detail.status));
            return;
        }
        self.form = Some(ClassifyForm::for_transaction(detail, self.suggestion.as_ref()));
        self.mode = Mode::Classify(ClassifyStep::Vendor(Picker::new()));
    }

    fn cancel_classify(&mut self) {
        self.form = None;
        self.mode = Mode::Browse;
        self.status_message = Some("Classification cancelled".to_string());
    }

    fn handle_classify_key(&mut self, code: KeyCode) {
        let Mode::Classify(step) = std::mem::replace(&mut self.mode, Mode::Browse) else {
            return;
        };
        match step {
            ClassifyStep::Vendor(mut picker) => match picker.handle_key(code, &self.suppliers) {
                PickerEvent::Chosen(i) => {
                    if let Some(form) = self.form.as_mut() {
                        form.vendor = Some(self.suppliers[i].name.clone());
                    }
                    self.mode = Mode::Classify(ClassifyStep::Account(Picker::new()));
                }
                PickerEvent::Empty => {
                    // Vendor is optional; an empty Enter keeps the prefill.
                    self.mode = Mode::Classify(ClassifyStep::Account(Picker::new()));
                }
                PickerEvent::Unmatched => match self.quick_create_vendor(&picker.query) {
                    Some(supplier) => {
                        if let Some(form) = self.form.as_mut() {
                            form.vendor = Some(supplier);
                        }
                        self.mode = Mode::Classify(ClassifyStep::Account(Picker::new()));
                    }
                    None => self.mode = Mode::Classify(ClassifyStep::Vendor(picker)),
                },
                PickerEvent::Cancelled => self.cancel_classify(),
                PickerEvent::Pending => self.mode = Mode::Classify(ClassifyStep::Vendor(picker)),
            },
            ClassifyStep::Account(mut picker) => match picker.handle_key(code, &self.accounts) {
                PickerEvent::Chosen(i) => {
                    if let Some(form) = self.form.as_mut() {
                        form.expense_account = Some(self.accounts[i].name.clone());
                    }
                    let split = self
                        .form
                        .as_ref()
                        .map(|f| f.mode == AllocationMode::Split)
                        .unwrap_or(false);
                    self.mode = Mode::Classify(ClassifyStep::Allocation { split });
                }
                PickerEvent::Empty => {
                    if self.form.as_ref().and_then(|f| f.expense_account.as_ref()).is_some() {
                        let split = self
                            .form
                            .as_ref()
                            .map(|f| f.mode == AllocationMode::Split)
                            .unwrap_or(false);
                        self.mode = Mode::Classify(ClassifyStep::Allocation { split });
                    } else {
                        self.status_message =
                            Some("Select an expense account before classifying".to_string());
                        self.mode = Mode::Classify(ClassifyStep::Account(picker));
                    }
                }
                PickerEvent::Cancelled => self.cancel_classify(),
                PickerEvent::Pending | PickerEvent::Unmatched => {
                    self.mode = Mode::Classify(ClassifyStep::Account(picker))
                }
            },
            ClassifyStep::Allocation { split } => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    self.mode = Mode::Classify(ClassifyStep::Allocation { split: !split });
                }
                KeyCode::Enter => {
                    if split {
                        if let Some(form) = self.form.as_mut() {
                            form.set_mode(AllocationMode::Split);
                        }
                        self.mode = Mode::Classify(ClassifyStep::Splits {
                            row: 0,
                            col: SplitCol::CostCenter,
                        });
                    } else {
                        if let Some(form) = self.form.as_mut() {
                            form.set_mode(AllocationMode::Single);
                        }
                        self.mode = Mode::Classify(ClassifyStep::CostCenter(Picker::new()));
                    }
                }
                KeyCode::Esc => self.cancel_classify(),
                _ => self.mode = Mode::Classify(ClassifyStep::Allocation { split }),
            },
            ClassifyStep::CostCenter(mut picker) => {
                match picker.handle_key(code, &self.cost_centers) {
                    PickerEvent::Chosen(i) => {
                        if let Some(form) = self.form.as_mut() {
                            form.cost_center = Some(self.cost_centers[i].name.clone());
                        }
                        self.mode = Mode::Classify(ClassifyStep::Notes);
                    }
                    PickerEvent::Empty => {
                        if self.form.as_ref().and_then(|f| f.cost_center.as_ref()).is_some() {
                            self.mode = Mode::Classify(ClassifyStep::Notes);
                        } else {
                            self.status_message = Some("Select a cost center".to_string());
                            self.mode = Mode::Classify(ClassifyStep::CostCenter(picker));
                        }
                    }
                    PickerEvent::Cancelled => self.cancel_classify(),
                    PickerEvent::Pending | PickerEvent::Unmatched => {
                        self.mode = Mode::Classify(ClassifyStep::CostCenter(picker))
                    }
                }
            }
            ClassifyStep::Splits { mut row, mut col } => {
                let row_count = self.form.as_ref().map(|f| f.splits.len()).unwrap_or(0);
                match code {
                    KeyCode::Up => row = row.saturating_sub(1),
                    KeyCode::Down => {
                        if row + 1 < row_count {
                            row += 1;
                        }
                    }
                    KeyCode::Left => col = col.prev(),
                    KeyCode::Right | KeyCode::Tab => col = col.next(),
                    KeyCode::Char('a') => {
                        if let Some(form) = self.form.as_mut() {
                            form.add_split();
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Some(form) = self.form.as_mut() {
                            form.remove_split(row);
                            row = row.min(form.splits.len().saturating_sub(1));
                        }
                    }
                    KeyCode::Enter => {
                        if row < row_count {
                            match col {
                                SplitCol::CostCenter => {
                                    self.mode = Mode::Classify(ClassifyStep::SplitPick {
                                        row,
                                        picker: Picker::new(),
                                    });
                                    return;
                                }
                                SplitCol::Amount | SplitCol::Percentage => {
                                    let input = self
                                        .form
                                        .as_ref()
                                        .and_then(|f| f.splits.get(row))
                                        .map(|s| cell_value(s, col))
                                        .unwrap_or_default();
                                    self.mode =
                                        Mode::Classify(ClassifyStep::SplitEdit { row, col, input });
                                    return;
                                }
                            }
                        }
                    }
                    KeyCode::Char('n') => {
                        self.mode = Mode::Classify(ClassifyStep::Notes);
                        return;
                    }
                    KeyCode::Esc => {
                        self.mode = Mode::Classify(ClassifyStep::Allocation { split: true });
                        return;
                    }
                    _ => {}
                }
                self.mode = Mode::Classify(ClassifyStep::Splits { row, col });
            }
            ClassifyStep::SplitPick { row, mut picker } => {
                match picker.handle_key(code, &self.cost_centers) {
                    PickerEvent::Chosen(i) => {
                        if let Some(split) = self.form.as_mut().and_then(|f| f.splits.get_mut(row))
                        {
                            split.cost_center = Some(self.cost_centers[i].name.clone());
                        }
                        self.mode = Mode::Classify(ClassifyStep::Splits {
                            row,
                            col: SplitCol::CostCenter,
                        });
                    }
                    PickerEvent::Empty | PickerEvent::Cancelled => {
                        self.mode = Mode::Classify(ClassifyStep::Splits {
                            row,
                            col: SplitCol::CostCenter,
                        });
                    }
                    PickerEvent::Pending | PickerEvent::Unmatched => {
                        self.mode = Mode::Classify(ClassifyStep::SplitPick { row, picker })
                    }
                }
            }
            ClassifyStep::SplitEdit { row, col, mut input } => match code {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => {
                    input.push(c);
                    self.mode = Mode::Classify(ClassifyStep::SplitEdit { row, col, input });
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.mode = Mode::Classify(ClassifyStep::SplitEdit { row, col, input });
                }
                KeyCode::Enter => {
                    let trimmed = input.trim();
                    let parsed = if trimmed.is_empty() {
                        Ok(None)
                    } else {
                        trimmed.parse::<rust_decimal::Decimal>().map(Some)
                    };
                    match parsed {
                        Ok(value) => {
                            if let Some(split) =
                                self.form.as_mut().and_then(|f| f.splits.get_mut(row))
                            {
                                match col {
                                    SplitCol::Amount => split.amount = value,
                                    SplitCol::Percentage => split.percentage = value,
                                    SplitCol::CostCenter => {}
                                }
                            }
                            self.mode = Mode::Classify(ClassifyStep::Splits { row, col });
                        }
                        Err(_) => {
                            self.status_message = Some(format!("Invalid number '{trimmed}'"));
                            self.mode = Mode::Classify(ClassifyStep::SplitEdit { row, col, input });
                        }
                    }
                }
                KeyCode::Esc => {
                    self.mode = Mode::Classify(ClassifyStep::Splits { row, col });
                }
                _ => self.mode = Mode::Classify(ClassifyStep::SplitEdit { row, col, input }),
            },
            ClassifyStep::Notes => match code {
                KeyCode::Char(c) => {
                    if let Some(form) = self.form.as_mut() {
                        form.notes.push(c);
                    }
                    self.mode = Mode::Classify(ClassifyStep::Notes);
                }
                KeyCode::Backspace => {
                    if let Some(form) = self.form.as_mut() {
                        form.notes.pop();
                    }
                    self.mode = Mode::Classify(ClassifyStep::Notes);
                }
                KeyCode::Enter => self.submit_classify(),
                KeyCode::Esc => self.cancel_classify(),
                _ => self.mode = Mode::Classify(ClassifyStep::Notes),
            },
        }
    }

    /// Validate locally; a validation failure never issues a network call
    /// and returns the user to the offending step.
    fn submit_classify(&mut self) {
        let Some(form) = self.form.as_ref() else {
            self.mode = Mode::Browse;
            return;
        };
        match form.validate(self.enforce_split_totals) {
            Err(error) => {
                self.status_message = Some(error.to_string());
                self.mode = Mode::Classify(match error {
                    ValidationError::MissingExpenseAccount => {
                        ClassifyStep::Account(Picker::new())
                    }
                    ValidationError::MissingCostCenter => ClassifyStep::CostCenter(Picker::new()),
                    ValidationError::EmptySplit | ValidationError::TotalsMismatch(_) => {
                        ClassifyStep::Splits {
                            row: 0,
                            col: SplitCol::CostCenter,
                        }
                    }
                });
            }
            Ok(request) => match self.api.classify_transaction(&request) {
                Ok(outcome) => {
                    self.status_message = Some(format!(
                        "Classified {} (status: {})",
                        request.transaction_name, outcome.status
                    ));
                    self.form = None;
                    self.mode = Mode::Browse;
                    self.reload();
                    self.refresh_detail();
                }
                Err(e) => {
                    self.status_message = Some(format!("Classify failed: {e}"));
                    self.form = None;
                    self.mode = Mode::Browse;
                }
            },
        }
    }

    fn approve_current(&mut self) {
        let Some(name) = self.action_target(Action::Approve) else {
            return;
        };
        match self.api.approve_transaction(&name) {
            Ok(outcome) => {
                self.status_message =
                    Some(format!("Approved {name} (status: {})", outcome.status));
                self.reload();
                self.refresh_detail();
            }
            Err(e) => self.status_message = Some(format!("Approve failed: {e}")),
        }
    }

    fn post_current(&mut self) {
        let Some(name) = self.action_target(Action::Post) else {
            return;
        };
        match self.api.post_transaction(&name) {
            Ok(outcome) => {
                self.status_message =
                    Some(format!("Posted {name} to journal entry {}", outcome.journal_entry));
                self.reload();
                self.refresh_detail();
            }
            Err(e) => self.status_message = Some(format!("Post failed: {e}")),
        }
    }

    fn duplicate_current(&mut self) {
        let Some(name) = self.action_target(Action::MarkDuplicate) else {
            return;
        };
        match self.api.mark_as_duplicate(&name) {
            Ok(_) => {
                self.status_message = Some(format!("Marked {name} as duplicate"));
                self.workspace.clear_selection();
                self.reload();
                self.sync_detail();
            }
            Err(e) => self.status_message = Some(format!("Mark duplicate failed: {e}")),
        }
    }

    /// The sole-selected transaction's name, provided the action is legal
    /// for its freshly loaded status.
    fn action_target(&mut self, action: Action) -> Option<String> {
        let Some(detail) = &self.detail else {
            self.status_message = Some("Select one transaction first".to_string());
            return None;
        };
        if !available_actions(detail.status).contains(&action) {
            self.status_message = Some(format!(
                "Cannot {} in status {}",
                action.label(),
                detail.status
            ));
            return None;
        }
        Some(detail.name.clone())
    }

    /// Create a supplier from a picker query that matched nothing, so an
    /// unknown vendor never forces the user out of the wizard. Returns the
    /// new supplier name, which is also appended to the picker list.
    fn quick_create_vendor(&mut self, query: &str) -> Option<String> {
        let vendor_name = query.trim().to_string();
        let request = VendorRequest {
            vendor_name: vendor_name.clone(),
            supplier_group: None,
            country: None,
        };
        match self.api.create_vendor_quick(&request) {
            Ok(created) => {
                self.suppliers.push(NamedOption {
                    name: created.supplier.clone(),
                    display_name: vendor_name,
                });
                self.status_message = Some(format!("Created vendor {}", created.supplier));
                Some(created.supplier)
            }
            Err(e) => {
                self.status_message = Some(format!("Vendor creation failed: {e}"));
                None
            }
        }
    }

    fn begin_bulk_classify(&mut self) {
        if self.workspace.panel() != Panel::Bulk {
            self.status_message =
                Some("Select two or more transactions to bulk classify".to_string());
            return;
        }
        self.bulk = BulkDraft::default();
        self.mode = Mode::Bulk(BulkStep::Vendor(Picker::new()));
    }

    fn handle_bulk_key(&mut self, code: KeyCode) {
        let Mode::Bulk(step) = std::mem::replace(&mut self.mode, Mode::Browse) else {
            return;
        };
        match step {
            BulkStep::Vendor(mut picker) => match picker.handle_key(code, &self.suppliers) {
                PickerEvent::Chosen(i) => {
                    self.bulk.vendor = Some(self.suppliers[i].name.clone());
                    self.mode = Mode::Bulk(BulkStep::Account(Picker::new()));
                }
                PickerEvent::Empty => self.mode = Mode::Bulk(BulkStep::Account(Picker::new())),
                PickerEvent::Unmatched => match self.quick_create_vendor(&picker.query) {
                    Some(supplier) => {
                        self.bulk.vendor = Some(supplier);
                        self.mode = Mode::Bulk(BulkStep::Account(Picker::new()));
                    }
                    None => self.mode = Mode::Bulk(BulkStep::Vendor(picker)),
                },
                PickerEvent::Cancelled => self.status_message = Some("Bulk classify cancelled".to_string()),
                PickerEvent::Pending => self.mode = Mode::Bulk(BulkStep::Vendor(picker)),
            },
            BulkStep::Account(mut picker) => match picker.handle_key(code, &self.accounts) {
                PickerEvent::Chosen(i) => {
                    self.bulk.expense_account = Some(self.accounts[i].name.clone());
                    self.mode = Mode::Bulk(BulkStep::CostCenter(Picker::new()));
                }
                PickerEvent::Empty => {
                    self.status_message =
                        Some("Select an expense account before classifying".to_string());
                    self.mode = Mode::Bulk(BulkStep::Account(picker));
                }
                PickerEvent::Cancelled => self.status_message = Some("Bulk classify cancelled".to_string()),
                PickerEvent::Pending | PickerEvent::Unmatched => {
                    self.mode = Mode::Bulk(BulkStep::Account(picker))
                }
            },
            BulkStep::CostCenter(mut picker) => match picker.handle_key(code, &self.cost_centers) {
                PickerEvent::Chosen(i) => {
                    self.bulk.cost_center = Some(self.cost_centers[i].name.clone());
                    self.mode = Mode::Bulk(BulkStep::Notes);
                }
                PickerEvent::Empty => {
                    self.status_message = Some("Select a cost center".to_string());
                    self.mode = Mode::Bulk(BulkStep::CostCenter(picker));
                }
                PickerEvent::Cancelled => self.status_message = Some("Bulk classify cancelled".to_string()),
                PickerEvent::Pending | PickerEvent::Unmatched => {
                    self.mode = Mode::Bulk(BulkStep::CostCenter(picker))
                }
            },
            BulkStep::Notes => match code {
                KeyCode::Char(c) => {
                    self.bulk.notes.push(c);
                    self.mode = Mode::Bulk(BulkStep::Notes);
                }
                KeyCode::Backspace => {
                    self.bulk.notes.pop();
                    self.mode = Mode::Bulk(BulkStep::Notes);
                }
                KeyCode::Enter => self.submit_bulk_classify(),
                KeyCode::Esc => self.status_message = Some("Bulk classify cancelled".to_string()),
                _ => self.mode = Mode::Bulk(BulkStep::Notes),
            },
        }
    }

    fn submit_bulk_classify(&mut self) {
        let (Some(expense_account), Some(cost_center)) = (
            self.bulk.expense_account.clone(),
            self.bulk.cost_center.clone(),
        ) else {
            self.status_message =
                Some("Bulk classify needs an expense account and a cost center".to_string());
            self.mode = Mode::Bulk(BulkStep::Account(Picker::new()));
            return;
        };
        let notes = if self.bulk.notes.trim().is_empty() {
            None
        } else {
            Some(self.bulk.notes.trim().to_string())
        };
        let request = BulkClassifyRequest {
            transaction_names: self.workspace.selected_names(),
            vendor: self.bulk.vendor.clone(),
            expense_account,
            cost_center,
            notes,
        };
        match self.api.bulk_classify_transactions(&request) {
            Ok(outcome) => {
                self.status_message = Some(lifecycle::bulk_classify_summary(&outcome));
                self.workspace.clear_selection();
                self.mode = Mode::Browse;
                self.reload();
            }
            Err(e) => {
                self.status_message = Some(format!("Bulk classify failed: {e}"));
                self.mode = Mode::Browse;
            }
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.execute_bulk_post(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.status_message = Some("Bulk post cancelled".to_string());
            }
            _ => {}
        }
    }

    /// The selection is cleared only once the response arrives, and the list
    /// is refreshed even on partial failure since some items may have
    /// succeeded.
    fn execute_bulk_post(&mut self) {
        let names = self.workspace.selected_names();
        match self.api.bulk_approve_and_post(&names) {
            Ok(outcome) => {
                self.status_message = Some(lifecycle::bulk_post_summary(&outcome));
                self.workspace.clear_selection();
                self.reload();
                self.sync_detail();
            }
            Err(e) => self.status_message = Some(format!("Bulk post failed: {e}")),
        }
        self.mode = Mode::Browse;
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let panel_height = self.panel_height();
        let areas = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(panel_height),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        frame.render_widget(
            Paragraph::new("Corporate Card Review").style(HEADER_STYLE),
            areas[0],
        );
        self.draw_table(frame, areas[1]);
        self.draw_panel(frame, areas[2]);
        self.draw_status(frame, areas[3]);
        self.draw_keys(frame, areas[4]);
    }

    fn panel_height(&self) -> u16 {
        match &self.mode {
            Mode::Classify(ClassifyStep::Splits { .. })
            | Mode::Classify(ClassifyStep::SplitEdit { .. }) => {
                let rows = self.form.as_ref().map(|f| f.splits.len()).unwrap_or(0) as u16;
                4 + rows.min(8)
            }
            Mode::Classify(_) | Mode::Bulk(_) | Mode::PickBatch(_) | Mode::PickMember(_) => 11,
            Mode::FilterMenu { .. } => 2 + FILTER_MENU_ITEMS.len() as u16,
            Mode::ConfirmBulkPost | Mode::DateInput { .. } => 3,
            Mode::Browse | Mode::Keyword => match self.workspace.panel() {
                Panel::Hidden => 0,
                Panel::Detail => 11,
                Panel::Bulk => 3,
            },
        }
    }

    fn draw_table(&mut self, frame: &mut Frame, area: ratatui::layout::Rect) {
        if self.workspace.is_empty() {
            let text = match self.workspace.load_state() {
                LoadState::Loading => "Loading transactions...",
                LoadState::Empty => "No transactions match the current filters.",
                LoadState::Failed => "Load failed. Press r to retry.",
                LoadState::Ready => "",
            };
            frame.render_widget(Paragraph::new(text).style(FOOTER_STYLE), area);
            return;
        }

        let columns = [
            SortField::Date,
            SortField::Description,
            SortField::CardMember,
            SortField::Amount,
            SortField::Status,
        ];
        let header_cells: Vec<String> = std::iter::once(String::new())
            .chain(columns.iter().map(|field| {
                let indicator = match self.workspace.sort() {
                    Some(spec) if spec.field == *field => match spec.order {
                        SortOrder::Asc => " \u{25b2}",
                        SortOrder::Desc => " \u{25bc}",
                    },
                    _ => "",
                };
                format!("{}{indicator}", field.label())
            }))
            .collect();

        let rows: Vec<Row> = self
            .workspace
            .rows()
            .iter()
            .map(|t| {
                let mark = if self.workspace.is_selected(&t.name) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let description = if t.has_suggestion {
                    format!("{} *", t.description)
                } else {
                    t.description.clone()
                };
                Row::new(vec![
                    Cell::from(mark),
                    Cell::from(t.transaction_date.to_string()),
                    Cell::from(description),
                    Cell::from(t.card_member.clone()),
                    Cell::from(money_span(t.amount)),
                    Cell::from(t.status.as_str()),
                ])
            })
            .collect();

        let widths = vec![
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Length(10),
        ];

        self.table_state.select(Some(self.cursor));
        let table = Table::new(rows, widths)
            .header(Row::new(header_cells).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_panel(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        if area.height == 0 {
            return;
        }
        let lines: Vec<Line> = match &self.mode {
            Mode::Classify(step) => self.classify_lines(step),
            Mode::Bulk(step) => self.bulk_lines(step),
            Mode::ConfirmBulkPost => vec![
                Line::from(""),
                Line::from(format!(
                    "  Approve and post {} transaction(s) to journal entries? (y/n)",
                    self.workspace.selection_len()
                )),
            ],
            Mode::FilterMenu { selection } => {
                let mut lines = vec![Line::from(Span::styled("  Filters", HEADER_STYLE))];
                for (i, item) in FILTER_MENU_ITEMS.iter().enumerate() {
                    let marker = if i == *selection { ">" } else { " " };
                    let value = match i {
                        0 => self.workspace.filters.batch_id.clone(),
                        1 => self.workspace.filters.card_member.clone(),
                        2 => self.workspace.filters.from_date.map(|d| d.to_string()),
                        3 => self.workspace.filters.to_date.map(|d| d.to_string()),
                        _ => None,
                    };
                    let value = value.map(|v| format!(" [{v}]")).unwrap_or_default();
                    lines.push(Line::from(format!("  {marker} {item}{value}")));
                }
                lines
            }
            Mode::PickBatch(picker) => picker_lines("Batch", picker, &self.batch_options),
            Mode::PickMember(picker) => picker_lines("Card member", picker, &self.member_options),
            Mode::DateInput { which, input } => {
                let label = match which {
                    DateField::From => "From date",
                    DateField::To => "To date",
                };
                vec![
                    Line::from(""),
                    Line::from(format!("  {label} (YYYY-MM-DD): {input}\u{2588}")),
                ]
            }
            Mode::Browse | Mode::Keyword => match self.workspace.panel() {
                Panel::Detail => self.detail_lines(),
                Panel::Bulk => vec![
                    Line::from(""),
                    Line::from(format!(
                        "  {} transaction(s) selected",
                        self.workspace.selection_len()
                    )),
                ],
                Panel::Hidden => vec![],
            },
        };
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn detail_lines(&self) -> Vec<Line<'static>> {
        let Some(d) = &self.detail else {
            return vec![Line::from(""), Line::from("  Loading detail...")];
        };
        let mut lines = vec![
            Line::from(""),
            Line::from(format!("  Reference:   {}", d.reference)),
        ];
        let (description, _) = wrap_text(&d.description, 64);
        for (i, text) in description.lines().enumerate() {
            let prefix = if i == 0 { "  Description:" } else { "              " };
            lines.push(Line::from(format!("{prefix} {text}")));
        }
        lines.extend([
            Line::from(format!("  Date:        {}", d.transaction_date)),
            Line::from(format!("  Card member: {}", d.card_member)),
            Line::from(vec![Span::raw("  Amount:      "), money_span(d.amount)]),
            Line::from(format!(
                "  Category:    {}",
                d.category.as_deref().unwrap_or("\u{2014}")
            )),
            Line::from(format!("  Status:      {}", d.status)),
        ]);
        if !d.cost_center_splits.is_empty() {
            lines.push(Line::from(format!(
                "  Allocation:  split across {} cost center(s)",
                d.cost_center_splits.len()
            )));
        } else if d.vendor.is_some() || d.expense_account.is_some() || d.cost_center.is_some() {
            lines.push(Line::from(format!(
                "  Classified:  {} / {} / {}",
                d.vendor.as_deref().unwrap_or("\u{2014}"),
                d.expense_account.as_deref().unwrap_or("\u{2014}"),
                d.cost_center.as_deref().unwrap_or("\u{2014}")
            )));
        } else if let Some(s) = &self.suggestion {
            lines.push(Line::from(Span::styled(
                format!(
                    "  Suggestion:  {} / {} / {} ({:.0}%)",
                    s.vendor.as_deref().unwrap_or("\u{2014}"),
                    s.expense_account.as_deref().unwrap_or("\u{2014}"),
                    s.cost_center.as_deref().unwrap_or("\u{2014}"),
                    s.confidence * 100.0
                ),
                WARN_STYLE,
            )));
        }
        let hints: Vec<&str> = available_actions(d.status)
            .iter()
            .map(|a| a.key_hint())
            .collect();
        if !hints.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  {}", hints.join("  ")),
                FOOTER_STYLE,
            )));
        }
        lines
    }

    fn classify_lines(&self, step: &ClassifyStep) -> Vec<Line<'static>> {
        let Some(form) = &self.form else {
            return vec![];
        };
        match step {
            ClassifyStep::Vendor(picker) => picker_lines("Vendor", picker, &self.suppliers),
            ClassifyStep::Account(picker) => {
                picker_lines("Expense account", picker, &self.accounts)
            }
            ClassifyStep::Allocation { split } => {
                let (single_style, split_style) = if *split {
                    (Style::default(), Style::default().fg(Color::White).bg(Color::Blue))
                } else {
                    (Style::default().fg(Color::White).bg(Color::Blue), Style::default())
                };
                vec![
                    Line::from(""),
                    Line::from(vec![
                        Span::raw("  Allocate to  "),
                        Span::styled(" Single cost center ", single_style),
                        Span::raw("  "),
                        Span::styled(" Split ", split_style),
                    ]),
                ]
            }
            ClassifyStep::CostCenter(picker) => {
                picker_lines("Cost center", picker, &self.cost_centers)
            }
            ClassifyStep::Splits { row, col } => self.split_lines(form, *row, *col, None),
            ClassifyStep::SplitPick { picker, .. } => {
                picker_lines("Cost center", picker, &self.cost_centers)
            }
            ClassifyStep::SplitEdit { row, col, input } => {
                self.split_lines(form, *row, *col, Some(input.as_str()))
            }
            ClassifyStep::Notes => vec![
                Line::from(""),
                Line::from(format!("  Notes: {}\u{2588}", form.notes)),
            ],
        }
    }

    fn split_lines(
        &self,
        form: &ClassifyForm,
        sel_row: usize,
        sel_col: SplitCol,
        editing: Option<&str>,
    ) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            format!("  {:<30} {:>12} {:>10}", "Cost Center", "Amount", "%"),
            HEADER_STYLE,
        ))];
        for (i, split) in form.splits.iter().enumerate() {
            let marker = if i == sel_row { ">" } else { " " };
            let cc = split.cost_center.as_deref().unwrap_or("(select)").to_string();
            let amount = match (i == sel_row, sel_col, editing) {
                (true, SplitCol::Amount, Some(input)) => format!("{input}\u{2588}"),
                _ => split.amount.map(money).unwrap_or_default(),
            };
            let pct = match (i == sel_row, sel_col, editing) {
                (true, SplitCol::Percentage, Some(input)) => format!("{input}\u{2588}"),
                _ => split.percentage.map(percent).unwrap_or_default(),
            };
            let line = format!("{marker} {cc:<30} {amount:>12} {pct:>10}");
            if i == sel_row {
                lines.push(Line::from(Span::styled(line, SELECTED_STYLE)));
            } else {
                lines.push(Line::from(line));
            }
        }
        let totals = form.split_totals();
        lines.push(Line::from(format!(
            "  Totals: {} of {} | {}",
            money(totals.amount),
            money(form.transaction_amount),
            percent(totals.percentage)
        )));
        if let Some(mismatch) = form.totals_mismatch() {
            lines.push(Line::from(Span::styled(
                format!("  Warning: {mismatch}"),
                WARN_STYLE,
            )));
        }
        lines
    }

    fn bulk_lines(&self, step: &BulkStep) -> Vec<Line<'static>> {
        match step {
            BulkStep::Vendor(picker) => picker_lines("Vendor", picker, &self.suppliers),
            BulkStep::Account(picker) => picker_lines("Expense account", picker, &self.accounts),
            BulkStep::CostCenter(picker) => {
                picker_lines("Cost center", picker, &self.cost_centers)
            }
            BulkStep::Notes => vec![
                Line::from(""),
                Line::from(format!("  Notes: {}\u{2588}", self.bulk.notes)),
            ],
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let filters = self.workspace.filters.describe();
        let filters = if filters.is_empty() {
            String::new()
        } else {
            format!(" | {filters}")
        };
        let mut status = format!(
            "{} transaction(s) | Pending: {} | {} selected{}",
            self.workspace.len(),
            money(self.workspace.pending_total()),
            self.workspace.selection_len(),
            filters,
        );
        if let Some(ref msg) = self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), area);
    }

    fn draw_keys(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let keys = match &self.mode {
            Mode::Browse => {
                "\u{2191}/\u{2193}:move  Space:select  a:all  Enter:open  c:classify  v:approve  p:post  x:duplicate  b:bulk  P:bulk post  /:keyword  f:filters  1-5:sort  r:refresh  q:quit"
            }
            Mode::Keyword => "Type to filter (applied after a pause), Enter=apply now, Esc=clear",
            Mode::FilterMenu { .. } => "\u{2191}/\u{2193}:move  Enter=edit  Esc=close",
            Mode::PickBatch(_) | Mode::PickMember(_) => {
                "Type to filter, Enter=select (empty clears), Esc=cancel"
            }
            Mode::DateInput { .. } => "Enter=apply (empty clears), Esc=cancel",
            Mode::Classify(ClassifyStep::Vendor(_)) | Mode::Bulk(BulkStep::Vendor(_)) => {
                "Type to filter, Enter=select (no match creates vendor, empty keeps current), Esc=cancel"
            }
            Mode::Classify(ClassifyStep::Allocation { .. }) => {
                "\u{2190}/\u{2192}:toggle  Enter=confirm  Esc=cancel"
            }
            Mode::Classify(ClassifyStep::Splits { .. }) => {
                "\u{2191}/\u{2193}:row  \u{2190}/\u{2192}:column  Enter=edit  a:add  d:delete  n:notes  Esc=back"
            }
            Mode::Classify(ClassifyStep::SplitEdit { .. }) => "Enter=set (empty clears), Esc=cancel",
            Mode::Classify(ClassifyStep::Notes) | Mode::Bulk(BulkStep::Notes) => {
                "Enter=submit, Esc=cancel"
            }
            Mode::Classify(_) | Mode::Bulk(_) => "Type to filter, Enter=select, Esc=cancel",
            Mode::ConfirmBulkPost => "y=post, n=cancel",
        };
        if let Mode::Keyword = self.mode {
            let keyword = self.workspace.filters.keyword.clone().unwrap_or_default();
            frame.render_widget(
                Paragraph::new(format!("Keyword: {keyword}\u{2588}  ({keys})")),
                area,
            );
        } else {
            frame.render_widget(Paragraph::new(keys).style(FOOTER_STYLE), area);
        }
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind,
                    ..
                }) = event::read()?
                {
                    if kind != KeyEventKind::Press {
                        continue;
                    }
                    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                        break;
                    }
                    if let ControllerAction::Close = self.handle_key(code) {
                        break;
                    }
                }
            }
            self.tick(Instant::now());
        }
        Ok(())
    }
}

fn cell_value(split: &SplitRow, col: SplitCol) -> String {
    match col {
        SplitCol::Amount => split.amount.map(|d| d.to_string()).unwrap_or_default(),
        SplitCol::Percentage => split.percentage.map(|d| d.to_string()).unwrap_or_default(),
        SplitCol::CostCenter => String::new(),
    }
}

fn picker_lines(title: &str, picker: &Picker, options: &[NamedOption]) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(format!("  {title}: {}\u{2588}", picker.query))];
    let matched = picker.matches(options);
    if picker.query.is_empty() {
        lines.push(Line::from(Span::styled(
            "    (type to search)".to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    } else if matched.is_empty() {
        lines.push(Line::from(Span::styled(
            "    (no matches)".to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for (i, (_, label)) in matched.iter().enumerate() {
            let marker = if i == picker.selection { ">" } else { " " };
            lines.push(Line::from(format!("  {marker} {label}")));
        }
    }
    lines
}

pub fn run(api: &dyn ReviewApi) -> Result<()> {
    let settings = load_settings();
    let mut controller = ReviewController::new(api, settings.enforce_split_totals)?;

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = controller.event_loop(&mut terminal);
    ratatui::restore();
    result
}
