use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::budget::{
    self, parse_amount, recent_window, AggregatedView, BudgetEvent, BudgetStore, Field,
    FieldProblem, Ledger, RecentWindow,
};
use crate::config::Config;
use crate::db::Database;
use crate::models::*;
use crate::ui::util::{format_amount, format_month, format_spending};

/// How long the "added" confirmation stays on screen.
pub(crate) const FLASH_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Add,
    Transactions,
    Setup,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Add, Self::Transactions, Self::Setup]
    }

    /// Screens whose content is a form taking typed input.
    pub(crate) fn is_form(&self) -> bool {
        matches!(self, Self::Add | Self::Setup)
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Add => write!(f, "Add"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Setup => write!(f, "Budgets"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    ResetAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FormField {
    #[default]
    Date,
    Amount,
    Name,
    Category,
}

impl FormField {
    pub(crate) fn all() -> &'static [FormField] {
        &[Self::Date, Self::Amount, Self::Name, Self::Category]
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Amount => "Amount",
            Self::Name => "Name",
            Self::Category => "Category",
        }
    }

    fn as_field(&self) -> Field {
        match self {
            Self::Date => Field::Date,
            Self::Amount => Field::Amount,
            Self::Name => Field::Name,
            Self::Category => Field::Category,
        }
    }

    fn step(&self, delta: i32) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|f| f == self).unwrap_or(0) as i32;
        let len = all.len() as i32;
        all[((idx + delta).rem_euclid(len)) as usize]
    }
}

/// The add-transaction form.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionForm {
    pub(crate) date: String,
    pub(crate) amount: String,
    pub(crate) name: String,
    pub(crate) category: Option<Category>,
    pub(crate) focus: FormField,
    /// Fields flagged by the last rejected submission.
    pub(crate) invalid: Vec<Field>,
}

impl TransactionForm {
    pub(crate) fn draft(&self) -> TransactionDraft {
        TransactionDraft::new(
            self.date.clone(),
            self.amount.clone(),
            self.name.clone(),
            self.category.map(|c| c.as_str()).unwrap_or_default(),
        )
    }

    pub(crate) fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Date => &self.date,
            FormField::Amount => &self.amount,
            FormField::Name => &self.name,
            FormField::Category => self.category.map(|c| c.as_str()).unwrap_or(""),
        }
    }

    pub(crate) fn is_invalid(&self, field: FormField) -> bool {
        let f = field.as_field();
        self.invalid.contains(&f)
    }

    /// The focused text input, or `None` when the category selector has focus.
    fn input_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Date => Some(&mut self.date),
            FormField::Amount => Some(&mut self.amount),
            FormField::Name => Some(&mut self.name),
            FormField::Category => None,
        }
    }

    pub(crate) fn push_char(&mut self, c: char) {
        if let Some(input) = self.input_mut() {
            input.push(c);
        } else if let Some(category) = Category::all()
            .iter()
            .find(|cat| cat.as_str().to_lowercase().starts_with(c.to_ascii_lowercase()))
        {
            self.category = Some(*category);
        }
    }

    pub(crate) fn pop_char(&mut self) {
        if let Some(input) = self.input_mut() {
            input.pop();
        } else {
            self.category = None;
        }
    }

    pub(crate) fn cycle_category(&mut self, delta: i32) {
        let all = Category::all();
        let len = all.len() as i32;
        let next = match self.category {
            Some(c) => (c.index() as i32 + delta).rem_euclid(len),
            None if delta >= 0 => 0,
            None => len - 1,
        };
        self.category = Some(all[next as usize]);
    }

    pub(crate) fn focus_next(&mut self) {
        self.focus = self.focus.step(1);
    }

    pub(crate) fn focus_prev(&mut self) {
        self.focus = self.focus.step(-1);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The budget setup form: one amount input per category.
#[derive(Debug, Clone)]
pub(crate) struct SetupForm {
    pub(crate) amounts: Vec<String>,
    pub(crate) focus: usize,
    pub(crate) invalid: Vec<Category>,
}

impl SetupForm {
    /// Pre-fills inputs from saved budgets, blank when unset.
    pub(crate) fn from_budgets(budgets: Option<&CategoryBudget>) -> Self {
        let amounts = Category::all()
            .iter()
            .map(|c| budgets.map(|b| b.get(*c).to_string()).unwrap_or_default())
            .collect();
        Self {
            amounts,
            focus: 0,
            invalid: Vec::new(),
        }
    }

    pub(crate) fn draft(&self) -> BudgetDraft {
        Category::all()
            .iter()
            .zip(&self.amounts)
            .fold(BudgetDraft::new(), |d, (c, amount)| d.with(c.as_str(), amount.clone()))
    }

    /// Running total of the inputs a save would accept; blank or bad inputs
    /// count as zero.
    pub(crate) fn total(&self) -> Decimal {
        Category::all()
            .iter()
            .zip(&self.amounts)
            .filter_map(|(c, a)| parse_amount(a, Field::Budget(*c)).ok())
            .sum()
    }

    pub(crate) fn push_char(&mut self, c: char) {
        if let Some(input) = self.amounts.get_mut(self.focus) {
            input.push(c);
        }
    }

    pub(crate) fn pop_char(&mut self) {
        if let Some(input) = self.amounts.get_mut(self.focus) {
            input.pop();
        }
    }

    pub(crate) fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.amounts.len().max(1);
    }

    pub(crate) fn focus_prev(&mut self) {
        let len = self.amounts.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }
}

/// A short-lived confirmation banner.
#[derive(Debug, Clone)]
pub(crate) struct Flash {
    pub(crate) message: String,
    pub(crate) shown_at: Instant,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) flash: Option<Flash>,
    pub(crate) show_help: bool,
    /// First day of the month shown in the header and Transactions screen.
    pub(crate) current_month: NaiveDate,

    pub(crate) monthly_income: Decimal,
    pub(crate) recent_limit: usize,

    // Core state
    pub(crate) budgets: BudgetStore,
    pub(crate) ledger: Ledger,
    budget_events: Receiver<BudgetEvent>,
    pub(crate) view: AggregatedView,

    // Forms
    pub(crate) form: TransactionForm,
    pub(crate) setup: SetupForm,

    // Transactions
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    /// Loads budgets and ledger. Starts on the setup screen when no budgets
    /// were saved yet.
    pub(crate) fn new(db: &Database, config: &Config, today: NaiveDate) -> budget::Result<Self> {
        let mut budgets = BudgetStore::load(db)?;
        let budget_events = budgets.subscribe();
        let ledger = Ledger::load(db)?;
        let setup = SetupForm::from_budgets(budgets.budgets());
        let needs_setup = !budgets.is_set();

        let mut app = Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            flash: None,
            show_help: false,
            current_month: first_of_month(today),

            monthly_income: config.monthly_income,
            recent_limit: config.recent_window,

            budgets,
            ledger,
            budget_events,
            view: AggregatedView::default(),

            form: TransactionForm::default(),
            setup,

            transaction_index: 0,
            transaction_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        };
        app.refresh_view();
        if needs_setup {
            app.open_screen(Screen::Setup);
            app.set_status("Welcome! Set a monthly budget for each category to start tracking");
        }
        Ok(app)
    }

    pub(crate) fn refresh_view(&mut self) {
        self.view = AggregatedView::compute(
            self.ledger.entries(),
            self.budgets.budgets(),
            self.monthly_income,
        );
    }

    /// Applies budget notifications. Returns whether anything changed.
    pub(crate) fn poll_budget_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(BudgetEvent::Saved(budgets)) = self.budget_events.try_recv() {
            self.setup = SetupForm::from_budgets(Some(&budgets));
            changed = true;
        }
        if changed {
            self.refresh_view();
        }
        changed
    }

    pub(crate) fn recent(&self) -> RecentWindow<'_> {
        recent_window(self.ledger.entries(), self.recent_limit)
    }

    /// Ledger entries dated in the displayed month, newest entry first.
    pub(crate) fn month_transactions(&self) -> Vec<&Transaction> {
        let key = self.month_key();
        let mut txns: Vec<&Transaction> = self.ledger.in_month(&key).collect();
        txns.reverse();
        txns
    }

    pub(crate) fn month_key(&self) -> String {
        self.current_month.format("%Y-%m").to_string()
    }

    pub(crate) fn open_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.input_mode = if screen.is_form() {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
        if screen == Screen::Setup {
            self.setup = SetupForm::from_budgets(self.budgets.budgets());
        }
        if screen == Screen::Transactions {
            self.transaction_index = 0;
            self.transaction_scroll = 0;
        }
    }

    pub(crate) fn submit_transaction(&mut self, db: &mut Database) {
        let draft = self.form.draft();
        match self.record_transaction(db, &draft) {
            Ok(()) => self.form.clear(),
            Err(budget::Error::Validation(v)) => {
                self.form.invalid = v.problems.iter().filter_map(|p| p.field()).collect();
                if v.problems.iter().any(|p| matches!(p, FieldProblem::UnknownCategory(_))) {
                    self.form.invalid.push(Field::Category);
                }
                self.set_status(v.to_string());
            }
            Err(e) => self.set_status(format!("Transaction not saved: {e}")),
        }
    }

    /// Appends to the ledger and refreshes the dashboard. Leaves the status
    /// line to the caller on error.
    pub(crate) fn record_transaction(
        &mut self,
        db: &mut Database,
        draft: &TransactionDraft,
    ) -> budget::Result<()> {
        let txn = self.ledger.append(db, draft)?;
        self.refresh_view();
        self.show_flash("Transaction added successfully!");
        self.set_status(format!(
            "Added {} at {} ({})",
            format_spending(txn.amount),
            txn.name,
            txn.category
        ));
        Ok(())
    }

    pub(crate) fn submit_budgets(&mut self, db: &mut Database) {
        let draft = self.setup.draft();
        match self.apply_budgets(db, &draft) {
            Ok(()) => {}
            Err(budget::Error::Validation(v)) => {
                self.setup.invalid = v
                    .problems
                    .iter()
                    .filter_map(|p| match p.field() {
                        Some(Field::Budget(c)) => Some(c),
                        _ => None,
                    })
                    .collect();
                self.set_status("Please enter valid amounts for all categories");
            }
            Err(e) => self.set_status(format!("Budgets not saved: {e}")),
        }
    }

    /// Saves budgets and returns to the dashboard.
    pub(crate) fn apply_budgets(
        &mut self,
        db: &mut Database,
        draft: &BudgetDraft,
    ) -> budget::Result<()> {
        let saved = self.budgets.save(db, draft)?;
        self.poll_budget_events();
        self.open_screen(Screen::Dashboard);
        self.show_flash("Budgets saved!");
        self.set_status(format!(
            "Budgets saved: {} per month",
            format_amount(saved.total())
        ));
        Ok(())
    }

    /// Deletes all saved data and goes back to first-run setup.
    pub(crate) fn reset(&mut self, db: &mut Database) {
        let reloaded = budget::reset_all(db)
            .and_then(|_| Ok((BudgetStore::load(&*db)?, Ledger::load(&*db)?)));
        match reloaded {
            Ok((mut budgets, ledger)) => {
                self.budget_events = budgets.subscribe();
                self.budgets = budgets;
                self.ledger = ledger;
                self.form.clear();
                self.refresh_view();
                self.open_screen(Screen::Setup);
                self.set_status("All data cleared. Set your budgets to start again");
            }
            Err(e) => self.set_status(format!("Reset failed: {e}")),
        }
    }

    pub(crate) fn shift_month(&mut self, delta: i32) {
        let months = Months::new(delta.unsigned_abs());
        let next = if delta >= 0 {
            self.current_month.checked_add_months(months)
        } else {
            self.current_month.checked_sub_months(months)
        };
        if let Some(m) = next {
            self.set_month(m);
        }
    }

    pub(crate) fn set_month(&mut self, month: NaiveDate) {
        self.current_month = first_of_month(month);
        self.transaction_index = 0;
        self.transaction_scroll = 0;
        self.set_status(format!(
            "Month: {}",
            format_month(self.current_month)
        ));
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn show_flash(&mut self, msg: impl Into<String>) {
        self.flash = Some(Flash {
            message: msg.into(),
            shown_at: Instant::now(),
        });
    }

    /// Expires the flash banner once it has been up for [`FLASH_DURATION`].
    pub(crate) fn tick(&mut self, now: Instant) {
        if self
            .flash
            .as_ref()
            .is_some_and(|f| now.duration_since(f.shown_at) >= FLASH_DURATION)
        {
            self.flash = None;
        }
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
