use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;

use super::app::{first_of_month, App, InputMode, PendingAction, Screen};
use crate::budget;
use crate::db::Database;
use crate::models::{BudgetDraft, TransactionDraft};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit BudgetPie", cmd_quit, r);
    register_command!("quit", "Quit BudgetPie", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "add",
        "Add transaction (e.g. :add 2024-03-05 45.50 Groceries Trader Joe's)",
        cmd_add,
        r
    );
    register_command!(
        "a",
        "Open the add form, or add directly like :add",
        cmd_add,
        r
    );
    register_command!("setup", "Edit monthly budgets", cmd_setup, r);
    register_command!(
        "budget",
        "Set all budgets (e.g. :budget Groceries=200 Rent=1000 ...)",
        cmd_budget,
        r
    );
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "recent",
        "Set how many recent transactions to show (e.g. :recent 10)",
        cmd_recent,
        r
    );
    register_command!("reset", "Delete all budgets and transactions", cmd_reset, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        // Try fuzzy match
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

pub(crate) fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| (levenshtein(input, k), **k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.open_screen(Screen::Dashboard);
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.open_screen(Screen::Transactions);
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_setup(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.open_screen(Screen::Setup);
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.open_screen(Screen::Add);
        return Ok(());
    }

    let mut rest = args.trim_start();
    let mut head = Vec::with_capacity(3);
    while head.len() < 3 {
        let Some((word, tail)) = rest.split_once(char::is_whitespace) else {
            break;
        };
        head.push(word);
        rest = tail.trim_start();
    }
    let name = rest.trim();
    let [date, amount, category] = head[..] else {
        app.set_status("Usage: :add <date> <amount> <category> <name>");
        return Ok(());
    };
    if name.is_empty() {
        app.set_status("Usage: :add <date> <amount> <category> <name>");
        return Ok(());
    }

    let draft = TransactionDraft::new(date, amount, name, category);
    if let Err(e) = app.record_transaction(db, &draft) {
        report(app, "Transaction", e);
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(
            "Usage: :budget <Category=amount>... Example: :budget Groceries=200 Rent=1000 Gas=100 Entertainment=50 Flex-Spending=150",
        );
        return Ok(());
    }

    let draft = BudgetDraft::from_assignments(args.split_whitespace());
    if let Err(e) = app.apply_budgets(db, &draft) {
        report(app, "Budgets", e);
    }
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        // No args → back to the current month
        app.set_month(chrono::Local::now().date_naive());
        return Ok(());
    }

    // Accept formats like "2024-01", "2024-1", "01", "1"
    let month = if args.len() <= 2 {
        let year = app.current_month.format("%Y").to_string();
        format!("{year}-{args:0>2}")
    } else {
        args.to_string()
    };

    match NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d") {
        Ok(date) => app.set_month(first_of_month(date)),
        Err(_) => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2024-01)"),
    }

    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(1);
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.shift_month(-1);
    Ok(())
}

fn cmd_recent(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    match args.parse::<usize>() {
        Ok(n) if n > 0 => {
            app.recent_limit = n;
            app.set_status(format!("Showing the {n} most recent transactions"));
        }
        _ => app.set_status("Usage: :recent <n> where n is at least 1"),
    }
    Ok(())
}

fn cmd_reset(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.confirm_message = "Delete ALL budgets and transactions?".into();
    app.pending_action = Some(PendingAction::ResetAll);
    app.input_mode = InputMode::Confirm;
    Ok(())
}

/// Puts a rejected command's error on the status line.
fn report(app: &mut App, what: &str, err: budget::Error) {
    match err {
        budget::Error::Validation(v) => app.set_status(v.to_string()),
        e => app.set_status(format!("{what} not saved: {e}")),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
