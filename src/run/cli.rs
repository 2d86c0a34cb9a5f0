use anyhow::{Context, Result};

use crate::budget::{self, recent_window, AggregatedView, BudgetStore, Ledger};
use crate::config::Config;
use crate::db::{Database, DocKey};
use crate::models::{BudgetDraft, TransactionDraft};
use crate::ui::util::{format_amount, format_date, format_percent, format_spending};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    match args[1].as_str() {
        "summary" | "s" => cli_summary(db, config),
        "add" => cli_add(&args[2..], db),
        "budget" => cli_budget(&args[2..], db),
        "recent" => cli_recent(&args[2..], db, config),
        "export" => cli_export(&args[2..], db),
        "reset" => cli_reset(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetpie {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("BudgetPie: monthly category budgets and spending tracker");
    println!();
    println!("Usage: budgetpie [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Launch interactive TUI");
    println!("  summary                         Print balance, totals and per-category spending");
    println!("  add <date> <amount> <category> <name...>");
    println!("                                  Record a transaction (date as YYYY-MM-DD)");
    println!("  budget <Category=amount>...     Set the monthly budget for every category");
    println!("  recent [n]                      Show the n most recent transactions");
    println!("  export [path]                   Export all transactions to CSV");
    println!("  reset --yes                     Delete all budgets and transactions");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Categories: Groceries, Rent, Gas, Entertainment, Flex-Spending");
}

/// Turns a rejected input into a readable CLI error.
fn user_error(err: budget::Error) -> anyhow::Error {
    match err {
        budget::Error::Validation(v) => anyhow::anyhow!("{v}"),
        e => anyhow::Error::new(e),
    }
}

fn cli_summary(db: &mut Database, config: &Config) -> Result<()> {
    let budgets = BudgetStore::load(&*db)?;
    let ledger = Ledger::load(&*db)?;
    let view = AggregatedView::compute(ledger.entries(), budgets.budgets(), config.monthly_income);

    println!("BudgetPie summary");
    println!("{}", "─".repeat(60));
    println!("  Balance:      {}", format_amount(view.balance));
    println!("  Income:       {}", format_amount(view.monthly_income));
    println!("  Spent:        {}", format_spending(view.totals.total_spent));
    println!("  Budget:       {}", format_amount(view.totals.total_budget));
    println!("  Remaining:    {}", format_amount(view.total_remaining()));
    println!("  Total Txns:   {}", ledger.len());
    if let Some(stamp) = db.updated_at(DocKey::Transactions)? {
        println!("  Last entry:   {stamp}");
    }

    if !budgets.is_set() {
        println!();
        println!("No budgets set yet. Use `budgetpie budget Groceries=200 Rent=1000 ...`");
    }

    println!();
    println!(
        "  {:<16} {:>12} {:>12} {:>12} {:>6}",
        "Category", "Budget", "Spent", "Remaining", "Share"
    );
    for s in &view.categories {
        println!(
            "  {:<16} {:>12} {:>12} {:>12} {:>6}{}",
            s.category.as_str(),
            format_amount(s.budget),
            format_amount(s.spent),
            format_amount(s.remaining),
            format_percent(s.share),
            if s.is_over() { "  over" } else { "" },
        );
    }

    Ok(())
}

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    if args.len() < 4 {
        anyhow::bail!("Usage: budgetpie add <date> <amount> <category> <name...>");
    }

    let draft = TransactionDraft::new(&args[0], &args[1], args[3..].join(" "), &args[2]);
    let mut ledger = Ledger::load(&*db)?;
    let txn = ledger.append(db, &draft).map_err(user_error)?;

    println!(
        "Added {} at {} ({}) on {}",
        format_spending(txn.amount),
        txn.name,
        txn.category,
        format_date(txn.date)
    );
    Ok(())
}

fn cli_budget(args: &[String], db: &mut Database) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!(
            "Usage: budgetpie budget Groceries=200 Rent=1000 Gas=100 Entertainment=50 Flex-Spending=150"
        );
    }

    let draft = BudgetDraft::from_assignments(args.iter().map(String::as_str));
    let mut store = BudgetStore::load(&*db)?;
    let saved = store.save(db, &draft).map_err(user_error)?;

    for (category, amount) in saved.iter() {
        println!("  {:<16} {:>12}", category.as_str(), format_amount(amount));
    }
    println!(
        "Budgets saved for {} categories: {} per month",
        saved.len(),
        format_amount(saved.total())
    );
    Ok(())
}

fn cli_recent(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let n = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid count: {raw} (expected a number >= 1)"))?,
        None => config.recent_window,
    };

    let ledger = Ledger::load(&*db)?;
    let window = recent_window(ledger.entries(), n);
    if window.is_empty() {
        println!("No transactions yet");
        return Ok(());
    }

    for txn in window {
        println!(
            "{:<20} {:<28} {:<16} {:>12}",
            format_date(txn.date),
            txn.name,
            txn.category.as_str(),
            format_spending(txn.amount)
        );
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/budgetpie-export.csv")
        });

    let ledger = Ledger::load(&*db)?;
    let count = export_to_csv(&ledger, &output_path)?;
    if count == 0 {
        println!("No transactions to export");
    } else {
        println!("Exported {count} transactions to {output_path}");
    }
    Ok(())
}

/// Writes the ledger in append order. Returns how many rows were written.
pub(crate) fn export_to_csv(ledger: &Ledger, path: &str) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create export file: {path}"))?;
    wtr.write_record(["Date", "Name", "Category", "Amount"])?;
    for txn in ledger.entries() {
        wtr.write_record([
            txn.date.format("%Y-%m-%d").to_string(),
            txn.name.clone(),
            txn.category.as_str().to_string(),
            txn.amount.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(ledger.len())
}

fn cli_reset(args: &[String], db: &mut Database) -> Result<()> {
    if !args.iter().any(|a| a == "--yes") {
        anyhow::bail!("This deletes all budgets and transactions. Re-run with: budgetpie reset --yes");
    }
    budget::reset_all(db)?;
    println!("All budgets and transactions deleted");
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
