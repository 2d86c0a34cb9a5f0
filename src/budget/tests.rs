#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::aggregate::{spend_by_category, totals, Totals};
use super::ledger::validate_transaction;
use super::store::validate_budgets;
use super::*;
use crate::db::{Database, DocKey, DocumentStore, StoreError};
use crate::models::{BudgetDraft, Category, Transaction, TransactionDraft, MAX_AMOUNT};

/// A store whose writes (and optionally reads) always fail.
#[derive(Default)]
struct FailingStore {
    docs: HashMap<DocKey, String>,
    fail_reads: bool,
}

impl DocumentStore for FailingStore {
    fn read(&self, key: DocKey) -> std::result::Result<Option<String>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        }
        Ok(self.docs.get(&key).cloned())
    }

    fn write_all(&mut self, _docs: &[(DocKey, String)]) -> std::result::Result<(), StoreError> {
        Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    fn clear(&mut self) -> std::result::Result<(), StoreError> {
        Err(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }
}

fn standard_budgets() -> BudgetDraft {
    BudgetDraft::new()
        .with("Groceries", "200")
        .with("Rent", "1000")
        .with("Gas", "100")
        .with("Entertainment", "50")
        .with("Flex-Spending", "150")
}

fn draft(date: &str, amount: &str, name: &str, category: &str) -> TransactionDraft {
    TransactionDraft::new(date, amount, name, category)
}

fn names(window: RecentWindow<'_>) -> Vec<String> {
    window.iter().map(|t| t.name.clone()).collect()
}

// ── Budget store ──────────────────────────────────────────────

#[test]
fn test_budgets_unset_on_fresh_db() {
    let db = Database::open_in_memory().unwrap();
    let store = BudgetStore::load(&db).unwrap();
    assert!(!store.is_set());
    assert!(store.budgets().is_none());
}

#[test]
fn test_save_budgets_persists_and_sets_flag() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let saved = store.save(&mut db, &standard_budgets()).unwrap();
    assert_eq!(saved.total(), dec!(1500));
    assert_eq!(store.budgets(), Some(&saved));
    assert_eq!(db.read(DocKey::SetupComplete).unwrap().as_deref(), Some("true"));

    let reloaded = BudgetStore::load(&db).unwrap();
    assert_eq!(reloaded.budgets(), Some(&saved));
}

#[test]
fn test_save_negative_rejects_everything() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    store.save(&mut db, &standard_budgets()).unwrap();
    let before = store.budgets().cloned();

    let bad = BudgetDraft::new()
        .with("Groceries", "300")
        .with("Rent", "-5")
        .with("Gas", "100")
        .with("Entertainment", "50")
        .with("Flex-Spending", "150");
    let err = store.save(&mut db, &bad).unwrap_err();
    match err {
        Error::Validation(v) => {
            assert!(v.has(&FieldProblem::Negative(Field::Budget(Category::Rent))));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    assert_eq!(store.budgets().cloned(), before);
    let reloaded = BudgetStore::load(&db).unwrap();
    assert_eq!(reloaded.budgets().cloned(), before);
    assert_eq!(reloaded.budgets().unwrap().get(Category::Groceries), dec!(200));
}

#[test]
fn test_save_rejected_while_unset_stays_unset() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let bad = BudgetDraft::new().with("Groceries", "abc");
    assert!(store.save(&mut db, &bad).is_err());
    assert!(!store.is_set());
    assert!(!BudgetStore::load(&db).unwrap().is_set());
    assert!(db.read(DocKey::SetupComplete).unwrap().is_none());
}

#[test]
fn test_validate_budgets_reports_every_problem() {
    let bad = BudgetDraft::new()
        .with("Groceries", "abc")
        .with("Groceries", "10")
        .with("Utilities", "5")
        .with("Rent", "");
    let err = validate_budgets(&bad).unwrap_err();
    assert!(err.has(&FieldProblem::NotANumber {
        field: Field::Budget(Category::Groceries),
        value: "abc".into()
    }));
    assert!(err.has(&FieldProblem::Duplicate(Field::Budget(Category::Groceries))));
    assert!(err.has(&FieldProblem::UnknownCategory("Utilities".into())));
    assert!(err.has(&FieldProblem::Missing(Field::Budget(Category::Rent))));
    assert!(err.has(&FieldProblem::Missing(Field::Budget(Category::Gas))));
}

#[test]
fn test_zero_budget_is_valid() {
    let zeros = BudgetDraft::from_assignments([
        "Groceries=0",
        "Rent=0",
        "Gas=0",
        "Entertainment=0",
        "Flex-Spending=0",
    ]);
    assert_eq!(validate_budgets(&zeros).unwrap().total(), Decimal::ZERO);
}

#[test]
fn test_save_notifies_subscribers() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let rx = store.subscribe();
    let saved = store.save(&mut db, &standard_budgets()).unwrap();
    assert_eq!(rx.try_recv().unwrap(), BudgetEvent::Saved(saved));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_rejected_save_sends_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let rx = store.subscribe();
    let _ = store.save(&mut db, &BudgetDraft::new());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_dropped_subscriber_is_pruned() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let dropped = store.subscribe();
    let kept = store.subscribe();
    drop(dropped);
    store.save(&mut db, &standard_budgets()).unwrap();
    store.save(&mut db, &standard_budgets()).unwrap();
    assert_eq!(kept.try_iter().count(), 2);
}

#[test]
fn test_save_storage_failure_leaves_memory() {
    let mut failing = FailingStore::default();
    let mut store = BudgetStore::load(&failing).unwrap();
    let rx = store.subscribe();
    let err = store.save(&mut failing, &standard_budgets()).unwrap_err();
    assert!(matches!(err, Error::PersistenceUnavailable(_)));
    assert!(!store.is_set());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_save_oversized_budget_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let huge = "79228162514264337593543950335";
    let bad = BudgetDraft::new()
        .with("Groceries", huge)
        .with("Rent", huge)
        .with("Gas", "100")
        .with("Entertainment", "50")
        .with("Flex-Spending", "150");
    match store.save(&mut db, &bad).unwrap_err() {
        Error::Validation(v) => {
            assert!(v.has(&FieldProblem::TooLarge(Field::Budget(Category::Groceries))));
            assert!(v.has(&FieldProblem::TooLarge(Field::Budget(Category::Rent))));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(!store.is_set());
    assert!(db.read(DocKey::Budgets).unwrap().is_none());
}

#[test]
fn test_budget_at_ceiling_is_valid() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let draft = BudgetDraft::new()
        .with("Groceries", "200")
        .with("Rent", "1,000,000,000,000")
        .with("Gas", "100")
        .with("Entertainment", "50")
        .with("Flex-Spending", "150");
    let saved = store.save(&mut db, &draft).unwrap();
    assert_eq!(saved.get(Category::Rent), MAX_AMOUNT);
    assert_eq!(saved.total(), MAX_AMOUNT + dec!(500));
}

#[test]
fn test_stored_oversized_budget_is_corrupt() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[(DocKey::Budgets, r#"{"Rent":"79228162514264337593543950335"}"#.into())])
        .unwrap();
    assert!(matches!(
        BudgetStore::load(&db).unwrap_err(),
        Error::PersistenceUnavailable(_)
    ));
}

#[test]
fn test_corrupt_budget_document() {
    let mut db = Database::open_in_memory().unwrap();
    db.write_all(&[(DocKey::Budgets, "not json".into())]).unwrap();
    let err = BudgetStore::load(&db).unwrap_err();
    assert!(matches!(err, Error::PersistenceUnavailable(_)));
}

// ── Ledger ────────────────────────────────────────────────────

#[test]
fn test_ledger_empty_on_fresh_db() {
    let db = Database::open_in_memory().unwrap();
    let ledger = Ledger::load(&db).unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn test_append_returns_accepted_transaction() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    let txn = ledger
        .append(&mut db, &draft("2024-03-05", "45.50", "Trader Joe's", "groceries"))
        .unwrap();
    assert_eq!(txn.category, Category::Groceries);
    assert_eq!(txn.amount, dec!(45.50));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.entries()[0], txn);
}

#[test]
fn test_append_unknown_category_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger
        .append(&mut db, &draft("2024-03-01", "10", "Shell", "Gas"))
        .unwrap();
    let err = ledger
        .append(&mut db, &draft("2024-03-02", "10", "Netflix", "Streaming"))
        .unwrap_err();
    match err {
        Error::Validation(v) => assert!(v.has(&FieldProblem::UnknownCategory("Streaming".into()))),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ledger.len(), 1);
    assert_eq!(Ledger::load(&db).unwrap().len(), 1);
}

#[test]
fn test_append_oversized_amount_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    for _ in 0..2 {
        let err = ledger
            .append(&mut db, &draft("2024-03-05", "79228162514264337593543950335", "Yacht", "Gas"))
            .unwrap_err();
        match err {
            Error::Validation(v) => assert!(v.has(&FieldProblem::TooLarge(Field::Amount))),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
    assert!(ledger.is_empty());
    assert!(Ledger::load(&db).unwrap().is_empty());
}

#[test]
fn test_amounts_at_ceiling_still_aggregate() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    for _ in 0..2 {
        ledger
            .append(&mut db, &draft("2024-03-05", "1000000000000", "Big", "Gas"))
            .unwrap();
    }
    let reloaded = Ledger::load(&db).unwrap();
    assert_eq!(
        spend_by_category(reloaded.entries()).get(&Category::Gas),
        Some(&(MAX_AMOUNT * dec!(2)))
    );
    assert_eq!(totals(reloaded.entries(), None).total_spent, MAX_AMOUNT * dec!(2));
}

#[test]
fn test_stored_out_of_range_transaction_is_corrupt() {
    let mut db = Database::open_in_memory().unwrap();
    let doc = r#"[{"date":"2024-03-05","amount":"79228162514264337593543950335","name":"x","category":"Gas"}]"#;
    db.write_all(&[(DocKey::Transactions, doc.into())]).unwrap();
    assert!(matches!(
        Ledger::load(&db).unwrap_err(),
        Error::PersistenceUnavailable(_)
    ));
}

#[test]
fn test_append_reports_every_missing_field() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    let err = ledger.append(&mut db, &TransactionDraft::default()).unwrap_err();
    let Error::Validation(v) = err else {
        panic!("expected validation error");
    };
    assert_eq!(
        v.problems,
        vec![
            FieldProblem::Missing(Field::Date),
            FieldProblem::Missing(Field::Amount),
            FieldProblem::Missing(Field::Name),
            FieldProblem::Missing(Field::Category),
        ]
    );
    assert!(ledger.is_empty());
}

#[test]
fn test_validate_transaction_bad_values() {
    let err = validate_transaction(&draft("2024-02-30", "-3", "x", "Rent")).unwrap_err();
    assert!(err.has(&FieldProblem::InvalidDate("2024-02-30".into())));
    assert!(err.has(&FieldProblem::Negative(Field::Amount)));

    let err = validate_transaction(&draft("2024-02-01", "ten", "x", "Rent")).unwrap_err();
    assert!(err.has(&FieldProblem::NotANumber {
        field: Field::Amount,
        value: "ten".into()
    }));

    let err = validate_transaction(&draft("2024-02-01", "NaN", "x", "Rent")).unwrap_err();
    assert_eq!(err.problems.len(), 1);
}

#[test]
fn test_validate_transaction_tolerates_currency_formatting() {
    let txn = validate_transaction(&draft(" 2024-02-01 ", "$1,250.00", "  Landlord ", "rent")).unwrap();
    assert_eq!(txn.amount, dec!(1250.00));
    assert_eq!(txn.name, "Landlord");
}

#[test]
fn test_append_storage_failure_leaves_memory() {
    let mut failing = FailingStore::default();
    let mut ledger = Ledger::load(&failing).unwrap();
    let err = ledger
        .append(&mut failing, &draft("2024-03-05", "1", "x", "Gas"))
        .unwrap_err();
    assert!(matches!(err, Error::PersistenceUnavailable(_)));
    assert!(ledger.is_empty());
}

#[test]
fn test_load_storage_failure() {
    let failing = FailingStore {
        fail_reads: true,
        ..FailingStore::default()
    };
    assert!(matches!(
        Ledger::load(&failing).unwrap_err(),
        Error::PersistenceUnavailable(_)
    ));
    assert!(matches!(
        BudgetStore::load(&failing).unwrap_err(),
        Error::PersistenceUnavailable(_)
    ));
}

#[test]
fn test_ledger_roundtrip_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let expected = {
        let mut db = Database::open(&path).unwrap();
        let mut ledger = Ledger::load(&db).unwrap();
        // Entry order deliberately differs from date order
        for (date, amount, name, cat) in [
            ("2024-03-20", "12.00", "Cinema", "Entertainment"),
            ("2024-03-01", "1000", "Landlord", "Rent"),
            ("2024-03-15", "38.25", "Shell", "Gas"),
            ("2024-03-01", "0.99", "Gum", "Flex-Spending"),
        ] {
            ledger.append(&mut db, &draft(date, amount, name, cat)).unwrap();
        }
        ledger.entries().to_vec()
    };

    let db = Database::open(&path).unwrap();
    let reloaded = Ledger::load(&db).unwrap();
    assert_eq!(reloaded.entries(), expected.as_slice());
}

#[test]
fn test_in_month_filters_by_date() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger.append(&mut db, &draft("2024-02-28", "1", "a", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-01", "2", "b", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-31", "3", "c", "Gas")).unwrap();
    let march: Vec<&str> = ledger.in_month("2024-03").map(|t| t.name.as_str()).collect();
    assert_eq!(march, vec!["b", "c"]);
}

#[test]
fn test_in_month_outlives_month_key() {
    fn february(ledger: &Ledger) -> Vec<&Transaction> {
        let key = format!("{}-{:02}", 2024, 2);
        ledger.in_month(&key).collect()
    }
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger.append(&mut db, &draft("2024-02-28", "1", "a", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-01", "2", "b", "Gas")).unwrap();
    let found = february(&ledger);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "a");
}

#[test]
fn test_reset_all_clears_both() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    store.save(&mut db, &standard_budgets()).unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger.append(&mut db, &draft("2024-03-05", "1", "x", "Gas")).unwrap();

    reset_all(&mut db).unwrap();
    assert!(!BudgetStore::load(&db).unwrap().is_set());
    assert!(Ledger::load(&db).unwrap().is_empty());
}

#[test]
fn test_reset_all_storage_failure() {
    let mut failing = FailingStore::default();
    assert!(matches!(
        reset_all(&mut failing).unwrap_err(),
        Error::PersistenceUnavailable(_)
    ));
}

// ── Aggregator ────────────────────────────────────────────────

#[test]
fn test_spend_by_category_matches_appends() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    let inputs = [
        ("10.10", "Groceries"),
        ("20.00", "Gas"),
        ("5.05", "Groceries"),
        ("0", "Rent"),
        ("7.50", "Gas"),
    ];
    for (i, (amount, cat)) in inputs.iter().enumerate() {
        ledger
            .append(&mut db, &draft("2024-03-01", amount, &format!("t{i}"), cat))
            .unwrap();
    }
    let spent = spend_by_category(ledger.entries());
    assert_eq!(spent.get(&Category::Groceries), Some(&dec!(15.15)));
    assert_eq!(spent.get(&Category::Gas), Some(&dec!(27.50)));
    assert_eq!(spent.get(&Category::Rent), Some(&dec!(0)));
    assert!(!spent.contains_key(&Category::Entertainment));
    assert_eq!(spent.len(), 3);
}

#[test]
fn test_spend_by_category_empty() {
    assert!(spend_by_category(&[]).is_empty());
}

#[test]
fn test_totals_budget_independent_of_ledger() {
    let budgets = validate_budgets(&standard_budgets()).unwrap();
    let t = totals(&[], Some(&budgets));
    assert_eq!(t.total_budget, dec!(1500));
    assert_eq!(t.total_spent, Decimal::ZERO);
}

#[test]
fn test_totals_unset_budget_is_zero() {
    let t = totals(&[], None);
    assert_eq!(t, Totals::default());
}

#[test]
fn test_recent_window_caps_and_orders() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    for i in 1..=5 {
        ledger
            .append(&mut db, &draft("2024-03-01", "10", &format!("t{i}"), "Groceries"))
            .unwrap();
    }
    assert_eq!(
        names(recent_window(ledger.entries(), DEFAULT_RECENT_WINDOW)),
        vec!["t5", "t4", "t3", "t2", "t1"]
    );

    ledger
        .append(&mut db, &draft("2024-03-01", "10", "t6", "Groceries"))
        .unwrap();
    let window = recent_window(ledger.entries(), 5);
    assert_eq!(window.len(), 5);
    assert_eq!(names(window), vec!["t6", "t5", "t4", "t3", "t2"]);
    assert_eq!(ledger.len(), 6);
    assert_eq!(
        spend_by_category(ledger.entries()).get(&Category::Groceries),
        Some(&dec!(60))
    );
}

#[test]
fn test_recent_window_uses_entry_order_not_date() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger.append(&mut db, &draft("2024-03-20", "1", "later date", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-01", "1", "earlier date", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-01", "1", "same date", "Gas")).unwrap();
    assert_eq!(
        names(recent_window(ledger.entries(), 5)),
        vec!["same date", "earlier date", "later date"]
    );
}

#[test]
fn test_recent_window_is_restartable() {
    let mut db = Database::open_in_memory().unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    ledger.append(&mut db, &draft("2024-03-01", "1", "a", "Gas")).unwrap();
    ledger.append(&mut db, &draft("2024-03-02", "1", "b", "Gas")).unwrap();
    let window = recent_window(ledger.entries(), 1);
    let first: Vec<_> = window.into_iter().collect();
    let second: Vec<_> = window.into_iter().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert!(recent_window(ledger.entries(), 0).is_empty());
    assert!(recent_window(&[], 5).is_empty());
}

#[test]
fn test_aggregated_view_rows() {
    let budgets = validate_budgets(&standard_budgets()).unwrap();
    let ledger = vec![
        validate_transaction(&draft("2024-03-01", "60", "Cinema", "Entertainment")).unwrap(),
        validate_transaction(&draft("2024-03-02", "20", "Shell", "Gas")).unwrap(),
    ];
    let view = AggregatedView::compute(&ledger, Some(&budgets), dec!(4000));

    assert_eq!(view.categories.len(), 5);
    assert_eq!(view.categories[0].category, Category::Groceries);
    let ent = view.summary(Category::Entertainment).unwrap();
    assert_eq!(ent.remaining, dec!(-10));
    assert!(ent.is_over());
    assert_eq!(ent.share, dec!(0.75));
    assert_eq!(ent.used_ratio(), Some(dec!(1.2)));

    let groceries = view.summary(Category::Groceries).unwrap();
    assert_eq!(groceries.spent, Decimal::ZERO);
    assert_eq!(groceries.remaining, dec!(200));
    assert_eq!(groceries.share, Decimal::ZERO);

    assert_eq!(view.totals.total_spent, dec!(80));
    assert_eq!(view.balance, dec!(3920));
    assert_eq!(view.total_remaining(), dec!(1420));
}

#[test]
fn test_aggregated_view_without_budgets() {
    let view = AggregatedView::compute(&[], None, dec!(4000));
    assert_eq!(view.totals.total_budget, Decimal::ZERO);
    assert_eq!(view.balance, dec!(4000));
    assert!(view.categories.iter().all(|c| c.used_ratio().is_none()));
}

#[test]
fn test_aggregation_is_deterministic() {
    let budgets = validate_budgets(&standard_budgets()).unwrap();
    let ledger = vec![
        validate_transaction(&draft("2024-03-01", "3.33", "a", "Rent")).unwrap(),
        validate_transaction(&draft("2024-03-01", "6.67", "b", "Gas")).unwrap(),
    ];
    let a = AggregatedView::compute(&ledger, Some(&budgets), dec!(100));
    let b = AggregatedView::compute(&ledger, Some(&budgets), dec!(100));
    assert_eq!(a, b);
}

#[test]
fn test_end_to_end_scenario() {
    let mut db = Database::open_in_memory().unwrap();
    let mut store = BudgetStore::load(&db).unwrap();
    let budgets = store.save(&mut db, &standard_budgets()).unwrap();
    let mut ledger = Ledger::load(&db).unwrap();
    let txn = ledger
        .append(&mut db, &draft("2024-03-05", "45.50", "Trader Joe's", "Groceries"))
        .unwrap();

    let spent = spend_by_category(ledger.entries());
    assert_eq!(spent.len(), 1);
    assert_eq!(spent.get(&Category::Groceries), Some(&dec!(45.50)));

    assert_eq!(
        totals(ledger.entries(), Some(&budgets)),
        Totals {
            total_spent: dec!(45.50),
            total_budget: dec!(1500),
        }
    );

    let recent: Vec<_> = recent_window(ledger.entries(), 1).into_iter().cloned().collect();
    assert_eq!(recent, vec![txn]);
}
