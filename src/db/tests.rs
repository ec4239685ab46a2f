#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn txn(kind: TransactionKind, category: &str, amount: Decimal, date: &str) -> Transaction {
    Transaction::new(kind, category, amount, "test", date).unwrap()
}

fn setup_test_data(db: &mut Database) {
    let txns = vec![
        txn(TransactionKind::Expense, "Coffee", dec!(5.25), "2024-01-10"),
        txn(TransactionKind::Expense, "Shopping", dec!(42.99), "2024-01-15"),
        txn(TransactionKind::Income, "Salary", dec!(3000.00), "2024-01-20"),
        txn(TransactionKind::Expense, "Groceries", dec!(87.30), "2024-02-05"),
    ];
    db.insert_transactions_batch(&txns).unwrap();
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_fresh_database_is_empty() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.get_transaction_count().unwrap(), 0);
    assert!(db.get_budgets().unwrap().is_empty());
}

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_reopen_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    {
        let db = Database::open(&path).unwrap();
        db.insert_transaction(&txn(
            TransactionKind::Expense,
            "Food",
            dec!(10),
            "2024-01-01",
        ))
        .unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_transaction_count().unwrap(), 1);
}

// ── Transaction CRUD ──────────────────────────────────────────

#[test]
fn test_transaction_insert_and_query() {
    let db = Database::open_in_memory().unwrap();
    let t = txn(TransactionKind::Expense, "Coffee", dec!(4.50), "2024-01-15");
    let id = db.insert_transaction(&t).unwrap();
    assert!(id > 0);

    let all = db.get_transactions(&TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(id));
    assert_eq!(all[0].kind, TransactionKind::Expense);
    assert_eq!(all[0].category, "Coffee");
    assert_eq!(all[0].amount, dec!(4.50));
    assert_eq!(all[0].date, "2024-01-15");
}

#[test]
fn test_ids_are_unique() {
    let db = Database::open_in_memory().unwrap();
    let t = txn(TransactionKind::Expense, "Coffee", dec!(1), "2024-01-15");
    let a = db.insert_transaction(&t).unwrap();
    let b = db.insert_transaction(&t).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_batch_insert_count() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert_eq!(db.get_transaction_count().unwrap(), 4);
}

#[test]
fn test_filter_by_kind() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);

    let expenses = db.get_transactions(&TransactionFilter::expenses()).unwrap();
    assert_eq!(expenses.len(), 3);
    assert!(expenses.iter().all(|t| t.is_expense()));

    let income = db
        .get_transactions(&TransactionFilter {
            kind: Some(TransactionKind::Income),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].category, "Salary");
}

#[test]
fn test_ascending_order_by_date() {
    let mut db = Database::open_in_memory().unwrap();
    let txns = vec![
        txn(TransactionKind::Expense, "B", dec!(1), "2024-03-01"),
        txn(TransactionKind::Expense, "A", dec!(1), "2024-01-01"),
        txn(TransactionKind::Expense, "C", dec!(1), "2024-02-01"),
    ];
    db.insert_transactions_batch(&txns).unwrap();

    let dates: Vec<String> = db
        .get_transactions(&TransactionFilter::default())
        .unwrap()
        .into_iter()
        .map(|t| t.date)
        .collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
}

#[test]
fn test_most_recent_limit_descending() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);

    let recent = db.get_transactions(&TransactionFilter::most_recent(2)).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].date, "2024-02-05");
    assert_eq!(recent[1].date, "2024-01-20");
}

#[test]
fn test_filter_by_category_case_insensitive() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);

    let results = db
        .get_transactions(&TransactionFilter {
            category: Some("cof"),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].category, "Coffee");
}

#[test]
fn test_filter_by_date_range_inclusive() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);

    let results = db
        .get_transactions(&TransactionFilter {
            from: Some("2024-01-15"),
            to: Some("2024-01-20"),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].date, "2024-01-15");
    assert_eq!(results[1].date, "2024-01-20");
}

#[test]
fn test_delete_existing_transaction() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    let all = db.get_transactions(&TransactionFilter::default()).unwrap();
    let id = all[1].id.unwrap();

    assert!(db.delete_transaction(id).unwrap());
    let remaining = db.get_transactions(&TransactionFilter::default()).unwrap();
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|t| t.id != Some(id)));
}

#[test]
fn test_delete_missing_transaction_reports_not_found() {
    let mut db = Database::open_in_memory().unwrap();
    setup_test_data(&mut db);
    assert!(!db.delete_transaction(99999).unwrap());
    assert_eq!(db.get_transaction_count().unwrap(), 4);
}

#[test]
fn test_amount_precision_preserved() {
    let db = Database::open_in_memory().unwrap();
    db.insert_transaction(&txn(
        TransactionKind::Expense,
        "Food",
        dec!(0.01),
        "2024-01-01",
    ))
    .unwrap();
    db.insert_transaction(&txn(
        TransactionKind::Income,
        "Pay",
        dec!(1234567.89),
        "2024-01-02",
    ))
    .unwrap();
    let all = db.get_transactions(&TransactionFilter::default()).unwrap();
    assert_eq!(all[0].amount, dec!(0.01));
    assert_eq!(all[1].amount, dec!(1234567.89));
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_budget_insert_and_list() {
    let db = Database::open_in_memory().unwrap();
    db.upsert_budget(&Budget::new("Rent", dec!(1200)).unwrap())
        .unwrap();
    db.upsert_budget(&Budget::new("Food", dec!(400)).unwrap())
        .unwrap();

    let budgets = db.get_budgets().unwrap();
    assert_eq!(budgets.len(), 2);
    // Sorted by category
    assert_eq!(budgets[0].category, "Food");
    assert_eq!(budgets[1].category, "Rent");
}

#[test]
fn test_budget_upsert_overwrites_limit() {
    let db = Database::open_in_memory().unwrap();
    db.upsert_budget(&Budget::new("Food", dec!(400)).unwrap())
        .unwrap();
    db.upsert_budget(&Budget::new("Food", dec!(550.50)).unwrap())
        .unwrap();

    let budgets = db.get_budgets().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].limit, dec!(550.50));
}

#[test]
fn test_budget_delete() {
    let db = Database::open_in_memory().unwrap();
    db.upsert_budget(&Budget::new("Food", dec!(400)).unwrap())
        .unwrap();
    assert!(db.delete_budget("Food").unwrap());
    assert!(!db.delete_budget("Food").unwrap());
    assert!(db.get_budgets().unwrap().is_empty());
}
