#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn run(db: &mut Database, list: &[&str]) -> Result<()> {
    as_cli(&args(list), db, Output::Text)
}

fn all(db: &Database) -> Vec<Transaction> {
    db.get_transactions(&TransactionFilter::default()).unwrap()
}

// ── Argument helpers ──────────────────────────────────────────

#[test]
fn test_flag_value() {
    let a = args(&["--from", "2024-01-01", "--to"]);
    assert_eq!(flag_value(&a, "--from"), Some("2024-01-01"));
    assert_eq!(flag_value(&a, "--to"), None);
    assert_eq!(flag_value(&a, "--limit"), None);
}

#[test]
fn test_positional_args_skip_flag_values() {
    let a = args(&["expense", "--date", "2024-01-01", "12", "Food", "lunch"]);
    assert_eq!(
        positional_args(&a, &["--date"]),
        vec!["expense", "12", "Food", "lunch"]
    );
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("$1,250.75").unwrap(), dec!(1250.75));
    assert_eq!(parse_amount("3").unwrap(), dec!(3));
    assert!(parse_amount("ten").is_err());
}

#[test]
fn test_shellexpand() {
    assert_eq!(shellexpand("/abs/path.csv"), "/abs/path.csv");
    assert!(!shellexpand("~/x.csv").starts_with('~'));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn test_add_records_transaction() {
    let mut db = Database::open_in_memory().unwrap();
    run(
        &mut db,
        &["add", "expense", "12.50", "Food", "team", "lunch", "--date", "2024-03-04"],
    )
    .unwrap();

    let txns = all(&db);
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].kind, TransactionKind::Expense);
    assert_eq!(txns[0].amount, dec!(12.50));
    assert_eq!(txns[0].category, "Food");
    assert_eq!(txns[0].description, "team lunch");
    assert_eq!(txns[0].date, "2024-03-04");
}

#[test]
fn test_add_defaults_to_today() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["add", "income", "10", "Gift"]).unwrap();
    assert_eq!(all(&db)[0].date, today());
}

#[test]
fn test_add_rejects_bad_input() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(run(&mut db, &["add", "refund", "10", "Food"]).is_err());
    assert!(run(&mut db, &["add", "expense", "-10", "Food"]).is_err());
    assert!(run(&mut db, &["add", "expense", "10"]).is_err());
    assert!(run(&mut db, &["add", "expense", "10", "Food", "--date", "2024-02-30"]).is_err());
    assert!(all(&db).is_empty());
}

#[test]
fn test_salary_shortcut() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["salary", "4200", "2024-05-31"]).unwrap();

    let txns = all(&db);
    assert_eq!(txns[0].kind, TransactionKind::Income);
    assert_eq!(txns[0].category, "Salary");
    assert_eq!(txns[0].description, "Monthly Salary");
    assert_eq!(txns[0].amount, dec!(4200));
    assert_eq!(txns[0].date, "2024-05-31");
}

#[test]
fn test_delete_found_and_missing() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["add", "expense", "5", "Food", "--date", "2024-01-01"]).unwrap();
    let id = all(&db)[0].id.unwrap().to_string();

    run(&mut db, &["delete", &id]).unwrap();
    assert!(all(&db).is_empty());
    assert!(run(&mut db, &["delete", &id]).is_err());
    assert!(run(&mut db, &["delete", "abc"]).is_err());
}

#[test]
fn test_budget_set_show_and_remove() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["budget", "set", "Food", "300"]).unwrap();
    run(&mut db, &["budget", "set", "Food", "250"]).unwrap();
    assert_eq!(db.get_budgets().unwrap()[0].limit, dec!(250));

    run(&mut db, &["budget"]).unwrap();
    run(&mut db, &["budget", "--month", "2024-01"]).unwrap();

    run(&mut db, &["budget", "rm", "Food"]).unwrap();
    assert!(db.get_budgets().unwrap().is_empty());
    assert!(run(&mut db, &["budget", "rm", "Food"]).is_err());
}

#[test]
fn test_budget_limit_must_be_positive() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(run(&mut db, &["budget", "set", "Food", "0"]).is_err());
    assert!(run(&mut db, &["budget", "set", "Food"]).is_err());
    assert!(db.get_budgets().unwrap().is_empty());
}

#[test]
fn test_list_and_trends_run() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["list"]).unwrap();
    run(&mut db, &["add", "expense", "5", "Food", "--date", "2024-01-01"]).unwrap();
    run(&mut db, &["list", "--type", "expense", "--limit", "5"]).unwrap();
    run(&mut db, &["trends", "--from", "2024-01-01"]).unwrap();
    assert!(run(&mut db, &["list", "--type", "refund"]).is_err());
    assert!(run(&mut db, &["list", "--limit", "many"]).is_err());
}

#[test]
fn test_forecast_and_advice_with_little_data_are_not_errors() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["add", "expense", "5", "Food", "--date", "2024-01-01"]).unwrap();
    run(&mut db, &["forecast"]).unwrap();
    run(&mut db, &["advice"]).unwrap();
    as_cli(&args(&["forecast"]), &mut db, Output::Json).unwrap();
    as_cli(&args(&["advice"]), &mut db, Output::Json).unwrap();
}

#[test]
fn test_forecast_and_advice_with_enough_data() {
    let mut db = Database::open_in_memory().unwrap();
    for d in 1..=20 {
        let date = format!("2024-01-{d:02}");
        run(&mut db, &["add", "expense", "25", "Food", "--date", &date]).unwrap();
    }
    run(&mut db, &["salary", "3000", "2024-01-15"]).unwrap();
    run(&mut db, &["forecast"]).unwrap();
    run(&mut db, &["advice"]).unwrap();
    as_cli(&args(&["forecast"]), &mut db, Output::Json).unwrap();
}

#[test]
fn test_advice_with_out_of_range_totals_is_error_not_panic() {
    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["salary", "0.0000000001", "2024-01-01"]).unwrap();
    for d in 2..=7 {
        let date = format!("2024-01-{d:02}");
        run(
            &mut db,
            &["add", "expense", "10000000000000000000", "Rent", "--date", &date],
        )
        .unwrap();
    }
    let err = run(&mut db, &["advice"]).unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn test_import_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.csv");
    std::fs::write(
        &source,
        "type,category,amount,description,date\n\
         Expense,Food,12.00,Lunch,2024-01-02\n\
         Income,Salary,\"$3,000.00\",Pay,01/31/2024\n",
    )
    .unwrap();

    let mut db = Database::open_in_memory().unwrap();
    run(&mut db, &["import", source.to_str().unwrap()]).unwrap();
    assert_eq!(all(&db).len(), 2);

    let target = dir.path().join("out.csv");
    run(&mut db, &["export", target.to_str().unwrap()]).unwrap();
    let content = std::fs::read_to_string(&target).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("Income,Salary,3000.00,Pay,2024-01-31"));
}

#[test]
fn test_import_bad_row_inserts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("bad.csv");
    std::fs::write(
        &source,
        "type,category,amount,date\nExpense,Food,1,2024-01-02\nExpense,Food,x,2024-01-03\n",
    )
    .unwrap();

    let mut db = Database::open_in_memory().unwrap();
    let err = run(&mut db, &["import", source.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("Row 3"));
    assert!(all(&db).is_empty());
}

#[test]
fn test_import_missing_file() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(run(&mut db, &["import", "/nonexistent/file.csv"]).is_err());
}

#[test]
fn test_unknown_command_is_error() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(run(&mut db, &["frobnicate"]).is_err());
    run(&mut db, &["help"]).unwrap();
    run(&mut db, &["version"]).unwrap();
    run(&mut db, &[]).unwrap();
}
