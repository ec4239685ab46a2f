use anyhow::{Context, Result};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

use crate::advisor::{self, ADVICE_WINDOW, MIN_ADVICE_RECORDS};
use crate::db::{Database, SortOrder, TransactionFilter};
use crate::forecast;
use crate::import::{export_to_csv, CsvImporter};
use crate::models::{Budget, Transaction, TransactionKind, DATE_FORMAT};
use crate::report::{self, format_amount, truncate};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    Text,
    Json,
}

pub(crate) fn as_cli(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];
    match command.as_str() {
        "add" => cli_add(rest, db, out),
        "salary" => cli_salary(rest, db, out),
        "list" | "ls" => cli_list(rest, db, out),
        "delete" | "rm" => cli_delete(rest, db, out),
        "budget" => cli_budget(rest, db, out),
        "trends" => cli_trends(rest, db, out),
        "forecast" => cli_forecast(db, out),
        "advice" => cli_advice(db, out),
        "import" => cli_import(rest, db, out),
        "export" => cli_export(rest, db, out),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("fintrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("fintrack - personal finance tracker with spending forecasts");
    println!();
    println!("Usage: fintrack [--db <path>] [--json] [--verbose] <command>");
    println!();
    println!("Commands:");
    println!("  add <income|expense> <amount> <category> [description]");
    println!("    --date <YYYY-MM-DD>         Transaction date (default: today)");
    println!("  salary <amount> [YYYY-MM-DD]  Record a monthly salary");
    println!("  list                          List transactions with totals");
    println!("    --type <income|expense>     Only one kind");
    println!("    --category <text>           Category contains text");
    println!("    --from/--to <YYYY-MM-DD>    Inclusive date range");
    println!("    --limit <n>                 Newest n transactions");
    println!("  delete <id>                   Delete a transaction");
    println!("  budget [--month <YYYY-MM>]    Show budget progress");
    println!("  budget set <category> <limit> Set a spending limit");
    println!("  budget rm <category>          Remove a spending limit");
    println!("  trends [--from/--to <date>]   Daily expense totals");
    println!("  forecast                      Forecast the next 7 days of spending");
    println!("  advice                        Spending advice from recent activity");
    println!("  import <file.csv>             Import transactions from CSV");
    println!("  export [path]                 Export all transactions to CSV");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("The database defaults to the platform data directory; override");
    println!("with --db or the {} environment variable.", crate::config::DB_ENV_VAR);
}

// ── Transactions ──────────────────────────────────────────────

fn cli_add(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let positional = positional_args(args, &["--date"]);
    let [kind, amount, category, description @ ..] = positional.as_slice() else {
        anyhow::bail!(
            "Usage: fintrack add <income|expense> <amount> <category> [description] [--date YYYY-MM-DD]"
        );
    };

    let kind = TransactionKind::parse(kind)
        .with_context(|| format!("Type must be income or expense, got '{kind}'"))?;
    let amount = parse_amount(amount)?;
    let date = flag_value(args, "--date").map_or_else(today, str::to_string);
    let description = description.join(" ");

    let txn = Transaction::new(kind, category, amount, &description, &date)?;
    record(db, txn, out)
}

fn cli_salary(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let Some(amount) = args.first() else {
        anyhow::bail!("Usage: fintrack salary <amount> [YYYY-MM-DD]");
    };
    let amount = parse_amount(amount)?;
    let date = args.get(1).cloned().unwrap_or_else(today);

    let txn = Transaction::new(
        TransactionKind::Income,
        "Salary",
        amount,
        "Monthly Salary",
        &date,
    )?;
    record(db, txn, out)
}

fn record(db: &mut Database, mut txn: Transaction, out: Output) -> Result<()> {
    let id = db.insert_transaction(&txn)?;
    txn.id = Some(id);
    match out {
        Output::Json => print_json(&txn),
        Output::Text => {
            println!(
                "Added {} #{id}: {} {} on {}",
                txn.kind.as_str().to_lowercase(),
                format_amount(txn.amount),
                txn.category,
                txn.date
            );
            Ok(())
        }
    }
}

fn cli_list(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let kind = flag_value(args, "--type")
        .map(|k| {
            TransactionKind::parse(k).with_context(|| format!("Unknown transaction type: {k}"))
        })
        .transpose()?;
    let limit = flag_value(args, "--limit")
        .map(|n| n.parse::<u32>().with_context(|| format!("Invalid limit: {n}")))
        .transpose()?;
    let filter = TransactionFilter {
        kind,
        category: flag_value(args, "--category"),
        from: flag_value(args, "--from"),
        to: flag_value(args, "--to"),
        order: SortOrder::Descending,
        limit,
    };

    let txns = db.get_transactions(&filter)?;
    let summary = report::summarize(&txns)?;

    if out == Output::Json {
        #[derive(Serialize)]
        struct History<'a> {
            transactions: &'a [Transaction],
            summary: &'a report::HistorySummary,
        }
        return print_json(&History {
            transactions: &txns,
            summary: &summary,
        });
    }

    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }
    println!(
        "{:<6} {:<10} {:<8} {:<16} {:>12}  Description",
        "ID", "Date", "Type", "Category", "Amount"
    );
    println!("{}", "─".repeat(72));
    for txn in &txns {
        println!(
            "{:<6} {:<10} {:<8} {:<16} {:>12}  {}",
            txn.id.unwrap_or(0),
            txn.date,
            txn.kind.as_str(),
            truncate(&txn.category, 16),
            format_amount(txn.amount),
            truncate(&txn.description, 30),
        );
    }
    println!("{}", "─".repeat(72));
    println!(
        "  Shown:    {} of {}",
        summary.count,
        db.get_transaction_count()?
    );
    println!("  Income:   {}", format_amount(summary.total_income));
    println!("  Expenses: {}", format_amount(summary.total_expenses));
    println!("  Net:      {}", format_amount(summary.net));
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let Some(raw) = args.first() else {
        anyhow::bail!("Usage: fintrack delete <id>");
    };
    let id: i64 = raw
        .parse()
        .with_context(|| format!("Invalid transaction id: {raw}"))?;

    let deleted = db.delete_transaction(id)?;
    match out {
        Output::Json => print_json(&serde_json::json!({ "id": id, "deleted": deleted })),
        Output::Text if deleted => {
            println!("Deleted transaction #{id}");
            Ok(())
        }
        Output::Text => anyhow::bail!("Transaction not found: {id}"),
    }
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("set") => {
            let (Some(category), Some(limit)) = (args.get(1), args.get(2)) else {
                anyhow::bail!("Usage: fintrack budget set <category> <limit>");
            };
            let limit = parse_amount(limit)?;
            if limit <= Decimal::ZERO {
                anyhow::bail!("Budget limit must be greater than zero");
            }
            let budget = Budget::new(category, limit)?;
            db.upsert_budget(&budget)?;
            match out {
                Output::Json => print_json(&budget),
                Output::Text => {
                    println!("Budget for {} set to {}", budget.category, format_amount(limit));
                    Ok(())
                }
            }
        }
        Some("rm") => {
            let Some(category) = args.get(1) else {
                anyhow::bail!("Usage: fintrack budget rm <category>");
            };
            let removed = db.delete_budget(category)?;
            match out {
                Output::Json => {
                    print_json(&serde_json::json!({ "category": category, "removed": removed }))
                }
                Output::Text if removed => {
                    println!("Removed budget for {category}");
                    Ok(())
                }
                Output::Text => anyhow::bail!("No budget for {category}"),
            }
        }
        _ => cli_budget_progress(args, db, out),
    }
}

fn cli_budget_progress(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let month = flag_value(args, "--month");
    let budgets = db.get_budgets()?;
    let expenses = db.get_transactions(&TransactionFilter::expenses())?;
    let progress = report::budget_progress(&budgets, &expenses, month)?;

    if out == Output::Json {
        return print_json(&progress);
    }
    if progress.is_empty() {
        println!("No budgets set");
        println!("Use `fintrack budget set <category> <limit>` to set a spending limit");
        return Ok(());
    }

    println!("Budgets ({})", month.unwrap_or("all time"));
    println!("{}", "─".repeat(72));
    for p in &progress {
        println!(
            "  {:<16} {} {:>12} / {:<12} {:>6}%  {}",
            truncate(&p.category, 16),
            p.bar(20),
            format_amount(p.spent),
            format_amount(p.limit),
            p.percent.round_dp(0),
            p.status.as_str(),
        );
    }
    Ok(())
}

// ── Analysis ──────────────────────────────────────────────────

fn cli_trends(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let filter = TransactionFilter {
        from: flag_value(args, "--from"),
        to: flag_value(args, "--to"),
        ..TransactionFilter::expenses()
    };
    let series = report::daily_trend(&db.get_transactions(&filter)?)?;

    if out == Output::Json {
        return print_json(&series);
    }
    if series.is_empty() {
        println!("No expenses");
        return Ok(());
    }
    println!(
        "{:<10} {:<9} {:>12} {:>5}  {:<16} {:>10}",
        "Date", "Day", "Total", "Txns", "Top Category", "7d Avg"
    );
    println!("{}", "─".repeat(70));
    for day in &series {
        println!(
            "{:<10} {:<9} {:>12.2} {:>5}  {:<16} {:>10.2}",
            day.date,
            crate::features::weekday_name(day.date.weekday()),
            day.total_amount,
            day.transaction_count,
            truncate(&day.dominant_category, 16),
            day.rolling_mean_7,
        );
    }
    Ok(())
}

fn cli_forecast(db: &mut Database, out: Output) -> Result<()> {
    let expenses = db.get_transactions(&TransactionFilter::expenses())?;
    let points = match forecast::compute_forecast(&expenses) {
        Ok(points) => points,
        Err(err) if err.is_insufficient_data() => {
            tracing::info!(%err, "forecast skipped");
            return match out {
                Output::Json => print_json(&serde_json::json!({ "error": err.to_string() })),
                Output::Text => {
                    println!("Not enough data to forecast. {err}.");
                    Ok(())
                }
            };
        }
        Err(err) => return Err(err.into()),
    };

    if out == Output::Json {
        return print_json(&points);
    }
    println!("{:<10} {:<9} {:>10}   Range", "Date", "Day", "Predicted");
    println!("{}", "─".repeat(50));
    for p in &points {
        println!(
            "{:<10} {:<9} {:>10.2}   {:.2} - {:.2}",
            p.date, p.weekday_name, p.predicted_amount, p.confidence_low, p.confidence_high
        );
    }
    let total: f64 = points.iter().map(|p| p.predicted_amount).sum();
    println!("{}", "─".repeat(50));
    println!("  Next {} days: {total:.2}", points.len());
    Ok(())
}

fn cli_advice(db: &mut Database, out: Output) -> Result<()> {
    let window = u32::try_from(ADVICE_WINDOW).unwrap_or(u32::MAX);
    let recent = db.get_transactions(&TransactionFilter::most_recent(window))?;
    let advice = match advisor::compute_advice(&recent) {
        Ok(advice) => advice,
        Err(err) if err.is_insufficient_data() => {
            tracing::info!(%err, "advice skipped");
            let message = format!(
                "Not enough data to generate advice. Please track at least {MIN_ADVICE_RECORDS} days of transactions."
            );
            return match out {
                Output::Json => print_json(&serde_json::json!({ "advice": message })),
                Output::Text => {
                    println!("{message}");
                    Ok(())
                }
            };
        }
        Err(err) => return Err(err.into()),
    };

    if out == Output::Json {
        return print_json(&advice);
    }
    for line in &advice.lines {
        println!("{}", line.message);
    }
    let stats = &advice.stats;
    println!();
    println!("  Income:        {}", format_amount(stats.total_income));
    println!("  Expenses:      {}", format_amount(stats.total_expenses));
    println!("  Savings rate:  {}", advisor::percent(stats.savings_rate));
    println!(
        "  Top category:  {} ({})",
        stats.top_category,
        advisor::percent(stats.top_category_pct)
    );
    Ok(())
}

// ── CSV ───────────────────────────────────────────────────────

fn cli_import(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: fintrack import <file.csv>");
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let txns = CsvImporter::load(path)?;
    let count = db.insert_transactions_batch(&txns)?;
    match out {
        Output::Json => print_json(&serde_json::json!({ "imported": count })),
        Output::Text => {
            println!("Imported {count} transactions");
            Ok(())
        }
    }
}

fn cli_export(args: &[String], db: &mut Database, out: Output) -> Result<()> {
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/fintrack-export-{}.csv", today())
        });

    let txns = db.get_transactions(&TransactionFilter::default())?;
    let count = export_to_csv(Path::new(&output_path), &txns)?;
    match out {
        Output::Json => {
            print_json(&serde_json::json!({ "exported": count, "path": output_path }))
        }
        Output::Text => {
            println!("Exported {count} transactions to {output_path}");
            Ok(())
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    cleaned
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount: {raw}"))
}

/// Value following `flag`, if present.
pub(crate) fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither one of `value_flags` nor the value after one.
pub(crate) fn positional_args<'a>(args: &'a [String], value_flags: &[&str]) -> Vec<&'a str> {
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if value_flags.contains(&arg.as_str()) {
            iter.next();
        } else {
            positional.push(arg.as_str());
        }
    }
    positional
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
