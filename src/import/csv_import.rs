use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::{Transaction, TransactionKind, DATE_FORMAT};

/// Date layouts accepted on import, tried in order.
const DATE_FORMATS: [&str; 2] = [DATE_FORMAT, "%m/%d/%Y"];

/// Column positions within a row. `id` is never read back; imported rows
/// always get fresh ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub(crate) kind: usize,
    pub(crate) category: usize,
    pub(crate) amount: usize,
    pub(crate) description: Option<usize>,
    pub(crate) date: usize,
}

impl ColumnMap {
    /// Layout of a headerless row: the export layout with or without the
    /// leading id column.
    fn positional(width: usize) -> Self {
        let offset = usize::from(width >= 6);
        Self {
            kind: offset,
            category: offset + 1,
            amount: offset + 2,
            description: Some(offset + 3),
            date: offset + 4,
        }
    }

    /// Map columns by header name. Returns `None` when the row is not a header.
    fn from_header(row: &[String]) -> Option<Self> {
        Some(Self {
            kind: column(row, &["type", "kind"])?,
            category: column(row, &["category"])?,
            amount: column(row, &["amount"])?,
            description: column(row, &["description", "desc", "memo"]),
            date: column(row, &["date"])?,
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read every row of the file as strings. Fails on an empty file.
    pub(crate) fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        if rows.is_empty() {
            anyhow::bail!("CSV file is empty");
        }
        Ok(rows)
    }

    /// Parse rows into validated transactions. Errors name the 1-based row.
    pub(crate) fn parse(rows: &[Vec<String>]) -> Result<Vec<Transaction>> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let (columns, skip) = match ColumnMap::from_header(first) {
            Some(map) => (map, 1),
            None => (ColumnMap::positional(first.len()), 0),
        };
        tracing::debug!(?columns, header = skip == 1, "CSV column layout");

        let mut transactions = Vec::new();
        for (i, row) in rows.iter().enumerate().skip(skip) {
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let txn = parse_row(row, &columns).with_context(|| format!("Row {}", i + 1))?;
            transactions.push(txn);
        }
        Ok(transactions)
    }

    pub(crate) fn load(path: &Path) -> Result<Vec<Transaction>> {
        Self::parse(&Self::read_rows(path)?)
    }
}

fn parse_row(row: &[String], columns: &ColumnMap) -> Result<Transaction> {
    let raw_kind = field(row, columns.kind, "type")?;
    let kind = TransactionKind::parse(raw_kind)
        .with_context(|| format!("unknown transaction type '{raw_kind}'"))?;
    let amount = parse_decimal(field(row, columns.amount, "amount")?)?;
    let date = parse_date(field(row, columns.date, "date")?)?;
    let description = columns
        .description
        .and_then(|c| row.get(c))
        .map(|s| s.trim())
        .unwrap_or("");

    Transaction::new(
        kind,
        field(row, columns.category, "category")?,
        amount,
        description,
        &date.format(DATE_FORMAT).to_string(),
    )
}

fn column(header: &[String], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn field<'a>(row: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    row.get(idx)
        .map(|s| s.trim())
        .with_context(|| format!("missing {name} column"))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .with_context(|| format!("Could not parse date '{s}'"))
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        anyhow::bail!("Amount is empty");
    }
    Decimal::from_str(cleaned).with_context(|| format!("Failed to parse '{s}' as an amount"))
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
