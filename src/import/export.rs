use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Transaction;

pub(crate) const EXPORT_HEADER: [&str; 6] = ["id", "type", "category", "amount", "description", "date"];

/// Write transactions to `path` in date order, returning the row count.
pub(crate) fn export_to_csv(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    wtr.write_record(EXPORT_HEADER)?;
    for txn in &sorted {
        wtr.write_record([
            txn.id.map(|id| id.to_string()).unwrap_or_default(),
            txn.kind.as_str().to_string(),
            txn.category.clone(),
            txn.amount.to_string(),
            txn.description.clone(),
            txn.date.clone(),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    tracing::info!(rows = sorted.len(), path = %path.display(), "exported transactions");
    Ok(sorted.len())
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
