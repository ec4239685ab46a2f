mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

/// Direction for date-ordered reads. Ties on date fall back to insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ORDER BY t.date ASC, t.id ASC",
            Self::Descending => "ORDER BY t.date DESC, t.id DESC",
        }
    }
}

/// Optional restrictions for [`Database::get_transactions`].
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter<'a> {
    pub(crate) kind: Option<TransactionKind>,
    /// Case-insensitive substring match on the category label.
    pub(crate) category: Option<&'a str>,
    /// Inclusive lower bound, "YYYY-MM-DD".
    pub(crate) from: Option<&'a str>,
    /// Inclusive upper bound, "YYYY-MM-DD".
    pub(crate) to: Option<&'a str>,
    pub(crate) order: SortOrder,
    pub(crate) limit: Option<u32>,
}

impl TransactionFilter<'_> {
    pub(crate) fn expenses() -> Self {
        Self {
            kind: Some(TransactionKind::Expense),
            ..Self::default()
        }
    }

    pub(crate) fn most_recent(limit: u32) -> Self {
        Self {
            order: SortOrder::Descending,
            limit: Some(limit),
            ..Self::default()
        }
    }
}

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(version = schema::CURRENT_VERSION, "created database schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(
                from = current,
                to = schema::CURRENT_VERSION,
                "migrated database schema"
            );
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (type, category, amount, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                txn.kind.as_str(),
                txn.category,
                txn.amount.to_string(),
                txn.description,
                txn.date,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, kind = %txn.kind, "inserted transaction");
        Ok(id)
    }

    pub(crate) fn insert_transactions_batch(&mut self, txns: &[Transaction]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for txn in txns {
            tx.execute(
                "INSERT INTO transactions (type, category, amount, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    txn.kind.as_str(),
                    txn.category,
                    txn.amount.to_string(),
                    txn.description,
                    txn.date,
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = txns.len(), "inserted transaction batch");
        Ok(txns.len())
    }

    pub(crate) fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT t.id, t.type, t.category, t.amount, t.description, t.date
             FROM transactions t WHERE 1=1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND t.type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }
        if let Some(c) = filter.category {
            sql.push_str(&format!(" AND t.category LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("%{c}%")));
        }
        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND t.date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND t.date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(to.to_string()));
        }

        sql.push(' ');
        sql.push_str(filter.order.as_sql());

        if let Some(l) = filter.limit {
            sql.push_str(&format!(" LIMIT {l}"));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), row_to_transaction)?;
        let txns = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        tracing::debug!(count = txns.len(), ?filter, "read transactions");
        Ok(txns)
    }

    pub(crate) fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    /// Returns `false` when no transaction has the given id.
    pub(crate) fn delete_transaction(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            tracing::warn!(id, "delete requested for unknown transaction");
        }
        Ok(deleted > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn get_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, limit_amount FROM budgets ORDER BY category")?;
        let rows = stmt.query_map([], |row| {
            let amt_str: String = row.get(1)?;
            Ok(Budget {
                category: row.get(0)?,
                limit: Decimal::from_str(&amt_str).unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Setting a budget for an existing category replaces its limit.
    pub(crate) fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budgets (category, limit_amount)
             VALUES (?1, ?2)
             ON CONFLICT(category) DO UPDATE SET limit_amount = ?2",
            params![budget.category, budget.limit.to_string()],
        )?;
        tracing::debug!(category = %budget.category, limit = %budget.limit, "budget saved");
        Ok(())
    }

    pub(crate) fn delete_budget(&self, category: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM budgets WHERE category = ?1", params![category])?;
        Ok(deleted > 0)
    }
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(1)?;
    let kind = TransactionKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(1, "type".into(), rusqlite::types::Type::Text)
    })?;
    let amount_str: String = row.get(3)?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        kind,
        category: row.get(2)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        description: row.get(4)?,
        date: row.get(5)?,
    })
}

#[cfg(test)]
mod tests;
