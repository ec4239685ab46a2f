use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub(crate) enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense record. Never edited in place; the only
/// mutation after insert is deletion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Transaction {
    pub(crate) id: Option<i64>,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionKind,
    pub(crate) category: String,
    pub(crate) amount: Decimal,
    pub(crate) description: String,
    /// Format: "YYYY-MM-DD"
    pub(crate) date: String,
}

impl Transaction {
    pub(crate) fn new(
        kind: TransactionKind,
        category: &str,
        amount: Decimal,
        description: &str,
        date: &str,
    ) -> Result<Self> {
        let category = category.trim();
        if category.is_empty() {
            anyhow::bail!("Category must not be empty");
        }
        if amount < Decimal::ZERO {
            anyhow::bail!("Amount must not be negative: {amount}");
        }
        let date = date.trim();
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{date}', expected YYYY-MM-DD"))?;
        Ok(Self {
            id: None,
            kind,
            category: category.to_string(),
            amount,
            description: description.trim().to_string(),
            date: date.to_string(),
        })
    }

    pub(crate) fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub(crate) fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}
