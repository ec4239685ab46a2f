//! Summaries over stored records: history totals, budget progress and the
//! daily expense trend.

mod format;

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::features::{self, DailyAggregate};
use crate::models::{Budget, Transaction};

pub(crate) use format::{format_amount, truncate};

/// Spent share of the limit above which a budget is over.
pub(crate) const OVER_THRESHOLD: Decimal = dec!(90);
/// Spent share of the limit above which a budget is in warning.
pub(crate) const WARNING_THRESHOLD: Decimal = dec!(70);

// ── History ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct HistorySummary {
    pub(crate) count: usize,
    pub(crate) total_income: Decimal,
    pub(crate) total_expenses: Decimal,
    /// Income minus expenses.
    pub(crate) net: Decimal,
}

pub(crate) fn summarize(transactions: &[Transaction]) -> AnalysisResult<HistorySummary> {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    for txn in transactions {
        if txn.is_income() {
            total_income = add(total_income, txn.amount, "total income")?;
        } else {
            total_expenses = add(total_expenses, txn.amount, "total expenses")?;
        }
    }
    let net = total_income
        .checked_sub(total_expenses)
        .ok_or_else(|| AnalysisError::overflow("net total"))?;
    Ok(HistorySummary {
        count: transactions.len(),
        total_income,
        total_expenses,
        net,
    })
}

fn add(total: Decimal, amount: Decimal, what: &str) -> AnalysisResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| AnalysisError::overflow(what))
}

// ── Budgets ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum BudgetStatus {
    Ok,
    Warning,
    Over,
}

impl BudgetStatus {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }

    fn from_percent(percent: Decimal) -> Self {
        if percent > OVER_THRESHOLD {
            Self::Over
        } else if percent > WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BudgetProgress {
    pub(crate) category: String,
    pub(crate) limit: Decimal,
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
    /// Spent as a percentage of the limit, 0 when the limit is 0.
    pub(crate) percent: Decimal,
    pub(crate) status: BudgetStatus,
}

impl BudgetProgress {
    /// Filled cells of a `width`-cell bar, capped at `width`.
    pub(crate) fn bar(&self, width: usize) -> String {
        let ratio = (self.percent / dec!(100)).to_f64().unwrap_or(0.0).clamp(0.0, 1.0);
        let filled = (ratio * width as f64) as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

/// Progress of every budget against Expense spending in its category.
///
/// With `month` ("YYYY-MM") only expenses dated in that month count;
/// otherwise all expenses do. Category names match exactly.
pub(crate) fn budget_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    month: Option<&str>,
) -> AnalysisResult<Vec<BudgetProgress>> {
    let mut spending: BTreeMap<&str, Decimal> = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.is_expense()) {
        if month.is_some_and(|m| !txn.date.starts_with(m)) {
            continue;
        }
        let spent = spending.entry(txn.category.as_str()).or_default();
        *spent = add(*spent, txn.amount, "budget spending")?;
    }

    budgets
        .iter()
        .map(|budget| -> AnalysisResult<BudgetProgress> {
            let spent = spending
                .get(budget.category.as_str())
                .copied()
                .unwrap_or_default();
            let percent = if budget.limit > Decimal::ZERO {
                spent
                    .checked_div(budget.limit)
                    .and_then(|share| share.checked_mul(dec!(100)))
                    .ok_or_else(|| {
                        AnalysisError::overflow(&format!("budget share for {}", budget.category))
                    })?
            } else {
                Decimal::ZERO
            };
            let remaining = budget.limit.checked_sub(spent).ok_or_else(|| {
                AnalysisError::overflow(&format!("remaining budget for {}", budget.category))
            })?;
            Ok(BudgetProgress {
                category: budget.category.clone(),
                limit: budget.limit,
                spent,
                remaining,
                percent: percent.round_dp(1),
                status: BudgetStatus::from_percent(percent),
            })
        })
        .collect()
}

// ── Trend ─────────────────────────────────────────────────────

/// Daily Expense totals, oldest first. Days without expenses are absent.
pub(crate) fn daily_trend(transactions: &[Transaction]) -> AnalysisResult<Vec<DailyAggregate>> {
    features::build_daily_series(transactions)
}
