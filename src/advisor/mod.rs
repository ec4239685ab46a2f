//! Spending statistics and rule-based advice over recent transactions.

mod rules;

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::features::weekday_name;
use crate::models::{Transaction, DATE_FORMAT};

pub(crate) use rules::{percent, AdviceLine, AdviceRule};

/// Only the most recent records are considered.
pub(crate) const ADVICE_WINDOW: usize = 30;
pub(crate) const MIN_ADVICE_RECORDS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct WeekTotal {
    /// Monday of the calendar week.
    pub(crate) week_start: NaiveDate,
    pub(crate) total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SpendingStats {
    pub(crate) total_income: Decimal,
    pub(crate) total_expenses: Decimal,
    pub(crate) savings_rate: Decimal,
    pub(crate) top_category: String,
    #[serde(rename = "top_category_percentage")]
    pub(crate) top_category_pct: Decimal,
    /// Expense totals keyed by weekday name; only weekdays with expenses appear.
    pub(crate) weekday_totals: BTreeMap<&'static str, Decimal>,
    /// Contiguous Monday-based weeks from the first to the last expense.
    pub(crate) weekly_totals: Vec<WeekTotal>,
}

impl SpendingStats {
    /// Highest weekday total; ties go to the alphabetically first name.
    pub(crate) fn busiest_weekday(&self) -> Option<(&'static str, Decimal)> {
        let mut best: Option<(&'static str, Decimal)> = None;
        for (&day, &total) in &self.weekday_totals {
            if best.map_or(true, |(_, b)| total > b) {
                best = Some((day, total));
            }
        }
        best
    }

    /// Lowest weekday total; ties go to the alphabetically first name.
    pub(crate) fn quietest_weekday(&self) -> Option<(&'static str, Decimal)> {
        let mut best: Option<(&'static str, Decimal)> = None;
        for (&day, &total) in &self.weekday_totals {
            if best.map_or(true, |(_, b)| total < b) {
                best = Some((day, total));
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Advice {
    pub(crate) advice: String,
    pub(crate) lines: Vec<AdviceLine>,
    pub(crate) stats: SpendingStats,
}

/// Compute statistics and advice from recent transactions of any kind.
///
/// The input is ordered newest first internally and capped at
/// [`ADVICE_WINDOW`] records.
pub(crate) fn compute_advice(transactions: &[Transaction]) -> AnalysisResult<Advice> {
    if transactions.len() < MIN_ADVICE_RECORDS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_ADVICE_RECORDS,
            found: transactions.len(),
            unit: "transactions",
        });
    }

    let stats = spending_stats(transactions)?;
    let lines = rules::evaluate(&stats);
    for line in &lines {
        tracing::debug!(rule = ?line.rule, "advice rule triggered");
    }
    let advice = lines
        .iter()
        .map(|l| l.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(
        records = transactions.len().min(ADVICE_WINDOW),
        rules = lines.len(),
        "computed spending advice"
    );
    Ok(Advice {
        advice,
        lines,
        stats,
    })
}

pub(crate) fn spending_stats(transactions: &[Transaction]) -> AnalysisResult<SpendingStats> {
    let mut dated: Vec<(NaiveDate, &Transaction)> = transactions
        .iter()
        .map(|t| {
            NaiveDate::parse_from_str(&t.date, DATE_FORMAT)
                .map(|d| (d, t))
                .map_err(|e| {
                    AnalysisError::Computation(format!("invalid transaction date '{}': {e}", t.date))
                })
        })
        .collect::<AnalysisResult<_>>()?;
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.truncate(ADVICE_WINDOW);

    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut weekday_totals: BTreeMap<&'static str, Decimal> = BTreeMap::new();
    let mut expense_dates: Vec<(NaiveDate, Decimal)> = Vec::new();

    for &(date, txn) in &dated {
        if txn.is_income() {
            total_income = add(total_income, txn.amount, "total income")?;
            continue;
        }
        total_expenses = add(total_expenses, txn.amount, "total expenses")?;
        let category = by_category.entry(txn.category.as_str()).or_default();
        *category = add(*category, txn.amount, "category total")?;
        let weekday = weekday_totals.entry(weekday_name(date.weekday())).or_default();
        *weekday = add(*weekday, txn.amount, "weekday total")?;
        expense_dates.push((date, txn.amount));
    }

    // Ties go to the alphabetically first category.
    let mut top: Option<(&str, Decimal)> = None;
    for (&name, &total) in &by_category {
        if top.map_or(true, |(_, b)| total > b) {
            top = Some((name, total));
        }
    }
    let (top_category, top_total) = top.ok_or_else(|| {
        AnalysisError::Computation(format!(
            "no expense transactions among the {} most recent records",
            dated.len()
        ))
    })?;

    let savings_rate = if total_income > Decimal::ZERO {
        total_income
            .checked_sub(total_expenses)
            .and_then(|saved| saved.checked_div(total_income))
            .ok_or_else(|| AnalysisError::overflow("savings rate"))?
    } else {
        Decimal::ZERO
    };
    let top_category_pct = if total_expenses > Decimal::ZERO {
        top_total
            .checked_div(total_expenses)
            .ok_or_else(|| AnalysisError::overflow("top category share"))?
    } else {
        Decimal::ZERO
    };

    Ok(SpendingStats {
        total_income,
        total_expenses,
        savings_rate,
        top_category: top_category.to_string(),
        top_category_pct,
        weekday_totals,
        weekly_totals: weekly_totals(&expense_dates)?,
    })
}

fn add(total: Decimal, amount: Decimal, what: &str) -> AnalysisResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| AnalysisError::overflow(what))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

/// Sum expenses into Monday-based weeks, including empty weeks in between.
fn weekly_totals(expenses: &[(NaiveDate, Decimal)]) -> AnalysisResult<Vec<WeekTotal>> {
    let mut by_week: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for &(date, amount) in expenses {
        let week = by_week.entry(week_start(date)).or_default();
        *week = add(*week, amount, "weekly total")?;
    }
    let (Some(&first), Some(&last)) = (by_week.keys().next(), by_week.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut weeks = Vec::new();
    let mut current = first;
    while current <= last {
        weeks.push(WeekTotal {
            week_start: current,
            total: by_week.get(&current).copied().unwrap_or_default(),
        });
        current = current.checked_add_days(Days::new(7)).ok_or_else(|| {
            AnalysisError::Computation(format!("date overflow after {current}"))
        })?;
    }
    Ok(weeks)
}
