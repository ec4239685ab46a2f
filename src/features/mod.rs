//! Daily feature construction for the spending forecast.
//!
//! Expense records are collapsed into one row per observed calendar date.
//! Missing days are not filled in: a gap in the data is a gap in the series.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Transaction, DATE_FORMAT};

/// Trailing window length for the rolling mean and standard deviation.
pub(crate) const ROLLING_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DailyAggregate {
    pub(crate) date: NaiveDate,
    pub(crate) total_amount: f64,
    pub(crate) transaction_count: usize,
    pub(crate) dominant_category: String,
    /// Monday = 0 .. Sunday = 6
    pub(crate) day_of_week: u32,
    pub(crate) is_weekend: bool,
    /// Days since the earliest observed date.
    pub(crate) day_offset: i64,
    pub(crate) rolling_mean_7: f64,
    /// Sample standard deviation; 0 while the window holds a single day.
    pub(crate) rolling_std_7: f64,
}

struct DayBucket<'a> {
    date: NaiveDate,
    total: Decimal,
    count: usize,
    /// Categories in first-seen order with their counts.
    categories: Vec<(&'a str, usize)>,
}

impl<'a> DayBucket<'a> {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total: Decimal::ZERO,
            count: 0,
            categories: Vec::new(),
        }
    }

    fn add(&mut self, txn: &'a Transaction) -> AnalysisResult<()> {
        self.total = self.total.checked_add(txn.amount).ok_or_else(|| {
            AnalysisError::overflow(&format!("daily total on {}", self.date))
        })?;
        self.count += 1;
        match self
            .categories
            .iter()
            .position(|(name, _)| *name == txn.category)
        {
            Some(i) => self.categories[i].1 += 1,
            None => self.categories.push((txn.category.as_str(), 1)),
        }
        Ok(())
    }

    /// Most frequent category; ties go to the one seen first.
    fn dominant_category(&self) -> &'a str {
        let mut best: Option<(&'a str, usize)> = None;
        for &(name, n) in &self.categories {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((name, n));
            }
        }
        best.map(|(name, _)| name).unwrap_or_default()
    }
}

/// Build the ordered daily series from Expense transactions.
///
/// Input order does not matter. Income records are ignored. Any unparseable
/// date fails the whole build.
pub(crate) fn build_daily_series(transactions: &[Transaction]) -> AnalysisResult<Vec<DailyAggregate>> {
    let mut dated: Vec<(NaiveDate, &Transaction)> = Vec::with_capacity(transactions.len());
    for txn in transactions.iter().filter(|t| t.is_expense()) {
        let date = NaiveDate::parse_from_str(&txn.date, DATE_FORMAT).map_err(|e| {
            AnalysisError::Computation(format!("invalid transaction date '{}': {e}", txn.date))
        })?;
        dated.push((date, txn));
    }
    // Stable, so same-day records keep their input order for tie-breaking.
    dated.sort_by_key(|(date, _)| *date);

    let mut buckets: Vec<DayBucket> = Vec::new();
    for (date, txn) in dated {
        if buckets.last().map_or(true, |b| b.date != date) {
            buckets.push(DayBucket::new(date));
        }
        if let Some(bucket) = buckets.last_mut() {
            bucket.add(txn)?;
        }
    }

    let Some(first_date) = buckets.first().map(|b| b.date) else {
        return Ok(Vec::new());
    };

    let mut series = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        let total_amount = bucket.total.to_f64().ok_or_else(|| {
            AnalysisError::Computation(format!(
                "daily total {} on {} is not representable",
                bucket.total, bucket.date
            ))
        })?;
        let day_of_week = bucket.date.weekday().num_days_from_monday();
        series.push(DailyAggregate {
            date: bucket.date,
            total_amount,
            transaction_count: bucket.count,
            dominant_category: bucket.dominant_category().to_string(),
            day_of_week,
            is_weekend: is_weekend(bucket.date.weekday()),
            day_offset: (bucket.date - first_date).num_days(),
            rolling_mean_7: 0.0,
            rolling_std_7: 0.0,
        });
    }

    let totals: Vec<f64> = series.iter().map(|d| d.total_amount).collect();
    for (i, day) in series.iter_mut().enumerate() {
        let window = &totals[(i + 1).saturating_sub(ROLLING_WINDOW)..=i];
        day.rolling_mean_7 = mean(window);
        day.rolling_std_7 = sample_std(window);
    }

    tracing::debug!(
        transactions = transactions.len(),
        days = series.len(),
        "built daily expense series"
    );
    Ok(series)
}

pub(crate) fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

pub(crate) fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with n-1 normalization. Zero for fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
