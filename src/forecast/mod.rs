//! Seven-day spending forecast.
//!
//! Two models are refit from scratch on every call: a random forest over the
//! calendar and rolling features, and a quadratic trend over the day offset
//! alone. Their predictions are blended with fixed weights and wrapped in a
//! band whose half-width is the average rolling standard deviation.

mod forest;
mod trend;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::features::{self, DailyAggregate, ROLLING_WINDOW};
use crate::models::Transaction;

use forest::{ForestConfig, RandomForest};
use trend::PolynomialTrend;

/// Minimum number of Expense records, and of distinct expense days.
pub(crate) const MIN_FORECAST_RECORDS: usize = 14;
pub(crate) const FORECAST_HORIZON: u64 = 7;

pub(crate) const FOREST_WEIGHT: f64 = 0.7;
pub(crate) const TREND_WEIGHT: f64 = 0.3;

const FOREST_CONFIG: ForestConfig = ForestConfig {
    n_trees: 100,
    seed: 42,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ForecastPoint {
    pub(crate) date: NaiveDate,
    pub(crate) predicted_amount: f64,
    pub(crate) confidence_low: f64,
    pub(crate) confidence_high: f64,
    pub(crate) weekday_name: &'static str,
}

/// Forecast the next seven days of spending from Expense transactions.
pub(crate) fn compute_forecast(expenses: &[Transaction]) -> AnalysisResult<Vec<ForecastPoint>> {
    let found = expenses.iter().filter(|t| t.is_expense()).count();
    if found < MIN_FORECAST_RECORDS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_FORECAST_RECORDS,
            found,
            unit: "expense transactions",
        });
    }

    let series = features::build_daily_series(expenses)?;
    forecast_series(&series)
}

/// Forecast from an already built daily series.
pub(crate) fn forecast_series(series: &[DailyAggregate]) -> AnalysisResult<Vec<ForecastPoint>> {
    if series.len() < MIN_FORECAST_RECORDS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_FORECAST_RECORDS,
            found: series.len(),
            unit: "days of expenses",
        });
    }
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(AnalysisError::Computation("empty daily series".into()));
    };

    let targets: Vec<f64> = series.iter().map(|d| d.total_amount).collect();
    let rows: Vec<Vec<f64>> = series
        .iter()
        .map(|d| forest_row(d.day_offset, d.date, d.rolling_mean_7))
        .collect();
    let offsets: Vec<f64> = series.iter().map(|d| d.day_offset as f64).collect();

    let forest = RandomForest::fit(&rows, &targets, FOREST_CONFIG)?;
    let trend = PolynomialTrend::fit(&offsets, &targets)?;

    // One snapshot of the recent level, shared by every future day.
    let recent_mean = features::mean(&targets[targets.len().saturating_sub(ROLLING_WINDOW)..]);
    // The first day's zero std counts toward the average.
    let band = features::mean(&series.iter().map(|d| d.rolling_std_7).collect::<Vec<_>>());

    let mut points = Vec::with_capacity(FORECAST_HORIZON as usize);
    for ahead in 1..=FORECAST_HORIZON {
        let date = last.date.checked_add_days(Days::new(ahead)).ok_or_else(|| {
            AnalysisError::Computation(format!("date overflow after {}", last.date))
        })?;
        let day_offset = (date - first.date).num_days();

        let forest_pred = forest.predict(&forest_row(day_offset, date, recent_mean));
        let trend_pred = trend.predict(day_offset as f64);
        let blended = FOREST_WEIGHT * forest_pred + TREND_WEIGHT * trend_pred;
        if !blended.is_finite() {
            return Err(AnalysisError::Computation(format!(
                "non-finite prediction for {date}"
            )));
        }

        let predicted_amount = blended.max(0.0);
        points.push(ForecastPoint {
            date,
            predicted_amount,
            confidence_low: (predicted_amount - band).max(0.0),
            confidence_high: predicted_amount + band,
            weekday_name: features::weekday_name(date.weekday()),
        });
    }

    tracing::info!(
        days = series.len(),
        band,
        recent_mean,
        "computed {FORECAST_HORIZON}-day forecast"
    );
    Ok(points)
}

/// Feature order: day offset, day of week, weekend flag, rolling mean.
fn forest_row(day_offset: i64, date: NaiveDate, rolling_mean: f64) -> Vec<f64> {
    let weekday = date.weekday();
    vec![
        day_offset as f64,
        weekday.num_days_from_monday() as f64,
        if features::is_weekend(weekday) { 1.0 } else { 0.0 },
        rolling_mean,
    ]
}

#[cfg(test)]
mod tests;
