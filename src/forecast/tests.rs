#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::TransactionKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn expense(category: &str, amount: Decimal, date: NaiveDate) -> Transaction {
    Transaction::new(
        TransactionKind::Expense,
        category,
        amount,
        "",
        &date.format("%Y-%m-%d").to_string(),
    )
    .unwrap()
}

fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(n))
        .unwrap()
}

fn daily_expenses(days: u64, amount: impl Fn(u64) -> Decimal) -> Vec<Transaction> {
    (0..days).map(|d| expense("Food", amount(d), day(d))).collect()
}

fn varied(d: u64) -> Decimal {
    Decimal::from((d * 37 % 23) * 5 + 10)
}

#[test]
fn test_constant_spending_forecast() {
    let txns = daily_expenses(20, |_| dec!(100));
    let points = compute_forecast(&txns).unwrap();
    assert_eq!(points.len(), 7);
    for p in &points {
        assert!((p.predicted_amount - 100.0).abs() < 1e-6, "{p:?}");
        assert!((p.confidence_high - p.predicted_amount).abs() < 1e-9);
        assert!((p.predicted_amount - p.confidence_low).abs() < 1e-9);
    }
}

#[test]
fn test_dates_follow_last_observed_day() {
    let txns = daily_expenses(20, varied);
    let points = compute_forecast(&txns).unwrap();
    assert_eq!(points.len(), 7);
    for (i, p) in points.iter().enumerate() {
        assert_eq!(p.date, day(20 + i as u64));
    }
}

#[test]
fn test_dates_follow_last_day_with_gaps_and_unsorted_input() {
    // Every other day, newest first
    let mut txns: Vec<Transaction> = (0..16)
        .map(|d| expense("Food", varied(d), day(d * 2)))
        .collect();
    txns.reverse();
    let points = compute_forecast(&txns).unwrap();
    assert_eq!(points[0].date, day(31));
    assert_eq!(points[6].date, day(37));
}

#[test]
fn test_weekday_names_match_dates() {
    let txns = daily_expenses(14, varied);
    let points = compute_forecast(&txns).unwrap();
    // day(14) is 2024-01-15, a Monday
    let names: Vec<&str> = points.iter().map(|p| p.weekday_name).collect();
    assert_eq!(
        names,
        vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
    );
}

#[test]
fn test_band_ordering_and_non_negative() {
    let txns = daily_expenses(30, varied);
    for p in compute_forecast(&txns).unwrap() {
        assert!(p.confidence_low >= 0.0);
        assert!(p.predicted_amount >= 0.0);
        assert!(p.confidence_low <= p.predicted_amount);
        assert!(p.predicted_amount <= p.confidence_high);
    }
}

#[test]
fn test_band_width_is_shared() {
    let txns = daily_expenses(30, varied);
    let points = compute_forecast(&txns).unwrap();
    let upper = points[0].confidence_high - points[0].predicted_amount;
    assert!(upper > 0.0);
    for p in &points {
        assert!((p.confidence_high - p.predicted_amount - upper).abs() < 1e-9);
        if p.confidence_low > 0.0 {
            assert!((p.predicted_amount - p.confidence_low - upper).abs() < 1e-9);
        }
    }
}

#[test]
fn test_band_is_mean_rolling_std() {
    let txns = daily_expenses(21, varied);
    let series = features::build_daily_series(&txns).unwrap();
    let expected = series.iter().map(|d| d.rolling_std_7).sum::<f64>() / series.len() as f64;
    let points = forecast_series(&series).unwrap();
    assert!((points[0].confidence_high - points[0].predicted_amount - expected).abs() < 1e-9);
}

#[test]
fn test_low_band_clamped_at_zero() {
    // Mostly zero spending with rare spikes: wide band, small prediction
    let txns = daily_expenses(21, |d| if d % 7 == 3 { dec!(500) } else { dec!(0) });
    for p in compute_forecast(&txns).unwrap() {
        assert!(p.confidence_low >= 0.0);
        assert!(p.confidence_low <= p.predicted_amount);
    }
}

#[test]
fn test_too_few_records_is_insufficient() {
    let txns = daily_expenses(13, |_| dec!(10));
    let err = compute_forecast(&txns).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InsufficientData {
            required: 14,
            found: 13,
            unit: "expense transactions",
        }
    );
    assert!(err.is_insufficient_data());
}

#[test]
fn test_too_few_distinct_days_is_insufficient() {
    // 20 records but only 10 distinct days
    let txns: Vec<Transaction> = (0..20)
        .map(|i| expense("Food", dec!(10), day(i / 2)))
        .collect();
    let err = compute_forecast(&txns).unwrap_err();
    assert!(err.is_insufficient_data());
    assert!(err.to_string().contains("days"));
}

#[test]
fn test_income_does_not_count_toward_minimum() {
    let mut txns = daily_expenses(10, |_| dec!(10));
    for d in 10..20 {
        txns.push(
            Transaction::new(
                TransactionKind::Income,
                "Pay",
                dec!(100),
                "",
                &day(d).format("%Y-%m-%d").to_string(),
            )
            .unwrap(),
        );
    }
    assert!(compute_forecast(&txns).unwrap_err().is_insufficient_data());
}

#[test]
fn test_invalid_date_is_computation_error() {
    let mut txns = daily_expenses(20, |_| dec!(10));
    txns[3].date = "2024-13-45".into();
    let err = compute_forecast(&txns).unwrap_err();
    assert!(matches!(err, AnalysisError::Computation(_)));
}

#[test]
fn test_forecast_is_deterministic() {
    let txns = daily_expenses(25, varied);
    assert_eq!(
        compute_forecast(&txns).unwrap(),
        compute_forecast(&txns).unwrap()
    );
}

#[test]
fn test_rising_spend_forecasts_above_early_level() {
    let txns = daily_expenses(28, |d| Decimal::from(10 + d * 5));
    let points = compute_forecast(&txns).unwrap();
    // Early days averaged well under 50; the forecast should track recent levels.
    assert!(points.iter().all(|p| p.predicted_amount > 100.0));
}

#[test]
fn test_weekly_spike_lands_on_same_weekday() {
    // A spike every Thursday; day(24) is the next Thursday after the data
    let txns = daily_expenses(21, |d| if d % 7 == 3 { dec!(500) } else { dec!(0) });
    let points = compute_forecast(&txns).unwrap();
    let spike = &points[3];
    assert_eq!(spike.weekday_name, "Thursday");
    assert!(points
        .iter()
        .filter(|p| p.date != spike.date)
        .all(|p| p.predicted_amount < spike.predicted_amount));
}
