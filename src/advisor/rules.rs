use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::SpendingStats;

/// Below this savings rate the advice flags low savings.
pub(crate) const LOW_SAVINGS_RATE: Decimal = dec!(0.10);
/// At or above this savings rate the advice is positive.
pub(crate) const TARGET_SAVINGS_RATE: Decimal = dec!(0.20);
/// Top category share above which a strong warning is given.
pub(crate) const CATEGORY_WARNING_SHARE: Decimal = dec!(0.40);
/// Top category share above which a mild suggestion is given.
pub(crate) const CATEGORY_HINT_SHARE: Decimal = dec!(0.25);
/// Busiest weekday total must exceed the quietest by this factor.
pub(crate) const WEEKDAY_SKEW_FACTOR: Decimal = dec!(2);
/// Last week must exceed the week before by this factor.
pub(crate) const WEEKLY_SPIKE_FACTOR: Decimal = dec!(1.3);
/// Weekly buckets needed before the trend rule is considered.
pub(crate) const MIN_TREND_WEEKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AdviceRule {
    LowSavings,
    OkSavings,
    GreatSavings,
    CategoryWarning,
    CategoryHint,
    WeekdaySkew,
    WeeklySpike,
    Healthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AdviceLine {
    pub(crate) rule: AdviceRule,
    pub(crate) message: String,
}

impl AdviceLine {
    fn new(rule: AdviceRule, message: String) -> Self {
        Self { rule, message }
    }
}

/// Evaluate every rule against the statistics. Never returns an empty list.
pub(crate) fn evaluate(stats: &SpendingStats) -> Vec<AdviceLine> {
    let mut lines = Vec::new();
    lines.push(savings_line(stats.savings_rate));
    lines.extend(category_line(&stats.top_category, stats.top_category_pct));
    lines.extend(weekday_line(stats));
    lines.extend(weekly_line(stats));

    if lines.is_empty() {
        lines.push(AdviceLine::new(
            AdviceRule::Healthy,
            "Your spending patterns look healthy. Keep tracking to maintain good habits!".into(),
        ));
    }
    lines
}

fn savings_line(rate: Decimal) -> AdviceLine {
    let pct = percent(rate);
    if rate < LOW_SAVINGS_RATE {
        AdviceLine::new(
            AdviceRule::LowSavings,
            format!("⚠️ Low savings rate ({pct}). Aim to save at least 20% of income."),
        )
    } else if rate < TARGET_SAVINGS_RATE {
        AdviceLine::new(
            AdviceRule::OkSavings,
            format!("Savings rate is okay ({pct}), but could improve to 20%+."),
        )
    } else {
        AdviceLine::new(
            AdviceRule::GreatSavings,
            format!("Great savings rate! ({pct}) Keep it up!"),
        )
    }
}

fn category_line(category: &str, share: Decimal) -> Option<AdviceLine> {
    if share > CATEGORY_WARNING_SHARE {
        Some(AdviceLine::new(
            AdviceRule::CategoryWarning,
            format!(
                "🚨 {category} is {} of spending. Consider budgeting this category.",
                percent(share)
            ),
        ))
    } else if share > CATEGORY_HINT_SHARE {
        Some(AdviceLine::new(
            AdviceRule::CategoryHint,
            format!("📊 Your top spending category is {category}. Look for potential savings here."),
        ))
    } else {
        None
    }
}

fn weekday_line(stats: &SpendingStats) -> Option<AdviceLine> {
    let (max_day, max_total) = stats.busiest_weekday()?;
    let (min_day, min_total) = stats.quietest_weekday()?;
    if !exceeds(max_total, min_total, WEEKDAY_SKEW_FACTOR) {
        return None;
    }
    let message = match ratio(max_total, min_total) {
        Some(r) => format!("📅 You spend {r}x more on {max_day}s than {min_day}s."),
        None => format!("📅 You spend on {max_day}s but almost nothing on {min_day}s."),
    };
    Some(AdviceLine::new(AdviceRule::WeekdaySkew, message))
}

fn weekly_line(stats: &SpendingStats) -> Option<AdviceLine> {
    let weeks = &stats.weekly_totals;
    if weeks.len() < MIN_TREND_WEEKS {
        return None;
    }
    let last = weeks[weeks.len() - 1].total;
    let prev = weeks[weeks.len() - 2].total;
    if !exceeds(last, prev, WEEKLY_SPIKE_FACTOR) {
        return None;
    }
    let message = match ratio(last, prev) {
        Some(r) => format!(
            "📈 Last week's spending was {r}x higher than previous week. Review recent purchases."
        ),
        None => "📈 Last week's spending came after a week with no expenses. Review recent purchases."
            .to_string(),
    };
    Some(AdviceLine::new(AdviceRule::WeeklySpike, message))
}

/// `value > factor * base`. A zero base is exceeded by any positive value.
fn exceeds(value: Decimal, base: Decimal, factor: Decimal) -> bool {
    match factor.checked_mul(base) {
        Some(threshold) => value > threshold,
        None => false,
    }
}

/// Whole-number percentage, e.g. 0.256 -> "26%".
pub(crate) fn percent(fraction: Decimal) -> String {
    match fraction.checked_mul(dec!(100)) {
        Some(pct) => format!("{}%", pct.round_dp(0).normalize()),
        None => format!("{:.0}%", fraction.to_f64().unwrap_or_default() * 100.0),
    }
}

/// One-decimal ratio, `None` when the denominator is zero.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<String> {
    if denominator.is_zero() {
        return None;
    }
    let value = numerator.to_f64()? / denominator.to_f64()?;
    Some(format!("{value:.1}"))
}
