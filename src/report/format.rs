use rust_decimal::Decimal;

/// Dollar amount with thousands separators, e.g. `-1234.5` -> `"-$1,234.50"`.
pub(crate) fn format_amount(val: Decimal) -> String {
    let val = val.round_dp(2);
    let fixed = format!("{:.2}", val.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if val.is_sign_negative() && !val.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// Cut `s` to at most `max` characters, marking a cut with "…".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let kept: String = s.chars().take(max - 1).collect();
    format!("{kept}…")
}
