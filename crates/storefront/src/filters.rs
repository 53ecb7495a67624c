//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as money with two decimals.
///
/// Usage in templates: `{{ cart.total|money }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn money(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = amount.to_string();
    Ok(raw.parse::<rust_decimal::Decimal>().map_or_else(
        |_| format!("${raw}"),
        |d| format!("${:.2}", d.round_dp(2)),
    ))
}
