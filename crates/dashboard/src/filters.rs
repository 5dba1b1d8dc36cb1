//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

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

/// Renders a value, or "-" when it is blank.
///
/// Table cells for optional backend fields (bindings, expiry dates) use
/// this instead of repeating the empty check inline.
///
/// Usage in templates: `{{ row.binding|or_dash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn or_dash(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let rendered = value.to_string();
    if rendered.trim().is_empty() {
        Ok("-".to_owned())
    } else {
        Ok(rendered)
    }
}
