//! Expiry-date arithmetic behind the license forms.
//!
//! The license API speaks in day counts (`expiresInDays`, `add-days`,
//! `remove-days`) while the forms speak in calendar dates. The conversions
//! live here so both directions stay consistent and testable.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors produced when validating a requested expiry date.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpiryError {
    /// The form value did not parse as a `YYYY-MM-DD` date.
    #[error("expiry date is not a valid date")]
    InvalidDate,
    /// The date parsed but is today or in the past.
    #[error("expiry date must be in the future")]
    NotInFuture,
}

/// Validate a form-supplied expiry date and convert it to a day count.
///
/// Tomorrow's date maps to 1 day. Today and anything earlier are rejected,
/// so the resulting count is always at least 1.
///
/// # Errors
///
/// Returns [`ExpiryError::InvalidDate`] for unparseable input and
/// [`ExpiryError::NotInFuture`] for dates that are not strictly after today.
pub fn days_for_new_expiry(value: &str) -> Result<i64, ExpiryError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ExpiryError::InvalidDate)?;
    let days = days_from_today(date);
    if days <= 0 {
        return Err(ExpiryError::NotInFuture);
    }
    Ok(days)
}

/// Whole days from now until `date` at local midnight, rounded up.
///
/// Tomorrow's date gives 1; today gives 0; past dates go negative.
#[must_use]
pub fn days_from_today(date: NaiveDate) -> i64 {
    days_between(date.and_time(NaiveTime::MIN), Local::now().naive_local())
}

/// Ceiling of the whole-day span from `now` to `target`.
#[must_use]
pub fn days_between(target: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let secs = target.signed_duration_since(now).num_seconds();
    if secs > 0 && secs % SECONDS_PER_DAY != 0 {
        secs / SECONDS_PER_DAY + 1
    } else {
        // Integer division truncates toward zero, which is already the
        // ceiling for negative spans and exact for whole-day spans.
        secs / SECONDS_PER_DAY
    }
}

/// Normalize an RFC 3339 timestamp or bare `YYYY-MM-DD` string to its UTC
/// calendar date.
///
/// Idempotent: feeding a returned date back in yields the same date.
#[must_use]
pub fn date_only(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Exact signed whole-day count between two calendar dates.
///
/// Both sides are already date-only, so no rounding is involved:
/// `difference_in_days(target, current)` is positive when `target` is later.
#[must_use]
pub fn difference_in_days(target: NaiveDate, current: NaiveDate) -> i64 {
    target.signed_duration_since(current).num_days()
}
