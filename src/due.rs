//! Due-date expressions and the overdue predicate.
//!
//! Resolution is a pure function of the expression and the date passed in as
//! "today", so callers decide what today means (the wall clock in the CLI, a
//! fixed date in tests).
//!
//! Supported forms:
//! - `YYYY-MM-DD`
//! - `today`, `tomorrow`
//! - `+Nd` (N days ahead), `+Nw` (N weeks ahead)
//! - `next week` (+7 days), `next month` (+30 days, not calendar aware)

use chrono::{Days, NaiveDate};

use crate::error::{Result, TaskError};
use crate::fields::Status;

const DAYS_PER_WEEK: u64 = 7;
// Approximate: 30 days per month
const DAYS_PER_MONTH: u64 = 30;

/// Resolve a due-date expression against `today`.
pub fn resolve(expression: &str, today: NaiveDate) -> Result<NaiveDate> {
    let text = expression.trim().to_lowercase();

    match text.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return days_after(today, 1, expression),
        "next week" => return days_after(today, DAYS_PER_WEEK, expression),
        "next month" => return days_after(today, DAYS_PER_MONTH, expression),
        _ => {}
    }

    if let Some(rest) = text.strip_prefix('+') {
        return resolve_offset(rest, today, expression);
    }

    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|_| TaskError::UnrecognizedDateExpression(expression.to_string()))
}

/// `rest` is what follows the `+`, e.g. `3d` or `2w`.
fn resolve_offset(rest: &str, today: NaiveDate, expression: &str) -> Result<NaiveDate> {
    let (amount, unit) = if let Some(n) = rest.strip_suffix('d') {
        (n, 1)
    } else if let Some(n) = rest.strip_suffix('w') {
        (n, DAYS_PER_WEEK)
    } else {
        return Err(TaskError::UnrecognizedDateExpression(expression.to_string()));
    };

    let amount = amount.trim();
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TaskError::InvalidRelativeAmount(expression.to_string()));
    }
    let days = amount
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .ok_or_else(|| TaskError::InvalidRelativeAmount(expression.to_string()))?;

    days_after(today, days, expression)
}

fn days_after(today: NaiveDate, days: u64, expression: &str) -> Result<NaiveDate> {
    today
        .checked_add_days(Days::new(days))
        .ok_or_else(|| TaskError::InvalidRelativeAmount(expression.to_string()))
}

/// A task is overdue when it has a due date strictly before `today` and has
/// not been completed.
pub fn is_overdue(due: Option<NaiveDate>, status: Status, today: NaiveDate) -> bool {
    match due {
        Some(d) => d < today && status != Status::Completed,
        None => false,
    }
}
