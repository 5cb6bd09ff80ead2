//! Period-token parsing for the `:period` path segment.

use crate::domain::SdDate;
use crate::engine::Period;
use crate::error::AppError;

/// Resolve a period token against the current date.
///
/// Accepts `all`, `today`, `yesterday`, `week` (Monday through today),
/// `month` (1st through today) or an explicit `YYYY-MM-DD..YYYY-MM-DD`
/// range. Dates must be zero-padded ISO; anything else breaks the
/// lexicographic filtering downstream and is rejected here.
pub fn resolve_period(token: &str) -> Result<Period, AppError> {
    let token = token.trim();
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(AppError::BadRequest(
                "period start must be <= end".to_string(),
            ));
        }
        return Ok(Period::bounded(start, end));
    }

    let today = SdDate::today();
    match token {
        "all" => Ok(Period::all()),
        "today" => Ok(Period::single_day(today)),
        "yesterday" => {
            let yesterday = today
                .pred()
                .ok_or_else(|| AppError::Internal("date arithmetic failed".to_string()))?;
            Ok(Period::single_day(yesterday))
        }
        "week" => {
            let start = today
                .week_start()
                .ok_or_else(|| AppError::Internal("date arithmetic failed".to_string()))?;
            Ok(Period::bounded(start, today))
        }
        "month" => {
            let start = today
                .month_start()
                .ok_or_else(|| AppError::Internal("date arithmetic failed".to_string()))?;
            Ok(Period::bounded(start, today))
        }
        other => Err(AppError::BadRequest(format!(
            "unknown period: {} (expected all, today, yesterday, week, month or a date range)",
            other
        ))),
    }
}

fn parse_date(raw: &str) -> Result<SdDate, AppError> {
    let raw = raw.trim();
    let date = SdDate::new(raw);
    match date.as_naive() {
        Some(d) if d.format("%Y-%m-%d").to_string() == raw => Ok(date),
        _ => Err(AppError::BadRequest(format!("invalid date: {}", raw))),
    }
}
