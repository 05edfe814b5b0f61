// 📅 Duration Calculator - whole months worked inside the FUNDEF window
//
// Month rule: the end date is inclusive. The count is the largest n such that
// start + n months <= end + 1 day, where adding months clamps the day to the
// end of the target month (Jan 31 + 1 month = Feb 28/29).

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_MONTHS: u32 = 1;
pub const MAX_MONTHS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("effective start {start} is after effective end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Eligibility window that every tenure is clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EligibilityWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        EligibilityWindow { start, end }
    }

    /// FUNDEF was in force from 1998-01-01 until it was replaced by FUNDEB in 2007.
    pub fn fundef() -> Self {
        EligibilityWindow {
            start: NaiveDate::from_ymd_opt(1998, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2006, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn unrestricted() -> Self {
        EligibilityWindow {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn months_worked(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, DurationError> {
        months_worked(start, end, self.start, self.end)
    }
}

impl Default for EligibilityWindow {
    fn default() -> Self {
        Self::fundef()
    }
}

/// Whole months between `start` and `end` after clipping both to the window,
/// clamped to [`MIN_MONTHS`, `MAX_MONTHS`].
pub fn months_worked(
    start: NaiveDate,
    end: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<u32, DurationError> {
    let effective_start = start.max(window_start);
    let effective_end = end.min(window_end);

    if effective_start > effective_end {
        return Err(DurationError::InvalidRange {
            start: effective_start,
            end: effective_end,
        });
    }

    let raw = whole_months(effective_start, effective_end);
    Ok(raw.clamp(MIN_MONTHS, MAX_MONTHS))
}

/// Unclamped month count for `start <= end`.
fn whole_months(start: NaiveDate, end: NaiveDate) -> u32 {
    let boundary = end.succ_opt().unwrap_or(end);

    let span = (boundary.year() - start.year()) * 12 + boundary.month() as i32
        - start.month() as i32;
    if span <= 0 {
        return 0;
    }

    let mut months = span as u32;
    match start.checked_add_months(Months::new(months)) {
        Some(reached) if reached <= boundary => {}
        _ => months -= 1,
    }
    months
}
