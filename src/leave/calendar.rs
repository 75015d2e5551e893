//! Day arithmetic for leave ranges.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{LeaveError, PolicyViolation};
use crate::model::leave_category::TimingPolicy;
use crate::model::leave_request::DurationType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCount {
    /// Inclusive calendar span, 0.5 for a single half day.
    pub total_days: f64,
    /// Weekdays only, first/last day halved per duration type.
    pub working_days: f64,
}

/// Outcome of the date-range checks that the request records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCheck {
    pub is_backdate: bool,
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive number of calendar days in the range.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Weekdays in the inclusive range, in order.
pub fn working_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| !is_weekend(*date))
        .collect()
}

pub fn count_days(start: NaiveDate, end: NaiveDate, duration: DurationType) -> DayCount {
    let total_days = if start == end && duration.is_half_day() {
        0.5
    } else {
        span_days(start, end).max(0) as f64
    };

    let working_days = working_dates(start, end)
        .into_iter()
        .map(|date| {
            let halved = (date == start && duration == DurationType::HalfDayAfternoon)
                || (date == end && duration == DurationType::HalfDayMorning);
            if halved { 0.5 } else { 1.0 }
        })
        .sum();

    DayCount {
        total_days,
        working_days,
    }
}

/// Checks a requested range against the category's timing policy.
///
/// Backdated requests skip the notice check; the backdate limit governs them.
pub fn validate_range(
    start: NaiveDate,
    end: NaiveDate,
    timing: &TimingPolicy,
    today: NaiveDate,
) -> Result<RangeCheck, LeaveError> {
    if start > end {
        return Err(LeaveError::validation(
            "end_date",
            "end_date cannot be before start_date",
        ));
    }

    let lead = (start - today).num_days();
    // Minimum notice only constrains future starts; backdates answer to the backdate limit.
    let is_backdate = lead < 0;

    if is_backdate {
        if !timing.allow_backdate {
            return Err(PolicyViolation::BackdateNotAllowed.into());
        }
        if let Some(max) = timing.backdate_max_days {
            if -lead > i64::from(max) {
                return Err(PolicyViolation::BackdateTooOld { days: -lead, max }.into());
            }
        }
    } else if let Some(required) = timing.min_notice_days {
        if lead < i64::from(required) {
            return Err(PolicyViolation::InsufficientNotice {
                given: lead,
                required,
            }
            .into());
        }
    }

    if let Some(max) = timing.max_advance_days {
        if lead > i64::from(max) {
            return Err(PolicyViolation::TooFarInAdvance { days: lead, max }.into());
        }
    }

    if let Some(max) = timing.max_days_per_request {
        let days = span_days(start, end);
        if days > i64::from(max) {
            return Err(PolicyViolation::ExceedsMaxDuration { days, max }.into());
        }
    }

    Ok(RangeCheck { is_backdate })
}
