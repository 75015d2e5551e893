//! Pro-rating of an annual quota for monthly accrual.

use chrono::{Datelike, NaiveDate};

/// Days earned so far from `annual_quota` as of `as_of`.
///
/// The count starts on January 1st of `as_of`'s year, or on the hire date when
/// the employee joined during that year. The starting month counts in full, so
/// a March hire has seven months by September. The result is floored to whole
/// days and never exceeds `annual_quota`.
pub fn accrued(hire_date: NaiveDate, annual_quota: u32, as_of: NaiveDate) -> u32 {
    let year_start = NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of);
    let reference = if hire_date > year_start {
        hire_date
    } else {
        year_start
    };

    if reference > as_of {
        return 0;
    }

    let months = months_including_start(reference, as_of);
    let earned = f64::from(annual_quota) / 12.0 * f64::from(months);

    (earned.floor() as u32).min(annual_quota)
}

/// Calendar months from `from` to `to`, counting the month of `from` itself.
fn months_including_start(from: NaiveDate, to: NaiveDate) -> u32 {
    let span = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32 + 1;
    span.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mid_year_hire_counts_from_hire_month() {
        // March through September inclusive
        assert_eq!(accrued(date(2024, 3, 15), 12, date(2024, 9, 1)), 7);
    }

    #[test]
    fn earlier_hire_counts_from_january() {
        assert_eq!(accrued(date(2019, 6, 1), 12, date(2024, 4, 30)), 4);
    }

    #[test]
    fn partial_days_are_floored() {
        // 10 / 12 * 7 = 5.83
        assert_eq!(accrued(date(2024, 3, 15), 10, date(2024, 9, 1)), 5);
    }

    #[test]
    fn result_is_capped_at_annual_quota() {
        assert_eq!(accrued(date(2020, 1, 1), 12, date(2024, 12, 31)), 12);
        assert_eq!(accrued(date(2020, 1, 1), 18, date(2024, 12, 31)), 18);
    }

    #[test]
    fn hire_after_as_of_earns_nothing() {
        assert_eq!(accrued(date(2024, 10, 1), 12, date(2024, 9, 1)), 0);
    }

    #[test]
    fn is_deterministic_for_identical_inputs() {
        let first = accrued(date(2024, 2, 10), 15, date(2024, 8, 20));
        let second = accrued(date(2024, 2, 10), 15, date(2024, 8, 20));
        assert_eq!(first, second);
        assert_eq!(first, 8);
    }
}
