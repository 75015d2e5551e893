use super::common::date;
use crate::error::{LeaveError, PolicyViolation};
use crate::leave::calendar::{count_days, validate_range, working_dates};
use crate::model::leave_category::TimingPolicy;
use crate::model::leave_request::DurationType;

#[test]
fn full_week_counts_five_working_days() {
    let days = count_days(date(2024, 6, 10), date(2024, 6, 16), DurationType::FullDay);

    assert_eq!(days.total_days, 7.0);
    assert_eq!(days.working_days, 5.0);
}

#[test]
fn single_half_day_counts_half() {
    let days = count_days(
        date(2024, 6, 12),
        date(2024, 6, 12),
        DurationType::HalfDayMorning,
    );

    assert_eq!(days.total_days, 0.5);
    assert_eq!(days.working_days, 0.5);
}

#[test]
fn half_day_only_trims_one_end_of_a_range() {
    let afternoon = count_days(
        date(2024, 6, 10),
        date(2024, 6, 12),
        DurationType::HalfDayAfternoon,
    );
    let morning = count_days(
        date(2024, 6, 10),
        date(2024, 6, 12),
        DurationType::HalfDayMorning,
    );

    assert_eq!(afternoon.working_days, 2.5);
    assert_eq!(morning.working_days, 2.5);
    assert_eq!(afternoon.total_days, 3.0);
}

#[test]
fn weekend_only_range_has_no_working_days() {
    let days = count_days(date(2024, 6, 15), date(2024, 6, 16), DurationType::FullDay);

    assert_eq!(days.total_days, 2.0);
    assert_eq!(days.working_days, 0.0);
    assert!(working_dates(date(2024, 6, 15), date(2024, 6, 16)).is_empty());
}

#[test]
fn end_before_start_is_a_validation_error() {
    let result = validate_range(
        date(2024, 6, 12),
        date(2024, 6, 10),
        &TimingPolicy::default(),
        date(2024, 6, 1),
    );

    assert!(matches!(
        result,
        Err(LeaveError::Validation {
            field: "end_date",
            ..
        })
    ));
}

#[test]
fn backdate_needs_permission_and_stays_within_limit() {
    let today = date(2024, 6, 20);
    let mut timing = TimingPolicy::default();

    let refused = validate_range(date(2024, 6, 17), date(2024, 6, 17), &timing, today);
    assert!(matches!(
        refused,
        Err(LeaveError::Policy(PolicyViolation::BackdateNotAllowed))
    ));

    timing.allow_backdate = true;
    timing.backdate_max_days = Some(5);
    let allowed = validate_range(date(2024, 6, 17), date(2024, 6, 17), &timing, today).unwrap();
    assert!(allowed.is_backdate);

    let too_old = validate_range(date(2024, 6, 10), date(2024, 6, 10), &timing, today);
    assert!(matches!(
        too_old,
        Err(LeaveError::Policy(PolicyViolation::BackdateTooOld { days: 10, max: 5 }))
    ));
}

#[test]
fn backdated_starts_are_not_held_to_minimum_notice() {
    let today = date(2024, 6, 20);
    let timing = TimingPolicy {
        min_notice_days: Some(7),
        allow_backdate: true,
        backdate_max_days: Some(5),
        ..TimingPolicy::default()
    };

    let backdated = validate_range(date(2024, 6, 18), date(2024, 6, 18), &timing, today).unwrap();
    assert!(backdated.is_backdate);
    assert!(matches!(
        validate_range(date(2024, 6, 10), date(2024, 6, 10), &timing, today),
        Err(LeaveError::Policy(PolicyViolation::BackdateTooOld { days: 10, max: 5 }))
    ));
    assert!(matches!(
        validate_range(date(2024, 6, 21), date(2024, 6, 21), &timing, today),
        Err(LeaveError::Policy(PolicyViolation::InsufficientNotice {
            given: 1,
            required: 7
        }))
    ));
}

#[test]
fn notice_advance_and_span_limits() {
    let today = date(2024, 6, 3);
    let timing = TimingPolicy {
        max_days_per_request: Some(5),
        min_notice_days: Some(7),
        max_advance_days: Some(60),
        allow_backdate: false,
        backdate_max_days: None,
    };

    assert!(matches!(
        validate_range(date(2024, 6, 5), date(2024, 6, 5), &timing, today),
        Err(LeaveError::Policy(PolicyViolation::InsufficientNotice {
            given: 2,
            required: 7
        }))
    ));
    assert!(matches!(
        validate_range(date(2024, 9, 2), date(2024, 9, 2), &timing, today),
        Err(LeaveError::Policy(PolicyViolation::TooFarInAdvance { max: 60, .. }))
    ));
    assert!(matches!(
        validate_range(date(2024, 6, 17), date(2024, 6, 23), &timing, today),
        Err(LeaveError::Policy(PolicyViolation::ExceedsMaxDuration { days: 7, max: 5 }))
    ));

    let ok = validate_range(date(2024, 6, 17), date(2024, 6, 21), &timing, today).unwrap();
    assert!(!ok.is_backdate);
}
