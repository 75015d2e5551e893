use super::common::*;
use crate::error::Ineligibility;
use crate::leave::eligibility::{QuotaSource, check_balance, evaluate, tenure_months};
use crate::model::employee::EmploymentType;
use crate::model::leave_category::{
    AccrualMethod, CombinedRule, EligibilityRules, EmploymentTypeRule, GradeRule, PositionRule,
    RuleConditions,
};
use crate::model::leave_quota::{LeaveQuota, LedgerError, NewLeaveQuota};

fn with_rules(rules: EligibilityRules) -> crate::model::leave_category::LeaveCategory {
    let mut category = annual_leave(1);
    category.eligibility_rules = rules;
    category
}

#[test]
fn tenure_counts_whole_months() {
    assert_eq!(tenure_months(date(2024, 1, 15), date(2025, 7, 15)), 18);
    assert_eq!(tenure_months(date(2024, 1, 15), date(2025, 7, 14)), 17);
    assert_eq!(tenure_months(date(2024, 1, 15), date(2024, 1, 1)), 0);
}

#[test]
fn first_matching_tenure_rule_wins() {
    let category = with_rules(tenure_rules());
    let eighteen_months = employee(1, date(2024, 1, 15));

    let entitlement = evaluate(&eighteen_months, &category, date(2025, 7, 15)).unwrap();

    assert_eq!(entitlement.annual_quota, 12);
    assert_eq!(entitlement.source, QuotaSource::Rule(1));
}

#[test]
fn tenure_upper_bound_is_exclusive() {
    let category = with_rules(tenure_rules());
    let one_year = employee(1, date(2024, 6, 1));

    let exactly = evaluate(&one_year, &category, date(2025, 6, 1)).unwrap();
    let just_before = evaluate(&one_year, &category, date(2025, 5, 31)).unwrap();

    assert_eq!(exactly.annual_quota, 12);
    assert_eq!(just_before.annual_quota, 6);
}

#[test]
fn tenure_without_match_or_default_is_insufficient() {
    let category = with_rules(tenure_rules());
    let veteran = employee(1, date(2015, 1, 1));

    assert_eq!(
        evaluate(&veteran, &category, date(2025, 1, 1)),
        Err(Ineligibility::InsufficientTenure)
    );
}

#[test]
fn unmatched_rules_fall_back_to_default() {
    let category = with_rules(EligibilityRules::Position {
        default_quota: 8,
        rules: vec![PositionRule {
            quota: 20,
            position_ids: vec![99],
        }],
    });

    let entitlement = evaluate(&employee(1, date(2020, 1, 1)), &category, date(2025, 1, 1)).unwrap();

    assert_eq!(entitlement.annual_quota, 8);
    assert_eq!(entitlement.source, QuotaSource::Default);
}

#[test]
fn position_without_match_and_zero_default_is_not_eligible() {
    let category = with_rules(EligibilityRules::Position {
        default_quota: 0,
        rules: vec![PositionRule {
            quota: 20,
            position_ids: vec![99],
        }],
    });

    assert_eq!(
        evaluate(&employee(1, date(2020, 1, 1)), &category, date(2025, 1, 1)),
        Err(Ineligibility::NoMatchingRule)
    );
}

#[test]
fn grade_rules_require_a_grade() {
    let category = with_rules(EligibilityRules::Grade {
        default_quota: 10,
        rules: vec![GradeRule {
            quota: 15,
            grade_ids: vec![2, 3],
        }],
    });
    let mut ungraded = employee(1, date(2020, 1, 1));
    ungraded.grade_id = None;

    assert_eq!(
        evaluate(&ungraded, &category, date(2025, 1, 1)),
        Err(Ineligibility::GradeRequired)
    );
    let graded = evaluate(&employee(2, date(2020, 1, 1)), &category, date(2025, 1, 1)).unwrap();
    assert_eq!(graded.annual_quota, 15);
}

#[test]
fn employment_type_matches_exactly() {
    let category = with_rules(EligibilityRules::EmploymentType {
        default_quota: 0,
        rules: vec![
            EmploymentTypeRule {
                quota: 3,
                employment_type: EmploymentType::Contract,
            },
            EmploymentTypeRule {
                quota: 14,
                employment_type: EmploymentType::Permanent,
            },
        ],
    });

    let entitlement = evaluate(&employee(1, date(2020, 1, 1)), &category, date(2025, 1, 1)).unwrap();

    assert_eq!(entitlement.annual_quota, 14);
    assert_eq!(entitlement.source, QuotaSource::Rule(1));
}

#[test]
fn combined_rule_needs_every_present_condition() {
    let category = with_rules(EligibilityRules::Combined {
        default_quota: 0,
        rules: vec![
            CombinedRule {
                quota: 25,
                conditions: RuleConditions {
                    position_ids: Some(vec![3]),
                    grade_ids: Some(vec![5]),
                    ..RuleConditions::default()
                },
            },
            CombinedRule {
                quota: 18,
                conditions: RuleConditions {
                    position_ids: Some(vec![3]),
                    employment_type: Some(EmploymentType::Permanent),
                    min_tenure_months: Some(24),
                    ..RuleConditions::default()
                },
            },
        ],
    });

    let senior = evaluate(&employee(1, date(2020, 1, 1)), &category, date(2025, 1, 1)).unwrap();
    assert_eq!(senior.annual_quota, 18);

    assert_eq!(
        evaluate(&employee(2, date(2024, 6, 1)), &category, date(2025, 1, 1)),
        Err(Ineligibility::NoMatchingRule)
    );
}

#[test]
fn combined_grade_condition_fails_without_grade() {
    let category = with_rules(EligibilityRules::Combined {
        default_quota: 0,
        rules: vec![CombinedRule {
            quota: 10,
            conditions: RuleConditions {
                grade_ids: Some(vec![2]),
                ..RuleConditions::default()
            },
        }],
    });
    let mut ungraded = employee(1, date(2020, 1, 1));
    ungraded.grade_id = None;

    assert_eq!(
        evaluate(&ungraded, &category, date(2025, 1, 1)),
        Err(Ineligibility::NoMatchingRule)
    );
}

#[test]
fn inactive_category_is_rejected_first() {
    let mut category = annual_leave(1);
    category.is_active = false;

    assert_eq!(
        evaluate(&employee(1, date(2020, 1, 1)), &category, date(2025, 1, 1)),
        Err(Ineligibility::CategoryInactive)
    );
}

#[test]
fn monthly_grant_starts_from_zero_opening_balance() {
    let mut category = annual_leave(1);
    category.accrual_method = AccrualMethod::Monthly;
    let hire = date(2024, 3, 15);
    let as_of = date(2024, 9, 1);

    let entitlement = evaluate(&employee(1, hire), &category, as_of).unwrap();
    let grant = entitlement.grant(&category, hire, as_of).unwrap();

    assert_eq!(grant.opening_balance, 0);
    assert_eq!(grant.earned_quota, 7);
}

#[test]
fn balance_check_needs_something_left() {
    let mut quota = LeaveQuota::from_new(
        1,
        NewLeaveQuota {
            company_id: COMPANY,
            employee_id: 1,
            leave_category_id: 1,
            year: 2025,
            opening_balance: 2,
            earned_quota: 0,
            rollover_quota: 0,
        },
    );
    assert_eq!(check_balance(&quota), Ok(()));

    quota.pending_quota = 2.0;
    assert_eq!(check_balance(&quota), Err(Ineligibility::NoQuotaAvailable));
}

#[test]
fn grant_beyond_the_integer_range_is_refused() {
    let mut category = annual_leave(1);
    category.eligibility_rules = EligibilityRules::Fixed {
        default_quota: u32::MAX,
    };
    let hire = date(2020, 1, 1);
    let as_of = date(2024, 6, 1);

    let entitlement = evaluate(&employee(1, hire), &category, as_of).unwrap();

    assert_eq!(
        entitlement.grant(&category, hire, as_of),
        Err(LedgerError::OutOfRange {
            resulting: i64::from(u32::MAX)
        })
    );
}
