//! Eligibility evaluation over a category's rule set.
//!
//! [`evaluate`] answers "may this employee use the category, and with what
//! annual figure" and is shared by allocation and request admission.
//! [`check_balance`] is the admission-only question of whether anything is
//! left on the ledger right now.

use chrono::{Datelike, NaiveDate};

use crate::error::Ineligibility;
use crate::leave::accrual;
use crate::model::employee::Employee;
use crate::model::leave_category::{
    AccrualMethod, CombinedRule, EligibilityRules, LeaveCategory, RuleConditions,
};
use crate::model::leave_quota::{LeaveQuota, LedgerError};

/// Where the annual figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaSource {
    /// Index of the first matching rule.
    Rule(usize),
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub annual_quota: u32,
    pub source: QuotaSource,
}

/// Opening buckets of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub opening_balance: i32,
    pub earned_quota: i32,
}

impl Entitlement {
    /// Splits the annual figure into upfront and accrued parts.
    ///
    /// Monthly categories earn progressively, so nothing is granted upfront.
    pub fn grant(
        &self,
        category: &LeaveCategory,
        hire_date: NaiveDate,
        as_of: NaiveDate,
    ) -> Result<Grant, LedgerError> {
        let days = match category.accrual_method {
            AccrualMethod::Monthly => accrual::accrued(hire_date, self.annual_quota, as_of),
            AccrualMethod::Yearly | AccrualMethod::Daily | AccrualMethod::None => self.annual_quota,
        };
        let days = i32::try_from(days).map_err(|_| LedgerError::OutOfRange {
            resulting: i64::from(days),
        })?;

        Ok(match category.accrual_method {
            AccrualMethod::Monthly => Grant {
                opening_balance: 0,
                earned_quota: days,
            },
            AccrualMethod::Yearly | AccrualMethod::Daily | AccrualMethod::None => Grant {
                opening_balance: days,
                earned_quota: 0,
            },
        })
    }
}

/// Whole months of service, floored at zero.
pub fn tenure_months(hire_date: NaiveDate, as_of: NaiveDate) -> u32 {
    let mut months = (as_of.year() - hire_date.year()) * 12 + as_of.month() as i32
        - hire_date.month() as i32;
    if as_of.day() < hire_date.day() {
        months -= 1;
    }
    months.max(0) as u32
}

pub fn evaluate(
    employee: &Employee,
    category: &LeaveCategory,
    as_of: NaiveDate,
) -> Result<Entitlement, Ineligibility> {
    if !category.is_active {
        return Err(Ineligibility::CategoryInactive);
    }

    let rules = &category.eligibility_rules;
    let tenure = tenure_months(employee.hire_date, as_of);

    let matched = match rules {
        EligibilityRules::Fixed { default_quota } => {
            return Ok(Entitlement {
                annual_quota: *default_quota,
                source: QuotaSource::Default,
            });
        }
        EligibilityRules::Tenure { rules, .. } => first_match(rules, |rule| {
            within(tenure, rule.min_months, rule.max_months).then_some(rule.quota)
        }),
        EligibilityRules::Position { rules, .. } => first_match(rules, |rule| {
            rule.position_ids
                .contains(&employee.position_id)
                .then_some(rule.quota)
        }),
        EligibilityRules::Grade { rules, .. } => {
            let grade_id = employee.grade_id.ok_or(Ineligibility::GradeRequired)?;
            first_match(rules, |rule| {
                rule.grade_ids.contains(&grade_id).then_some(rule.quota)
            })
        }
        EligibilityRules::EmploymentType { rules, .. } => first_match(rules, |rule| {
            (rule.employment_type == employee.employment_type).then_some(rule.quota)
        }),
        EligibilityRules::Combined { rules, .. } => first_match(rules, |rule| {
            combined_matches(rule, employee, tenure).then_some(rule.quota)
        }),
    };

    if let Some((index, annual_quota)) = matched {
        return Ok(Entitlement {
            annual_quota,
            source: QuotaSource::Rule(index),
        });
    }

    match rules.default_quota() {
        0 if matches!(rules, EligibilityRules::Tenure { .. }) => {
            Err(Ineligibility::InsufficientTenure)
        }
        0 => Err(Ineligibility::NoMatchingRule),
        quota => Ok(Entitlement {
            annual_quota: quota,
            source: QuotaSource::Default,
        }),
    }
}

/// Admission-time balance check against an existing ledger entry.
pub fn check_balance(quota: &LeaveQuota) -> Result<(), Ineligibility> {
    if quota.available() <= 0.0 {
        Err(Ineligibility::NoQuotaAvailable)
    } else {
        Ok(())
    }
}

fn within(tenure: u32, min: Option<u32>, max: Option<u32>) -> bool {
    tenure >= min.unwrap_or(0) && max.is_none_or(|max| tenure < max)
}

fn combined_matches(rule: &CombinedRule, employee: &Employee, tenure: u32) -> bool {
    let RuleConditions {
        position_ids,
        grade_ids,
        employment_type,
        min_tenure_months,
        max_tenure_months,
    } = &rule.conditions;

    if let Some(ids) = position_ids {
        if !ids.contains(&employee.position_id) {
            return false;
        }
    }
    if let Some(ids) = grade_ids {
        match employee.grade_id {
            Some(grade_id) if ids.contains(&grade_id) => {}
            _ => return false,
        }
    }
    if let Some(kind) = employment_type {
        if *kind != employee.employment_type {
            return false;
        }
    }
    within(tenure, *min_tenure_months, *max_tenure_months)
}

/// Index and quota of the first rule that matches.
fn first_match<R>(rules: &[R], matches: impl Fn(&R) -> Option<u32>) -> Option<(usize, u32)> {
    rules
        .iter()
        .enumerate()
        .find_map(|(index, rule)| matches(rule).map(|quota| (index, quota)))
}
