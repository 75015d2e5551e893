//! Quota ledger operations and allocation.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::collaborators::{Clock, EmployeeDirectory, LeaveCategoryCatalog};
use crate::error::{Ineligibility, LeaveError};
use crate::leave::eligibility::{self, Grant};
use crate::model::actor::Actor;
use crate::model::employee::Employee;
use crate::model::leave_category::{AccrualMethod, LeaveCategory};
use crate::model::leave_quota::{LeaveQuota, LedgerMutation, NewLeaveQuota};
use crate::store::LeaveStore;

/// Per-employee counts from an allocation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AllocationSummary {
    #[schema(example = 12)]
    pub created: u32,
    #[schema(example = 3)]
    pub already_allocated: u32,
    #[schema(example = 1)]
    pub ineligible: u32,
    #[schema(example = 0)]
    pub failed: u32,
}

enum AllocationOutcome {
    Created,
    AlreadyAllocated,
    Ineligible,
}

impl AllocationSummary {
    fn record(&mut self, outcome: Result<AllocationOutcome, LeaveError>) {
        match outcome {
            Ok(AllocationOutcome::Created) => self.created += 1,
            Ok(AllocationOutcome::AlreadyAllocated) => self.already_allocated += 1,
            Ok(AllocationOutcome::Ineligible) => self.ineligible += 1,
            Err(_) => self.failed += 1,
        }
    }
}

pub struct QuotaLedger {
    store: Arc<dyn LeaveStore>,
    employees: Arc<dyn EmployeeDirectory>,
    categories: Arc<dyn LeaveCategoryCatalog>,
    clock: Arc<dyn Clock>,
}

impl QuotaLedger {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        employees: Arc<dyn EmployeeDirectory>,
        categories: Arc<dyn LeaveCategoryCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            employees,
            categories,
            clock,
        }
    }

    pub async fn reserve(
        &self,
        company_id: u64,
        quota_id: u64,
        days: f64,
    ) -> Result<LeaveQuota, LeaveError> {
        self.mutate(company_id, quota_id, LedgerMutation::Reserve { days })
            .await
    }

    pub async fn consume(
        &self,
        company_id: u64,
        quota_id: u64,
        days: f64,
    ) -> Result<LeaveQuota, LeaveError> {
        self.mutate(company_id, quota_id, LedgerMutation::Consume { days })
            .await
    }

    pub async fn release(
        &self,
        company_id: u64,
        quota_id: u64,
        days: f64,
    ) -> Result<LeaveQuota, LeaveError> {
        self.mutate(company_id, quota_id, LedgerMutation::Release { days })
            .await
    }

    /// HR correction of a ledger entry. Rejected as a whole if it would
    /// leave the entry overdrawn.
    pub async fn adjust(
        &self,
        actor: &Actor,
        quota_id: u64,
        delta: i32,
        reason: &str,
    ) -> Result<LeaveQuota, LeaveError> {
        actor.require_hr_or_admin()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::validation("reason", "an adjustment needs a reason"));
        }
        if delta == 0 {
            return Err(LeaveError::validation("delta", "must not be zero"));
        }

        let quota = self
            .mutate(
                actor.company_id,
                quota_id,
                LedgerMutation::Adjust {
                    delta,
                    actor_id: actor.user_id,
                    reason: reason.to_string(),
                },
            )
            .await?;

        info!(
            quota_id,
            delta,
            actor_id = actor.user_id,
            reason,
            available = quota.available(),
            "Leave quota adjusted"
        );
        Ok(quota)
    }

    /// Re-derives the granted buckets from the category's current rules.
    /// Used, pending and adjustment buckets are left untouched.
    pub async fn recalculate(&self, actor: &Actor, quota_id: u64) -> Result<LeaveQuota, LeaveError> {
        actor.require_hr_or_admin()?;

        let quota = self.get(actor, quota_id).await?;
        let employee = self
            .employees
            .get_by_id(actor.company_id, quota.employee_id)
            .await?
            .ok_or(LeaveError::NotFound("employee"))?;
        let category = self.category(actor.company_id, quota.leave_category_id).await?;

        let as_of = self.reference_date(quota.year);
        let grant = match eligibility::evaluate(&employee, &category, as_of) {
            Ok(entitlement) => entitlement.grant(&category, employee.hire_date, as_of)?,
            Err(Ineligibility::CategoryInactive) => {
                return Err(Ineligibility::CategoryInactive.into());
            }
            // rules no longer cover this employee
            Err(_) => Grant {
                opening_balance: 0,
                earned_quota: 0,
            },
        };

        let updated = self
            .mutate(
                actor.company_id,
                quota_id,
                LedgerMutation::Rebase {
                    opening_balance: grant.opening_balance,
                    earned_quota: grant.earned_quota,
                },
            )
            .await?;

        info!(
            quota_id,
            opening_balance = grant.opening_balance,
            earned_quota = grant.earned_quota,
            actor_id = actor.user_id,
            "Leave quota recalculated"
        );
        Ok(updated)
    }

    /// Raises `earned_quota` of a monthly-accrual entry to today's figure.
    pub async fn sync_accrual(
        &self,
        quota: LeaveQuota,
        employee: &Employee,
        category: &LeaveCategory,
    ) -> Result<LeaveQuota, LeaveError> {
        if category.accrual_method != AccrualMethod::Monthly {
            return Ok(quota);
        }

        let as_of = self.reference_date(quota.year);
        let entitlement = match eligibility::evaluate(employee, category, as_of) {
            Ok(entitlement) => entitlement,
            Err(_) => return Ok(quota),
        };
        let grant = entitlement.grant(category, employee.hire_date, as_of)?;
        if grant.earned_quota <= quota.earned_quota {
            return Ok(quota);
        }

        debug!(
            quota_id = quota.id,
            from = quota.earned_quota,
            to = grant.earned_quota,
            "Syncing accrued quota"
        );
        self.mutate(
            quota.company_id,
            quota.id,
            LedgerMutation::Accrue {
                earned_quota: grant.earned_quota,
            },
        )
        .await
    }

    pub async fn get(&self, actor: &Actor, quota_id: u64) -> Result<LeaveQuota, LeaveError> {
        let quota = self
            .store
            .get_quota(actor.company_id, quota_id)
            .await?
            .ok_or(LeaveError::NotFound("leave quota"))?;
        actor.require_self_or_hr(quota.employee_id)?;
        Ok(quota)
    }

    pub async fn find(
        &self,
        company_id: u64,
        employee_id: u64,
        leave_category_id: u64,
        year: i32,
    ) -> Result<Option<LeaveQuota>, LeaveError> {
        Ok(self
            .store
            .find_quota(company_id, employee_id, leave_category_id, year)
            .await?)
    }

    pub async fn list_for_employee(
        &self,
        actor: &Actor,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveQuota>, LeaveError> {
        actor.require_self_or_hr(employee_id)?;
        Ok(self
            .store
            .list_quotas(actor.company_id, employee_id, year)
            .await?)
    }

    /// Grants a newly created quota-bearing category to every active employee.
    pub async fn allocate_for_category(
        &self,
        actor: &Actor,
        category_id: u64,
        year: i32,
    ) -> Result<AllocationSummary, LeaveError> {
        actor.require_hr_or_admin()?;

        let category = self.category(actor.company_id, category_id).await?;
        if !category.has_quota {
            return Err(LeaveError::validation(
                "leave_category_id",
                "category does not track quota",
            ));
        }
        let employees = self.employees.active_by_company(actor.company_id).await?;

        let outcomes = join_all(
            employees
                .iter()
                .map(|employee| self.allocate_one(employee, &category, year)),
        )
        .await;

        let mut summary = AllocationSummary::default();
        outcomes
            .into_iter()
            .for_each(|outcome| summary.record(outcome));

        info!(
            category_id,
            year,
            created = summary.created,
            already_allocated = summary.already_allocated,
            ineligible = summary.ineligible,
            failed = summary.failed,
            "Allocated leave quota for category"
        );
        Ok(summary)
    }

    /// Grants every active quota-bearing category to one newly onboarded employee.
    pub async fn allocate_for_employee(
        &self,
        actor: &Actor,
        employee_id: u64,
        year: i32,
    ) -> Result<AllocationSummary, LeaveError> {
        actor.require_hr_or_admin()?;

        let employee = self
            .employees
            .get_by_id(actor.company_id, employee_id)
            .await?
            .ok_or(LeaveError::NotFound("employee"))?;
        let categories = self.categories.active_by_company(actor.company_id).await?;

        let mut summary = AllocationSummary::default();
        for category in categories.iter().filter(|category| category.has_quota) {
            summary.record(self.allocate_one(&employee, category, year).await);
        }

        info!(
            employee_id,
            year,
            created = summary.created,
            already_allocated = summary.already_allocated,
            ineligible = summary.ineligible,
            failed = summary.failed,
            "Allocated leave quota for employee"
        );
        Ok(summary)
    }

    async fn allocate_one(
        &self,
        employee: &Employee,
        category: &LeaveCategory,
        year: i32,
    ) -> Result<AllocationOutcome, LeaveError> {
        let existing = self
            .store
            .find_quota(employee.company_id, employee.id, category.id, year)
            .await
            .inspect_err(|e| warn!(error = %e, employee_id = employee.id, "Quota lookup failed"))?;
        if existing.is_some() {
            return Ok(AllocationOutcome::AlreadyAllocated);
        }

        let as_of = self.reference_date(year);
        let entitlement = match eligibility::evaluate(employee, category, as_of) {
            Ok(entitlement) if entitlement.annual_quota > 0 => entitlement,
            Ok(_) | Err(_) => {
                debug!(
                    employee_id = employee.id,
                    category_id = category.id,
                    "Employee not eligible, skipping allocation"
                );
                return Ok(AllocationOutcome::Ineligible);
            }
        };

        let grant = entitlement.grant(category, employee.hire_date, as_of)?;
        let inserted = self
            .store
            .insert_quota(NewLeaveQuota {
                company_id: employee.company_id,
                employee_id: employee.id,
                leave_category_id: category.id,
                year,
                opening_balance: grant.opening_balance,
                earned_quota: grant.earned_quota,
                rollover_quota: 0,
            })
            .await
            .inspect_err(|e| warn!(error = %e, employee_id = employee.id, "Quota insert failed"))?;

        Ok(match inserted {
            Some(quota) => {
                debug!(
                    quota_id = quota.id,
                    employee_id = employee.id,
                    annual_quota = entitlement.annual_quota,
                    "Leave quota allocated"
                );
                AllocationOutcome::Created
            }
            // lost a race with a concurrent allocation
            None => AllocationOutcome::AlreadyAllocated,
        })
    }

    async fn mutate(
        &self,
        company_id: u64,
        quota_id: u64,
        mutation: LedgerMutation,
    ) -> Result<LeaveQuota, LeaveError> {
        let label = mutation.label();
        self.store
            .mutate_quota(company_id, quota_id, mutation)
            .await
            .inspect_err(|e| debug!(error = %e, quota_id, operation = label, "Ledger operation refused"))
            .map_err(LeaveError::from)
    }

    async fn category(&self, company_id: u64, category_id: u64) -> Result<LeaveCategory, LeaveError> {
        self.categories
            .get_by_id(company_id, category_id)
            .await?
            .ok_or(LeaveError::NotFound("leave category"))
    }

    pub fn current_year(&self) -> i32 {
        self.clock.today().year()
    }

    /// Today, clamped into the ledger year.
    fn reference_date(&self, year: i32) -> NaiveDate {
        let today = self.clock.today();
        match today.year().cmp(&year) {
            std::cmp::Ordering::Equal => today,
            std::cmp::Ordering::Less => NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today),
            std::cmp::Ordering::Greater => NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today),
        }
    }
}
