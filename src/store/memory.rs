//! Mutex-guarded store. Every method holds the lock for its whole unit of
//! work, which gives the same all-or-nothing behaviour as a row lock.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{LeaveStore, Page, RequestFilter, StoreError, settlement};
use crate::model::leave_quota::{LeaveQuota, LedgerMutation, NewLeaveQuota};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, Transition};

/// Audit row written for each applied adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentRecord {
    pub quota_id: u64,
    pub delta: i32,
    pub actor_id: u64,
    pub reason: String,
}

#[derive(Default)]
struct MemoryState {
    last_quota_id: u64,
    last_request_id: u64,
    quotas: BTreeMap<u64, LeaveQuota>,
    requests: BTreeMap<u64, LeaveRequest>,
    adjustments: Vec<AdjustmentRecord>,
}

impl MemoryState {
    /// Applies a mutation to a copy and keeps it only if every rule holds.
    fn mutate(
        &mut self,
        company_id: u64,
        quota_id: u64,
        mutation: &LedgerMutation,
    ) -> Result<LeaveQuota, StoreError> {
        let mut quota = self
            .quotas
            .get(&quota_id)
            .filter(|quota| quota.company_id == company_id)
            .cloned()
            .ok_or(StoreError::NotFound("leave quota"))?;

        quota.apply(mutation)?;

        if let LedgerMutation::Adjust {
            delta,
            actor_id,
            reason,
        } = mutation
        {
            self.adjustments.push(AdjustmentRecord {
                quota_id,
                delta: *delta,
                actor_id: *actor_id,
                reason: reason.clone(),
            });
        }
        self.quotas.insert(quota_id, quota.clone());
        Ok(quota)
    }
}

#[derive(Default)]
pub struct InMemoryLeaveStore {
    state: Mutex<MemoryState>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Corrupt("leave store lock poisoned".to_string()))
    }

    /// Audit trail of applied adjustments, oldest first.
    pub fn adjustments(&self) -> Vec<AdjustmentRecord> {
        self.lock()
            .map(|state| state.adjustments.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn find_quota(
        &self,
        company_id: u64,
        employee_id: u64,
        leave_category_id: u64,
        year: i32,
    ) -> Result<Option<LeaveQuota>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .quotas
            .values()
            .find(|quota| {
                quota.company_id == company_id
                    && quota.employee_id == employee_id
                    && quota.leave_category_id == leave_category_id
                    && quota.year == year
            })
            .cloned())
    }

    async fn get_quota(
        &self,
        company_id: u64,
        quota_id: u64,
    ) -> Result<Option<LeaveQuota>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .quotas
            .get(&quota_id)
            .filter(|quota| quota.company_id == company_id)
            .cloned())
    }

    async fn list_quotas(
        &self,
        company_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveQuota>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .quotas
            .values()
            .filter(|quota| {
                quota.company_id == company_id
                    && quota.employee_id == employee_id
                    && quota.year == year
            })
            .cloned()
            .collect())
    }

    async fn insert_quota(&self, new: NewLeaveQuota) -> Result<Option<LeaveQuota>, StoreError> {
        let mut state = self.lock()?;
        let exists = state.quotas.values().any(|quota| {
            quota.employee_id == new.employee_id
                && quota.leave_category_id == new.leave_category_id
                && quota.year == new.year
        });
        if exists {
            return Ok(None);
        }

        state.last_quota_id += 1;
        let quota = LeaveQuota::from_new(state.last_quota_id, new);
        state.quotas.insert(quota.id, quota.clone());
        Ok(Some(quota))
    }

    async fn mutate_quota(
        &self,
        company_id: u64,
        quota_id: u64,
        mutation: LedgerMutation,
    ) -> Result<LeaveQuota, StoreError> {
        self.lock()?.mutate(company_id, quota_id, &mutation)
    }

    async fn submit_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut state = self.lock()?;

        if let Some(existing) = state.requests.values().find(|existing| {
            existing.company_id == new.company_id
                && existing.employee_id == new.employee_id
                && existing.status.holds_dates()
                && existing.overlaps(new.start_date, new.end_date)
        }) {
            return Err(StoreError::Overlap {
                request_id: existing.id,
            });
        }

        if let Some(quota_id) = new.quota_id {
            state.mutate(
                new.company_id,
                quota_id,
                &LedgerMutation::Reserve {
                    days: new.charged_days,
                },
            )?;
        }

        state.last_request_id += 1;
        let request = LeaveRequest::from_new(state.last_request_id, new);
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn transition_request(
        &self,
        company_id: u64,
        request_id: u64,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.lock()?;

        let mut request = state
            .requests
            .get(&request_id)
            .filter(|request| request.company_id == company_id)
            .cloned()
            .ok_or(StoreError::NotFound("leave request"))?;
        if !request.status.is_open() {
            return Err(StoreError::AlreadyProcessed(request.status));
        }

        if let (Some(quota_id), Some(mutation)) =
            (request.quota_id, settlement(&transition, request.charged_days))
        {
            state.mutate(company_id, quota_id, &mutation)?;
        }

        transition.stamp(&mut request);
        state.requests.insert(request_id, request.clone());
        Ok(request)
    }

    async fn get_request(
        &self,
        company_id: u64,
        request_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .requests
            .get(&request_id)
            .filter(|request| request.company_id == company_id)
            .cloned())
    }

    async fn list_requests(
        &self,
        company_id: u64,
        filter: &RequestFilter,
    ) -> Result<Page<LeaveRequest>, StoreError> {
        let state = self.lock()?;
        let matching: Vec<&LeaveRequest> = state
            .requests
            .values()
            .rev()
            .filter(|request| request.company_id == company_id && filter.matches(request))
            .collect();

        let data = matching
            .iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page() as usize)
            .map(|request| (*request).clone())
            .collect();

        Ok(Page {
            data,
            total: matching.len() as i64,
        })
    }
}
