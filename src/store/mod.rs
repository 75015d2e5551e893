//! Persistence of ledger entries and leave requests.
//!
//! Every mutating method is one all-or-nothing unit of work: the row is
//! locked, the pure domain rule is applied, and the result is written back
//! before anything else may touch the same row.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::model::leave_quota::{LeaveQuota, LedgerError, LedgerMutation, NewLeaveQuota};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest, Transition};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("leave request already processed (status: {0})")]
    AlreadyProcessed(LeaveStatus),
    #[error("dates overlap with leave request {request_id}")]
    Overlap { request_id: u64 },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Only requests starting in this year
    pub year: Option<i32>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Pagination per page number
    pub per_page: Option<u32>,
}

impl RequestFilter {
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.per_page()
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| request.employee_id == id)
            && self.status.is_none_or(|status| request.status == status)
            && self
                .year
                .is_none_or(|year| chrono::Datelike::year(&request.start_date) == year)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_quota(
        &self,
        company_id: u64,
        employee_id: u64,
        leave_category_id: u64,
        year: i32,
    ) -> Result<Option<LeaveQuota>, StoreError>;

    async fn get_quota(&self, company_id: u64, quota_id: u64)
    -> Result<Option<LeaveQuota>, StoreError>;

    async fn list_quotas(
        &self,
        company_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveQuota>, StoreError>;

    /// Creates the entry unless one exists for the same employee, category and year.
    /// Returns `None` when it already existed.
    async fn insert_quota(&self, quota: NewLeaveQuota) -> Result<Option<LeaveQuota>, StoreError>;

    /// Locks the entry, applies the mutation and writes it back. Adjustments
    /// are recorded in the audit trail within the same unit of work.
    async fn mutate_quota(
        &self,
        company_id: u64,
        quota_id: u64,
        mutation: LedgerMutation,
    ) -> Result<LeaveQuota, StoreError>;

    /// Rejects overlapping dates, stores the request in `waiting_approval` and
    /// reserves `charged_days` on its ledger entry, all or nothing.
    async fn submit_request(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    /// Moves a waiting request to its terminal status and consumes or releases
    /// the request's stored `charged_days` on the ledger entry, all or nothing.
    async fn transition_request(
        &self,
        company_id: u64,
        request_id: u64,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError>;

    async fn get_request(
        &self,
        company_id: u64,
        request_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError>;

    async fn list_requests(
        &self,
        company_id: u64,
        filter: &RequestFilter,
    ) -> Result<Page<LeaveRequest>, StoreError>;
}

/// Ledger mutation paired with a transition; `None` when nothing was reserved.
pub(crate) fn settlement(transition: &Transition, charged_days: f64) -> Option<LedgerMutation> {
    if charged_days <= 0.0 {
        return None;
    }
    Some(match transition {
        Transition::Approve { .. } => LedgerMutation::Consume { days: charged_days },
        Transition::Reject { .. } | Transition::Cancel { .. } => {
            LedgerMutation::Release { days: charged_days }
        }
    })
}
