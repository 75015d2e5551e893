use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    WaitingApproval,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Only requests still waiting for a decision may change state.
    pub fn is_open(&self) -> bool {
        matches!(self, LeaveStatus::WaitingApproval)
    }

    /// Statuses that still block the dates for other requests.
    pub fn holds_dates(&self) -> bool {
        matches!(self, LeaveStatus::WaitingApproval | LeaveStatus::Approved)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DurationType {
    #[default]
    FullDay,
    /// Off in the morning: the last day of the range counts as half.
    HalfDayMorning,
    /// Off in the afternoon: the first day of the range counts as half.
    HalfDayAfternoon,
}

impl DurationType {
    pub fn is_half_day(&self) -> bool {
        !matches!(self, DurationType::FullDay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub company_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub leave_category_id: u64,
    /// Ledger entry holding the reservation; absent for categories without quota.
    #[schema(example = 42, nullable = true)]
    pub quota_id: Option<u64>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub duration_type: DurationType,
    #[schema(example = 5.0)]
    pub total_days: f64,
    #[schema(example = 5.0)]
    pub working_days: f64,
    /// Days reserved on `quota_id` at submission; settled with exactly this amount.
    #[schema(example = 5.0)]
    pub charged_days: f64,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[schema(nullable = true)]
    pub attachment_url: Option<String>,
    pub status: LeaveStatus,
    pub is_backdate: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(nullable = true)]
    pub approved_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub rejection_reason: Option<String>,
}

/// A validated request ready to be stored together with its reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub company_id: u64,
    pub employee_id: u64,
    pub leave_category_id: u64,
    pub quota_id: Option<u64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_type: DurationType,
    pub total_days: f64,
    pub working_days: f64,
    /// Days reserved on `quota_id`; equals either total or working days depending on the category.
    pub charged_days: f64,
    pub reason: String,
    pub attachment_url: Option<String>,
    pub is_backdate: bool,
    pub submitted_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn from_new(id: u64, new: NewLeaveRequest) -> Self {
        Self {
            id,
            company_id: new.company_id,
            employee_id: new.employee_id,
            leave_category_id: new.leave_category_id,
            quota_id: new.quota_id,
            start_date: new.start_date,
            end_date: new.end_date,
            duration_type: new.duration_type,
            total_days: new.total_days,
            working_days: new.working_days,
            charged_days: new.charged_days,
            reason: new.reason,
            attachment_url: new.attachment_url,
            status: LeaveStatus::WaitingApproval,
            is_backdate: new.is_backdate,
            submitted_at: new.submitted_at,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
        }
    }

    /// Inclusive date overlap with another range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// State change requested on a waiting request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Approve { approver_id: u64, at: DateTime<Utc> },
    Reject { approver_id: u64, reason: String, at: DateTime<Utc> },
    Cancel { actor_id: u64, at: DateTime<Utc> },
}

impl Transition {
    pub fn target(&self) -> LeaveStatus {
        match self {
            Transition::Approve { .. } => LeaveStatus::Approved,
            Transition::Reject { .. } => LeaveStatus::Rejected,
            Transition::Cancel { .. } => LeaveStatus::Cancelled,
        }
    }

    /// Stamps the decision onto the request. Callers check the status first.
    pub fn stamp(&self, request: &mut LeaveRequest) {
        request.status = self.target();
        match self {
            Transition::Approve { approver_id, at } => {
                request.approved_by = Some(*approver_id);
                request.approved_at = Some(*at);
            }
            Transition::Reject {
                approver_id,
                reason,
                at,
            } => {
                request.approved_by = Some(*approver_id);
                request.approved_at = Some(*at);
                request.rejection_reason = Some(reason.clone());
            }
            Transition::Cancel { actor_id, at } => {
                request.approved_by = Some(*actor_id);
                request.approved_at = Some(*at);
            }
        }
    }
}
