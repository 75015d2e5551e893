use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::collaborators::CollaboratorError;
use crate::model::leave_quota::LedgerError;
use crate::model::leave_request::LeaveStatus;
use crate::store::StoreError;

/// Why an employee may not use a leave category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligibility {
    #[error("leave category is inactive")]
    CategoryInactive,
    #[error("no eligibility rule matches and the category has no default quota")]
    NoMatchingRule,
    #[error("employee tenure does not meet any rule")]
    InsufficientTenure,
    #[error("employee has no grade assigned")]
    GradeRequired,
    #[error("no quota available")]
    NoQuotaAvailable,
}

/// Request timing and content policy failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("backdated requests are not allowed for this leave category")]
    BackdateNotAllowed,
    #[error("start date is {days} day(s) in the past, at most {max} allowed")]
    BackdateTooOld { days: i64, max: u32 },
    #[error("at least {required} day(s) notice required, got {given}")]
    InsufficientNotice { given: i64, required: u32 },
    #[error("start date is {days} day(s) ahead, at most {max} allowed")]
    TooFarInAdvance { days: i64, max: u32 },
    #[error("request spans {days} day(s), at most {max} allowed")]
    ExceedsMaxDuration { days: i64, max: u32 },
    #[error("dates overlap with leave request {request_id}")]
    OverlappingDates { request_id: u64 },
    #[error("an attachment is required for this request")]
    AttachmentRequired,
    #[error("attachment of {size} bytes exceeds the {max} byte limit")]
    AttachmentTooLarge { size: u64, max: u64 },
    #[error("attachment type {0} is not accepted")]
    AttachmentTypeNotAllowed(String),
    #[error("half-day leave is not allowed for this leave category")]
    HalfDayNotAllowed,
}

#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not eligible: {0}")]
    Ineligible(#[from] Ineligibility),
    #[error("{0}")]
    Policy(#[from] PolicyViolation),
    #[error("insufficient quota: {available} day(s) available, {requested} requested")]
    InsufficientQuota { available: f64, requested: f64 },
    #[error("quota would become negative ({resulting} day(s))")]
    NegativeQuota { resulting: f64 },
    #[error("leave request already processed (status: {0})")]
    AlreadyProcessed(LeaveStatus),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("operation failed: {0}")]
    Infrastructure(String),
}

impl LeaveError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LeaveError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for LeaveError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientQuota {
                available,
                requested,
            } => LeaveError::InsufficientQuota {
                available,
                requested,
            },
            LedgerError::NegativeQuota { resulting } => LeaveError::NegativeQuota { resulting },
            LedgerError::InvalidAmount(days) => {
                LeaveError::validation("days", format!("must be positive, got {days}"))
            }
            LedgerError::OutOfRange { .. } => LeaveError::validation("quota", err.to_string()),
            // pending and the request's reservation disagree; the store is inconsistent
            LedgerError::ReservationMismatch { .. } => LeaveError::Infrastructure(err.to_string()),
        }
    }
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => LeaveError::NotFound(entity),
            StoreError::AlreadyProcessed(status) => LeaveError::AlreadyProcessed(status),
            StoreError::Overlap { request_id } => {
                LeaveError::Policy(PolicyViolation::OverlappingDates { request_id })
            }
            StoreError::Ledger(ledger) => ledger.into(),
            StoreError::Corrupt(_) | StoreError::Database(_) => {
                tracing::error!(error = %err, "Leave store failure");
                LeaveError::Infrastructure(err.to_string())
            }
        }
    }
}

impl From<CollaboratorError> for LeaveError {
    fn from(err: CollaboratorError) -> Self {
        tracing::error!(error = %err, "Collaborator failure");
        LeaveError::Infrastructure(err.to_string())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation { .. }
            | LeaveError::Ineligible(_)
            | LeaveError::Policy(_)
            | LeaveError::InsufficientQuota { .. }
            | LeaveError::NegativeQuota { .. } => StatusCode::BAD_REQUEST,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::AlreadyProcessed(_) => StatusCode::CONFLICT,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Infrastructure(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
