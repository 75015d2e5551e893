//! Leave request lifecycle: submission, decision and cancellation.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::collaborators::{
    AttachmentStorage, AttendanceRecorder, Clock, EmployeeDirectory, LeaveCategoryCatalog,
    Notification, NotificationKind, Notifier,
};
use crate::error::{LeaveError, PolicyViolation};
use crate::leave::calendar;
use crate::leave::eligibility;
use crate::leave::ledger::QuotaLedger;
use crate::model::actor::Actor;
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::leave_category::{DeductionType, LeaveCategory};
use crate::model::leave_request::{DurationType, LeaveRequest, NewLeaveRequest, Transition};
use crate::store::{LeaveStore, Page, RequestFilter};

/// An uploaded supporting document, as returned by the upload step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentRef {
    #[schema(example = "1000/4c1f0a52-medical.pdf")]
    pub stored_path: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    #[schema(example = 48213)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl AttachmentLimits {
    pub fn check(&self, content_type: &str, size_bytes: u64) -> Result<(), PolicyViolation> {
        if size_bytes > self.max_bytes {
            return Err(PolicyViolation::AttachmentTooLarge {
                size: size_bytes,
                max: self.max_bytes,
            });
        }
        let accepted = self
            .allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type.trim()));
        if !accepted {
            return Err(PolicyViolation::AttachmentTypeNotAllowed(
                content_type.to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 3)]
    pub leave_category_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub duration_type: DurationType,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[serde(default)]
    pub attachment: Option<AttachmentRef>,
}

/// Days a request is charged on its ledger entry.
pub fn charged_days(request_total: f64, request_working: f64, category: &LeaveCategory) -> f64 {
    match category.deduction_type {
        DeductionType::WorkingDays => request_working,
        DeductionType::CalendarDays => request_total,
    }
}

/// Stored paths are `<employee_id>/<name>`; anything else is not the caller's upload.
fn owns_attachment(employee_id: u64, stored_path: &str) -> bool {
    stored_path
        .strip_prefix(&format!("{employee_id}/"))
        .is_some_and(|name| !name.is_empty() && !name.contains(['/', '\\']) && name != "..")
}

pub struct LeaveRequestService {
    store: Arc<dyn LeaveStore>,
    ledger: Arc<QuotaLedger>,
    employees: Arc<dyn EmployeeDirectory>,
    categories: Arc<dyn LeaveCategoryCatalog>,
    attachments: Arc<dyn AttachmentStorage>,
    attendance: Arc<dyn AttendanceRecorder>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    limits: AttachmentLimits,
}

impl LeaveRequestService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn LeaveStore>,
        ledger: Arc<QuotaLedger>,
        employees: Arc<dyn EmployeeDirectory>,
        categories: Arc<dyn LeaveCategoryCatalog>,
        attachments: Arc<dyn AttachmentStorage>,
        attendance: Arc<dyn AttendanceRecorder>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        limits: AttachmentLimits,
    ) -> Self {
        Self {
            store,
            ledger,
            employees,
            categories,
            attachments,
            attendance,
            notifier,
            clock,
            limits,
        }
    }

    /// Validates and submits a request for the acting employee, reserving its days.
    pub async fn create(&self, actor: &Actor, input: CreateLeave) -> Result<LeaveRequest, LeaveError> {
        let employee_id = actor.require_employee()?;
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::validation("reason", "must not be empty"));
        }

        let employee = self
            .employees
            .get_by_id(actor.company_id, employee_id)
            .await?
            .ok_or(LeaveError::NotFound("employee"))?;
        let category = self.category(actor.company_id, input.leave_category_id).await?;

        let today = self.clock.today();
        eligibility::evaluate(&employee, &category, today)?;

        if input.duration_type.is_half_day() && !category.allow_half_day {
            return Err(PolicyViolation::HalfDayNotAllowed.into());
        }
        let range = calendar::validate_range(input.start_date, input.end_date, &category.timing, today)?;
        if input.start_date.year() != input.end_date.year() {
            return Err(LeaveError::validation(
                "end_date",
                "a request cannot span two leave years",
            ));
        }

        let days = calendar::count_days(input.start_date, input.end_date, input.duration_type);
        let charged = charged_days(days.total_days, days.working_days, &category);
        if charged <= 0.0 {
            return Err(LeaveError::validation(
                "end_date",
                "the range contains no chargeable days",
            ));
        }

        let attachment_url = match &input.attachment {
            Some(attachment) => {
                if !owns_attachment(employee_id, &attachment.stored_path) {
                    return Err(LeaveError::Forbidden("Attachment belongs to another employee"));
                }
                self.limits
                    .check(&attachment.content_type, attachment.size_bytes)?;
                Some(self.attachments.resolve_url(&attachment.stored_path))
            }
            None if category.attachment.is_required(days.working_days) => {
                return Err(PolicyViolation::AttachmentRequired.into());
            }
            None => None,
        };

        let quota_id = if category.has_quota {
            let quota = self
                .ledger
                .find(
                    actor.company_id,
                    employee_id,
                    category.id,
                    input.start_date.year(),
                )
                .await?
                .ok_or(LeaveError::NotFound("leave quota"))?;
            let quota = self.ledger.sync_accrual(quota, &employee, &category).await?;
            eligibility::check_balance(&quota)?;
            Some(quota.id)
        } else {
            None
        };

        let request = self
            .store
            .submit_request(NewLeaveRequest {
                company_id: actor.company_id,
                employee_id,
                leave_category_id: category.id,
                quota_id,
                start_date: input.start_date,
                end_date: input.end_date,
                duration_type: input.duration_type,
                total_days: days.total_days,
                working_days: days.working_days,
                charged_days: charged,
                reason: reason.to_string(),
                attachment_url,
                is_backdate: range.is_backdate,
                submitted_at: self.clock.now(),
            })
            .await?;

        info!(
            request_id = request.id,
            employee_id,
            category_id = category.id,
            days = charged,
            "Leave request submitted"
        );
        self.notify(
            &request,
            NotificationKind::LeaveSubmitted,
            "Leave request submitted",
            format!(
                "Your {} request from {} to {} is waiting for approval",
                category.name, request.start_date, request.end_date
            ),
        );
        Ok(request)
    }

    pub async fn approve(&self, actor: &Actor, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        actor.require_hr_or_admin()?;
        let transition = Transition::Approve {
            approver_id: actor.user_id,
            at: self.clock.now(),
        };
        let request = self.decide(actor, request_id, transition).await?;

        // ledger and request are committed; attendance is best effort from here
        self.record_attendance(&request, actor.user_id).await;
        self.notify(
            &request,
            NotificationKind::LeaveApproved,
            "Leave request approved",
            format!(
                "Your leave from {} to {} has been approved",
                request.start_date, request.end_date
            ),
        );
        Ok(request)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        request_id: u64,
        reason: &str,
    ) -> Result<LeaveRequest, LeaveError> {
        actor.require_hr_or_admin()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::validation("rejection_reason", "must not be empty"));
        }
        let transition = Transition::Reject {
            approver_id: actor.user_id,
            reason: reason.to_string(),
            at: self.clock.now(),
        };
        let request = self.decide(actor, request_id, transition).await?;

        self.notify(
            &request,
            NotificationKind::LeaveRejected,
            "Leave request rejected",
            format!(
                "Your leave from {} to {} was rejected: {}",
                request.start_date, request.end_date, reason
            ),
        );
        Ok(request)
    }

    /// Withdraws a request that is still waiting for a decision.
    pub async fn cancel(&self, actor: &Actor, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        let current = self.get(actor, request_id).await?;
        let transition = Transition::Cancel {
            actor_id: actor.user_id,
            at: self.clock.now(),
        };
        let request = self.settle(actor, &current, transition).await?;

        self.notify(
            &request,
            NotificationKind::LeaveCancelled,
            "Leave request cancelled",
            format!(
                "Your leave from {} to {} has been cancelled",
                request.start_date, request.end_date
            ),
        );
        Ok(request)
    }

    pub async fn get(&self, actor: &Actor, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        let request = self
            .store
            .get_request(actor.company_id, request_id)
            .await?
            .ok_or(LeaveError::NotFound("leave request"))?;
        actor.require_self_or_hr(request.employee_id)?;
        Ok(request)
    }

    /// Lists requests; employees only ever see their own.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: RequestFilter,
    ) -> Result<Page<LeaveRequest>, LeaveError> {
        if !actor.role.is_hr_or_admin() {
            filter.employee_id = Some(actor.require_employee()?);
        }
        Ok(self.store.list_requests(actor.company_id, &filter).await?)
    }

    /// Checks declared type and size, then hands the bytes to file storage.
    pub async fn upload_attachment(
        &self,
        actor: &Actor,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<AttachmentRef, LeaveError> {
        let employee_id = actor.require_employee()?;
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(LeaveError::validation("filename", "must not be empty"));
        }
        let size_bytes = bytes.len() as u64;
        self.limits.check(content_type, size_bytes)?;

        let stored_path = self.attachments.upload(employee_id, bytes, filename).await?;
        info!(employee_id, stored_path = %stored_path, size_bytes, "Leave attachment stored");

        Ok(AttachmentRef {
            stored_path,
            content_type: content_type.trim().to_string(),
            size_bytes,
        })
    }

    async fn decide(
        &self,
        actor: &Actor,
        request_id: u64,
        transition: Transition,
    ) -> Result<LeaveRequest, LeaveError> {
        let current = self
            .store
            .get_request(actor.company_id, request_id)
            .await?
            .ok_or(LeaveError::NotFound("leave request"))?;
        self.settle(actor, &current, transition).await
    }

    /// Applies the transition together with its ledger settlement. The store
    /// re-checks the status under lock and settles the days reserved at submission.
    async fn settle(
        &self,
        actor: &Actor,
        current: &LeaveRequest,
        transition: Transition,
    ) -> Result<LeaveRequest, LeaveError> {
        if !current.status.is_open() {
            return Err(LeaveError::AlreadyProcessed(current.status));
        }

        let target = transition.target();
        let request = self
            .store
            .transition_request(actor.company_id, current.id, transition)
            .await?;

        info!(
            request_id = request.id,
            employee_id = request.employee_id,
            status = %target,
            actor_id = actor.user_id,
            days = request.charged_days,
            "Leave request settled"
        );
        Ok(request)
    }

    async fn record_attendance(&self, request: &LeaveRequest, approver_id: u64) {
        for date in calendar::working_dates(request.start_date, request.end_date) {
            let entry = AttendanceEntry {
                employee_id: request.employee_id,
                date,
                status: AttendanceStatus::Leave,
                leave_category_id: Some(request.leave_category_id),
                approved_by: Some(approver_id),
            };
            if let Err(e) = self.attendance.create(entry).await {
                warn!(
                    error = %e,
                    request_id = request.id,
                    date = %date,
                    "Failed to record leave attendance"
                );
            }
        }
    }

    fn notify(
        &self,
        request: &LeaveRequest,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        self.notifier.enqueue(Notification {
            recipient_id: request.employee_id,
            kind,
            title: title.to_string(),
            message,
            data: json!({
                "leave_request_id": request.id,
                "status": request.status,
            }),
        });
    }

    async fn category(&self, company_id: u64, category_id: u64) -> Result<LeaveCategory, LeaveError> {
        self.categories
            .get_by_id(company_id, category_id)
            .await?
            .ok_or(LeaveError::NotFound("leave category"))
    }
}
