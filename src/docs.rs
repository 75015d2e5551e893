use crate::api::leave_quota::{AdjustQuota, QuotaResponse};
use crate::api::leave_request::{LeaveListResponse, RejectLeave};
use crate::leave::ledger::AllocationSummary;
use crate::leave::lifecycle::{AttachmentRef, CreateLeave};
use crate::model::leave_quota::LeaveQuota;
use crate::model::leave_request::{DurationType, LeaveRequest, LeaveStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Quota API",
        version = "1.0.0",
        description = r#"
## Leave quota and request lifecycle

Employees submit leave requests against a per-year quota; HR approves,
rejects or corrects the quota.

### Key Features
- **Leave requests**: submit, approve, reject, cancel and list, with attachment upload
- **Quota ledger**: per employee, category and year, with HR adjustments and recalculation
- **Allocation**: bulk grant for a new category or a newly onboarded employee

### Security
All endpoints require a **JWT Bearer** access token. Decisions, adjustments and
allocation are restricted to **Admin** and **HR**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::upload_attachment,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::leave_quota::employee_quotas,
        crate::api::leave_quota::get_quota,
        crate::api::leave_quota::adjust_quota,
        crate::api::leave_quota::recalculate_quota,
        crate::api::leave_quota::allocate_category,
        crate::api::leave_quota::allocate_employee
    ),
    components(
        schemas(
            CreateLeave,
            AttachmentRef,
            RejectLeave,
            LeaveRequest,
            LeaveStatus,
            DurationType,
            LeaveListResponse,
            LeaveQuota,
            QuotaResponse,
            AdjustQuota,
            AllocationSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Quota", description = "Leave quota ledger APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
