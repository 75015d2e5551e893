use crate::auth::auth::AuthUser;
use crate::leave::lifecycle::{AttachmentRef, CreateLeave, LeaveRequestService};
use crate::model::leave_request::LeaveRequest;
use crate::store::RequestFilter;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Project deadline that week")]
    pub rejection_reason: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttachmentQuery {
    /// Original file name, used as a suffix of the stored name
    pub filename: String,
}

/* =========================
Create leave request
========================= */
/// Submit a leave request for the calling employee.
///
/// Days are reserved on the employee's quota for the start date's year
/// until the request is decided or cancelled.
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Validation, eligibility, policy or quota failure", body = Object,
         example = json!({
            "message": "insufficient quota: 2 day(s) available, 3 requested"
         })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave category or quota not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let request = service
        .create(&auth.actor(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(request))
}

/* =========================
Upload supporting document
========================= */
/// Upload an attachment for a later leave request.
///
/// The raw file is the request body and its `Content-Type` header is the
/// declared type. Pass the returned reference as `attachment` when creating
/// the request.
#[utoipa::path(
    post,
    path = "/api/leave/attachments",
    params(AttachmentQuery),
    request_body(
        content = Vec<u8>,
        description = "Raw file bytes",
        content_type = "application/octet-stream"
    ),
    responses(
        (status = 201, description = "Attachment stored", body = AttachmentRef),
        (status = 400, description = "Attachment type or size not accepted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn upload_attachment(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    req: HttpRequest,
    query: web::Query<AttachmentQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.split(';').next().unwrap_or(h).trim())
        .unwrap_or_default();

    let attachment = service
        .upload_attachment(&auth.actor(), &query.filename, content_type, &body)
        .await?;
    Ok(HttpResponse::Created().json(attachment))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "message": "leave request already processed (status: approved)"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.approve(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Missing rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    let request = service
        .reject(&auth.actor(), path.into_inner(), &payload.rejection_reason)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Cancel a request that is still waiting for approval.
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your leave request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.cancel(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.get(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
///
/// Employees only ever see their own requests; `employee_id` is ignored for them.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveRequestService>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    let filter = query.into_inner();
    let (page, per_page) = (filter.page(), filter.per_page());

    let result = service.list(&auth.actor(), filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: result.data,
        page,
        per_page,
        total: result.total,
    }))
}
