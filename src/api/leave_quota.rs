use crate::auth::auth::AuthUser;
use crate::leave::ledger::{AllocationSummary, QuotaLedger};
use crate::model::leave_quota::LeaveQuota;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Ledger year, defaults to the current year
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustQuota {
    /// Signed whole days added to the adjustment bucket
    #[schema(example = -2)]
    pub delta: i32,
    #[schema(example = "Two unpaid days taken in December")]
    pub reason: String,
}

/// A quota entry together with its derived balance.
#[derive(Serialize, ToSchema)]
pub struct QuotaResponse {
    #[serde(flatten)]
    pub quota: LeaveQuota,
    #[schema(example = 8.5)]
    pub available: f64,
}

impl From<LeaveQuota> for QuotaResponse {
    fn from(quota: LeaveQuota) -> Self {
        Self {
            available: quota.available(),
            quota,
        }
    }
}

/// List an employee's quota entries for one year.
#[utoipa::path(
    get,
    path = "/api/quota/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose quotas to list"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Quota entries", body = [QuotaResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn employee_quotas(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| ledger.current_year());
    let quotas = ledger
        .list_for_employee(&auth.actor(), path.into_inner(), year)
        .await?;

    let body: Vec<QuotaResponse> = quotas.into_iter().map(QuotaResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/quota/{quota_id}",
    params(
        ("quota_id" = u64, Path, description = "ID of the quota entry")
    ),
    responses(
        (status = 200, description = "Quota entry found", body = QuotaResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Quota entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn get_quota(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let quota = ledger.get(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(QuotaResponse::from(quota)))
}

/// HR correction of a quota entry (HR/Admin).
///
/// Rejected as a whole when the balance would drop below zero.
#[utoipa::path(
    put,
    path = "/api/quota/{quota_id}/adjust",
    params(
        ("quota_id" = u64, Path, description = "ID of the quota entry")
    ),
    request_body = AdjustQuota,
    responses(
        (status = 200, description = "Quota adjusted", body = QuotaResponse),
        (status = 400, description = "Missing reason or balance would turn negative", body = Object,
         example = json!({
            "message": "quota would become negative (-1 day(s))"
         })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Quota entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn adjust_quota(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
    payload: web::Json<AdjustQuota>,
) -> actix_web::Result<impl Responder> {
    let quota = ledger
        .adjust(
            &auth.actor(),
            path.into_inner(),
            payload.delta,
            &payload.reason,
        )
        .await?;
    Ok(HttpResponse::Ok().json(QuotaResponse::from(quota)))
}

/// Re-derive granted days from the category's current rules (HR/Admin).
#[utoipa::path(
    put,
    path = "/api/quota/{quota_id}/recalculate",
    params(
        ("quota_id" = u64, Path, description = "ID of the quota entry")
    ),
    responses(
        (status = 200, description = "Quota recalculated", body = QuotaResponse),
        (status = 400, description = "Category inactive or balance would turn negative"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Quota entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn recalculate_quota(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let quota = ledger.recalculate(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(QuotaResponse::from(quota)))
}

/// Grant a quota-bearing category to every active employee (HR/Admin).
#[utoipa::path(
    post,
    path = "/api/quota/allocate/category/{category_id}",
    params(
        ("category_id" = u64, Path, description = "Leave category to allocate"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Allocation finished", body = AllocationSummary),
        (status = 400, description = "Category does not track quota"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave category not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn allocate_category(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| ledger.current_year());
    let summary = ledger
        .allocate_for_category(&auth.actor(), path.into_inner(), year)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Grant every active quota-bearing category to one employee (HR/Admin).
#[utoipa::path(
    post,
    path = "/api/quota/allocate/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Newly onboarded employee"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Allocation finished", body = AllocationSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quota"
)]
pub async fn allocate_employee(
    auth: AuthUser,
    ledger: web::Data<QuotaLedger>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| ledger.current_year());
    let summary = ledger
        .allocate_for_employee(&auth.actor(), path.into_inner(), year)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
