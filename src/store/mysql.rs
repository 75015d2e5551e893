use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlConnection, MySqlPool};

use super::{LeaveStore, Page, RequestFilter, StoreError, settlement};
use crate::model::leave_quota::{LeaveQuota, LedgerMutation, NewLeaveQuota};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest, Transition};

const QUOTA_COLUMNS: &str = "id, company_id, employee_id, leave_category_id, year, \
    opening_balance, earned_quota, rollover_quota, adjustment_quota, used_quota, pending_quota";

const REQUEST_COLUMNS: &str = "id, company_id, employee_id, leave_category_id, quota_id, \
    start_date, end_date, duration_type, total_days, working_days, charged_days, reason, \
    attachment_url, status, is_backdate, submitted_at, approved_by, approved_at, rejection_reason";

#[derive(FromRow)]
struct QuotaRow {
    id: u64,
    company_id: u64,
    employee_id: u64,
    leave_category_id: u64,
    year: i32,
    opening_balance: i32,
    earned_quota: i32,
    rollover_quota: i32,
    adjustment_quota: i32,
    used_quota: f64,
    pending_quota: f64,
}

impl From<QuotaRow> for LeaveQuota {
    fn from(row: QuotaRow) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            employee_id: row.employee_id,
            leave_category_id: row.leave_category_id,
            year: row.year,
            opening_balance: row.opening_balance,
            earned_quota: row.earned_quota,
            rollover_quota: row.rollover_quota,
            adjustment_quota: row.adjustment_quota,
            used_quota: row.used_quota,
            pending_quota: row.pending_quota,
        }
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    company_id: u64,
    employee_id: u64,
    leave_category_id: u64,
    quota_id: Option<u64>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_type: String,
    total_days: f64,
    working_days: f64,
    charged_days: f64,
    reason: String,
    attachment_url: Option<String>,
    status: String,
    is_backdate: bool,
    submitted_at: DateTime<Utc>,
    approved_by: Option<u64>,
    approved_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let duration_type = row.duration_type.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "leave request {}: unknown duration type {}",
                row.id, row.duration_type
            ))
        })?;
        let status = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "leave request {}: unknown status {}",
                row.id, row.status
            ))
        })?;

        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            employee_id: row.employee_id,
            leave_category_id: row.leave_category_id,
            quota_id: row.quota_id,
            start_date: row.start_date,
            end_date: row.end_date,
            duration_type,
            total_days: row.total_days,
            working_days: row.working_days,
            charged_days: row.charged_days,
            reason: row.reason,
            attachment_url: row.attachment_url,
            status,
            is_backdate: row.is_backdate,
            submitted_at: row.submitted_at,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejection_reason: row.rejection_reason,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    I32(i32),
    Str(String),
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Locks the ledger row for the rest of the transaction.
async fn lock_quota(
    conn: &mut MySqlConnection,
    company_id: u64,
    quota_id: u64,
) -> Result<LeaveQuota, StoreError> {
    let sql = format!(
        "SELECT {QUOTA_COLUMNS} FROM leave_quotas WHERE id = ? AND company_id = ? FOR UPDATE"
    );
    sqlx::query_as::<_, QuotaRow>(&sql)
        .bind(quota_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(LeaveQuota::from)
        .ok_or(StoreError::NotFound("leave quota"))
}

/// Applies a mutation to a locked row and writes the result back.
async fn mutate_locked(
    conn: &mut MySqlConnection,
    company_id: u64,
    quota_id: u64,
    mutation: &LedgerMutation,
) -> Result<LeaveQuota, StoreError> {
    let mut quota = lock_quota(conn, company_id, quota_id).await?;
    quota.apply(mutation)?;

    sqlx::query(
        r#"
        UPDATE leave_quotas
        SET opening_balance = ?,
            earned_quota = ?,
            adjustment_quota = ?,
            used_quota = ?,
            pending_quota = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(quota.opening_balance)
    .bind(quota.earned_quota)
    .bind(quota.adjustment_quota)
    .bind(quota.used_quota)
    .bind(quota.pending_quota)
    .bind(quota.id)
    .execute(&mut *conn)
    .await?;

    if let LedgerMutation::Adjust {
        delta,
        actor_id,
        reason,
    } = mutation
    {
        sqlx::query(
            r#"
            INSERT INTO leave_quota_adjustments (quota_id, delta, actor_id, reason)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(quota.id)
        .bind(*delta)
        .bind(*actor_id)
        .bind(reason.as_str())
        .execute(&mut *conn)
        .await?;
    }

    Ok(quota)
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn find_quota(
        &self,
        company_id: u64,
        employee_id: u64,
        leave_category_id: u64,
        year: i32,
    ) -> Result<Option<LeaveQuota>, StoreError> {
        let sql = format!(
            "SELECT {QUOTA_COLUMNS} FROM leave_quotas \
             WHERE company_id = ? AND employee_id = ? AND leave_category_id = ? AND year = ?"
        );
        let row = sqlx::query_as::<_, QuotaRow>(&sql)
            .bind(company_id)
            .bind(employee_id)
            .bind(leave_category_id)
            .bind(year)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LeaveQuota::from))
    }

    async fn get_quota(
        &self,
        company_id: u64,
        quota_id: u64,
    ) -> Result<Option<LeaveQuota>, StoreError> {
        let sql = format!("SELECT {QUOTA_COLUMNS} FROM leave_quotas WHERE id = ? AND company_id = ?");
        let row = sqlx::query_as::<_, QuotaRow>(&sql)
            .bind(quota_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LeaveQuota::from))
    }

    async fn list_quotas(
        &self,
        company_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveQuota>, StoreError> {
        let sql = format!(
            "SELECT {QUOTA_COLUMNS} FROM leave_quotas \
             WHERE company_id = ? AND employee_id = ? AND year = ? ORDER BY leave_category_id"
        );
        let rows = sqlx::query_as::<_, QuotaRow>(&sql)
            .bind(company_id)
            .bind(employee_id)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LeaveQuota::from).collect())
    }

    async fn insert_quota(&self, new: NewLeaveQuota) -> Result<Option<LeaveQuota>, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_quotas
                (company_id, employee_id, leave_category_id, year,
                 opening_balance, earned_quota, rollover_quota)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.company_id)
        .bind(new.employee_id)
        .bind(new.leave_category_id)
        .bind(new.year)
        .bind(new.opening_balance)
        .bind(new.earned_quota)
        .bind(new.rollover_quota)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Some(LeaveQuota::from_new(done.last_insert_id(), new))),
            Err(e) => {
                // Unique (employee, category, year) already taken
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        return Ok(None);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn mutate_quota(
        &self,
        company_id: u64,
        quota_id: u64,
        mutation: LedgerMutation,
    ) -> Result<LeaveQuota, StoreError> {
        let mut tx = self.pool.begin().await?;
        let quota = mutate_locked(&mut tx, company_id, quota_id, &mutation).await?;
        tx.commit().await?;
        Ok(quota)
    }

    async fn submit_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let overlapping = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT id FROM leave_requests
            WHERE company_id = ?
            AND employee_id = ?
            AND status IN ('waiting_approval', 'approved')
            AND start_date <= ?
            AND end_date >= ?
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(new.company_id)
        .bind(new.employee_id)
        .bind(new.end_date)
        .bind(new.start_date)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(request_id) = overlapping {
            return Err(StoreError::Overlap { request_id });
        }

        if let Some(quota_id) = new.quota_id {
            mutate_locked(
                &mut tx,
                new.company_id,
                quota_id,
                &LedgerMutation::Reserve {
                    days: new.charged_days,
                },
            )
            .await?;
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (company_id, employee_id, leave_category_id, quota_id, start_date, end_date,
                 duration_type, total_days, working_days, charged_days, reason, attachment_url,
                 status, is_backdate, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.company_id)
        .bind(new.employee_id)
        .bind(new.leave_category_id)
        .bind(new.quota_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.duration_type.to_string())
        .bind(new.total_days)
        .bind(new.working_days)
        .bind(new.charged_days)
        .bind(new.reason.as_str())
        .bind(new.attachment_url.as_deref())
        .bind(LeaveStatus::WaitingApproval.to_string())
        .bind(new.is_backdate)
        .bind(new.submitted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(LeaveRequest::from_new(inserted.last_insert_id(), new))
    }

    async fn transition_request(
        &self,
        company_id: u64,
        request_id: u64,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? AND company_id = ? FOR UPDATE"
        );
        let mut request: LeaveRequest = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request_id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("leave request"))?
            .try_into()?;

        if !request.status.is_open() {
            return Err(StoreError::AlreadyProcessed(request.status));
        }

        if let (Some(quota_id), Some(mutation)) =
            (request.quota_id, settlement(&transition, request.charged_days))
        {
            mutate_locked(&mut tx, company_id, quota_id, &mutation).await?;
        }

        transition.stamp(&mut request);

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?,
                approved_by = ?,
                approved_at = ?,
                rejection_reason = ?
            WHERE id = ?
            AND status = 'waiting_approval'
            "#,
        )
        .bind(request.status.to_string())
        .bind(request.approved_by)
        .bind(request.approved_at)
        .bind(request.rejection_reason.as_deref())
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn get_request(
        &self,
        company_id: u64,
        request_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        let sql =
            format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? AND company_id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list_requests(
        &self,
        company_id: u64,
        filter: &RequestFilter,
    ) -> Result<Page<LeaveRequest>, StoreError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE company_id = ?");
        let mut args: Vec<FilterValue> = vec![FilterValue::U64(company_id)];

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        if let Some(year) = filter.year {
            where_sql.push_str(" AND YEAR(start_date) = ?");
            args.push(FilterValue::I32(year));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<MySql, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::I32(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY submitted_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<MySql, RequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::I32(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let rows = data_q
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { data, total })
    }
}
