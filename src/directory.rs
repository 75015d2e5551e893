//! MySQL-backed employee directory, category catalog and attendance writer.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use crate::collaborators::{
    AttendanceRecorder, CollaboratorError, EmployeeDirectory, LeaveCategoryCatalog,
};
use crate::model::attendance::AttendanceEntry;
use crate::model::employee::Employee;
use crate::model::leave_category::{
    AttachmentPolicy, EligibilityRules, LeaveCategory, RolloverPolicy, TimingPolicy,
};

const EMPLOYEE_COLUMNS: &str = "id, company_id, employee_code, hire_date, position_id, grade_id, \
    employment_type, is_active";

const CATEGORY_COLUMNS: &str = "id, company_id, name, code, description, color, is_active, \
    requires_approval, requires_attachment, attachment_required_after_days, has_quota, \
    accrual_method, deduction_type, allow_half_day, max_days_per_request, min_notice_days, \
    max_advance_days, allow_backdate, backdate_max_days, allow_rollover, max_rollover_days, \
    rollover_expiry_month, eligibility_rules";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    company_id: u64,
    employee_code: String,
    hire_date: NaiveDate,
    position_id: u64,
    grade_id: Option<u64>,
    employment_type: String,
    is_active: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = CollaboratorError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let employment_type = row.employment_type.parse().map_err(|_| {
            CollaboratorError::Malformed(format!(
                "employee {}: unknown employment type {}",
                row.id, row.employment_type
            ))
        })?;
        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            employee_code: row.employee_code,
            hire_date: row.hire_date,
            position_id: row.position_id,
            grade_id: row.grade_id,
            employment_type,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct CategoryRow {
    id: u64,
    company_id: u64,
    name: String,
    code: String,
    description: Option<String>,
    color: Option<String>,
    is_active: bool,
    requires_approval: bool,
    requires_attachment: bool,
    attachment_required_after_days: Option<u32>,
    has_quota: bool,
    accrual_method: String,
    deduction_type: String,
    allow_half_day: bool,
    max_days_per_request: Option<u32>,
    min_notice_days: Option<u32>,
    max_advance_days: Option<u32>,
    allow_backdate: bool,
    backdate_max_days: Option<u32>,
    allow_rollover: bool,
    max_rollover_days: Option<u32>,
    rollover_expiry_month: Option<u32>,
    eligibility_rules: Json<EligibilityRules>,
}

impl TryFrom<CategoryRow> for LeaveCategory {
    type Error = CollaboratorError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let malformed = |what: &str, value: &str| {
            CollaboratorError::Malformed(format!("leave category {}: unknown {what} {value}", row.id))
        };
        let accrual_method = row
            .accrual_method
            .parse()
            .map_err(|_| malformed("accrual method", &row.accrual_method))?;
        let deduction_type = row
            .deduction_type
            .parse()
            .map_err(|_| malformed("deduction type", &row.deduction_type))?;

        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            code: row.code,
            description: row.description,
            color: row.color,
            is_active: row.is_active,
            requires_approval: row.requires_approval,
            attachment: AttachmentPolicy {
                requires_attachment: row.requires_attachment,
                attachment_required_after_days: row.attachment_required_after_days,
            },
            has_quota: row.has_quota,
            accrual_method,
            deduction_type,
            allow_half_day: row.allow_half_day,
            timing: TimingPolicy {
                max_days_per_request: row.max_days_per_request,
                min_notice_days: row.min_notice_days,
                max_advance_days: row.max_advance_days,
                allow_backdate: row.allow_backdate,
                backdate_max_days: row.backdate_max_days,
            },
            rollover: RolloverPolicy {
                allow_rollover: row.allow_rollover,
                max_rollover_days: row.max_rollover_days,
                rollover_expiry_month: row.rollover_expiry_month,
            },
            eligibility_rules: row.eligibility_rules.0,
        })
    }
}

pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlDirectory {
    async fn get_by_id(
        &self,
        company_id: u64,
        employee_id: u64,
    ) -> Result<Option<Employee>, CollaboratorError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? AND company_id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn active_by_company(&self, company_id: u64) -> Result<Vec<Employee>, CollaboratorError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE company_id = ? AND is_active = TRUE ORDER BY id"
        );
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }
}

#[async_trait]
impl LeaveCategoryCatalog for MySqlDirectory {
    async fn get_by_id(
        &self,
        company_id: u64,
        category_id: u64,
    ) -> Result<Option<LeaveCategory>, CollaboratorError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM leave_categories WHERE id = ? AND company_id = ?"
        );
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(category_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveCategory::try_from)
            .transpose()
    }

    async fn active_by_company(
        &self,
        company_id: u64,
    ) -> Result<Vec<LeaveCategory>, CollaboratorError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM leave_categories \
             WHERE company_id = ? AND is_active = TRUE ORDER BY id"
        );
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveCategory::try_from)
            .collect()
    }
}

#[async_trait]
impl AttendanceRecorder for MySqlDirectory {
    async fn create(&self, entry: AttendanceEntry) -> Result<(), CollaboratorError> {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status, leave_category_id, approved_by)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                leave_category_id = VALUES(leave_category_id),
                approved_by = VALUES(approved_by)
            "#,
        )
        .bind(entry.employee_id)
        .bind(entry.date)
        .bind(entry.status.to_string())
        .bind(entry.leave_category_id)
        .bind(entry.approved_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
