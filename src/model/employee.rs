use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Contract category an employee is hired under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmploymentType {
    Permanent,
    Contract,
    Probation,
    Internship,
    PartTime,
}

/// Read-only snapshot of an employee as the leave core sees it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "company_id": 7,
        "employee_code": "EMP-001",
        "hire_date": "2024-01-01",
        "position_id": 3,
        "grade_id": 2,
        "employment_type": "permanent",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 7)]
    pub company_id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = 3)]
    pub position_id: u64,

    #[schema(example = 2, nullable = true)]
    pub grade_id: Option<u64>,

    pub employment_type: EmploymentType,

    #[schema(example = true)]
    pub is_active: bool,
}
