use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::model::employee::EmploymentType;

/// How the annual figure turns into a balance over the year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccrualMethod {
    #[default]
    Yearly,
    Monthly,
    Daily,
    None,
}

/// Which day count a request is charged against the ledger with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeductionType {
    #[default]
    WorkingDays,
    CalendarDays,
}

/// Timing constraints checked against the requested start date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingPolicy {
    pub max_days_per_request: Option<u32>,
    pub min_notice_days: Option<u32>,
    pub max_advance_days: Option<u32>,
    pub allow_backdate: bool,
    pub backdate_max_days: Option<u32>,
}

/// Carry-over settings. Applied by the annual rollover batch, which lives outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverPolicy {
    pub allow_rollover: bool,
    pub max_rollover_days: Option<u32>,
    pub rollover_expiry_month: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPolicy {
    pub requires_attachment: bool,
    /// When set, an attachment is only demanded once the request exceeds this many days.
    pub attachment_required_after_days: Option<u32>,
}

impl AttachmentPolicy {
    pub fn is_required(&self, days: f64) -> bool {
        if !self.requires_attachment {
            return false;
        }
        match self.attachment_required_after_days {
            Some(threshold) if threshold > 0 => days > f64::from(threshold),
            _ => true,
        }
    }
}

/// Tenure window in whole months, lower bound inclusive, upper bound exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenureRule {
    pub quota: u32,
    #[serde(default)]
    pub min_months: Option<u32>,
    #[serde(default)]
    pub max_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRule {
    pub quota: u32,
    pub position_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRule {
    pub quota: u32,
    pub grade_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentTypeRule {
    pub quota: u32,
    pub employment_type: EmploymentType,
}

/// Conditions of a combined rule. Absent conditions are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    #[serde(default)]
    pub position_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub grade_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub min_tenure_months: Option<u32>,
    #[serde(default)]
    pub max_tenure_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRule {
    pub quota: u32,
    pub conditions: RuleConditions,
}

/// Eligibility rule set of a leave category, one variant per rule shape.
///
/// Rules are evaluated in list order and the first match wins. With no match
/// `default_quota` applies; a zero default means the employee is not eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EligibilityRules {
    Fixed {
        default_quota: u32,
    },
    Tenure {
        #[serde(default)]
        default_quota: u32,
        rules: Vec<TenureRule>,
    },
    Position {
        #[serde(default)]
        default_quota: u32,
        rules: Vec<PositionRule>,
    },
    Grade {
        #[serde(default)]
        default_quota: u32,
        rules: Vec<GradeRule>,
    },
    EmploymentType {
        #[serde(default)]
        default_quota: u32,
        rules: Vec<EmploymentTypeRule>,
    },
    Combined {
        #[serde(default)]
        default_quota: u32,
        rules: Vec<CombinedRule>,
    },
}

impl EligibilityRules {
    pub fn default_quota(&self) -> u32 {
        match self {
            EligibilityRules::Fixed { default_quota }
            | EligibilityRules::Tenure { default_quota, .. }
            | EligibilityRules::Position { default_quota, .. }
            | EligibilityRules::Grade { default_quota, .. }
            | EligibilityRules::EmploymentType { default_quota, .. }
            | EligibilityRules::Combined { default_quota, .. } => *default_quota,
        }
    }
}

/// A company's leave category. Read-only for this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveCategory {
    pub id: u64,
    pub company_id: u64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub requires_approval: bool,
    #[serde(flatten)]
    pub attachment: AttachmentPolicy,
    pub has_quota: bool,
    pub accrual_method: AccrualMethod,
    pub deduction_type: DeductionType,
    pub allow_half_day: bool,
    #[serde(flatten)]
    pub timing: TimingPolicy,
    #[serde(flatten)]
    pub rollover: RolloverPolicy,
    pub eligibility_rules: EligibilityRules,
}
