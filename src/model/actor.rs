use crate::error::LeaveError;
use crate::model::role::Role;

/// The identity an operation is performed as, scoped to one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub company_id: u64,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub role: Role,
}

impl Actor {
    pub fn require_hr_or_admin(&self) -> Result<(), LeaveError> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(LeaveError::Forbidden("HR/Admin only"))
        }
    }

    pub fn require_employee(&self) -> Result<u64, LeaveError> {
        self.employee_id
            .ok_or(LeaveError::Forbidden("No employee profile"))
    }

    /// HR/Admin may act for anyone; employees only for themselves.
    pub fn require_self_or_hr(&self, employee_id: u64) -> Result<(), LeaveError> {
        if self.role.is_hr_or_admin() || self.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(LeaveError::Forbidden("Not your leave record"))
        }
    }
}
