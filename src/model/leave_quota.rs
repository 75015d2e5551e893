use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tolerance used when comparing half-day granular balances.
const EPSILON: f64 = 1e-9;

/// Ledger rule violations. Raised before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient quota: {available} day(s) available, {requested} requested")]
    InsufficientQuota { available: f64, requested: f64 },
    #[error("operation would leave the quota at {resulting} day(s)")]
    NegativeQuota { resulting: f64 },
    #[error("reserved {pending} day(s) cannot cover {requested} day(s)")]
    ReservationMismatch { pending: f64, requested: f64 },
    #[error("day amount must be positive, got {0}")]
    InvalidAmount(f64),
    #[error("granted quota would leave the supported range ({resulting} day(s))")]
    OutOfRange { resulting: i64 },
}

/// One ledger entry per (employee, leave category, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveQuota {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = 7)]
    pub company_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub leave_category_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12)]
    pub opening_balance: i32,
    #[schema(example = 0)]
    pub earned_quota: i32,
    #[schema(example = 0)]
    pub rollover_quota: i32,
    #[schema(example = 0)]
    pub adjustment_quota: i32,
    #[schema(example = 2.5)]
    pub used_quota: f64,
    #[schema(example = 1.0)]
    pub pending_quota: f64,
}

/// Values for a ledger entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveQuota {
    pub company_id: u64,
    pub employee_id: u64,
    pub leave_category_id: u64,
    pub year: i32,
    pub opening_balance: i32,
    pub earned_quota: i32,
    pub rollover_quota: i32,
}

/// Every way a stored ledger entry may change.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerMutation {
    Reserve { days: f64 },
    Consume { days: f64 },
    Release { days: f64 },
    Adjust { delta: i32, actor_id: u64, reason: String },
    /// Re-derived grant after the category rules changed.
    Rebase { opening_balance: i32, earned_quota: i32 },
    /// Raise the accrued figure; never lowers it.
    Accrue { earned_quota: i32 },
}

impl LedgerMutation {
    pub fn label(&self) -> &'static str {
        match self {
            LedgerMutation::Reserve { .. } => "reserve",
            LedgerMutation::Consume { .. } => "consume",
            LedgerMutation::Release { .. } => "release",
            LedgerMutation::Adjust { .. } => "adjust",
            LedgerMutation::Rebase { .. } => "rebase",
            LedgerMutation::Accrue { .. } => "accrue",
        }
    }
}

impl LeaveQuota {
    pub fn from_new(id: u64, new: NewLeaveQuota) -> Self {
        Self {
            id,
            company_id: new.company_id,
            employee_id: new.employee_id,
            leave_category_id: new.leave_category_id,
            year: new.year,
            opening_balance: new.opening_balance,
            earned_quota: new.earned_quota,
            rollover_quota: new.rollover_quota,
            adjustment_quota: 0,
            used_quota: 0.0,
            pending_quota: 0.0,
        }
    }

    /// Granted days across all buckets, before consumption.
    pub fn granted(&self) -> i64 {
        i64::from(self.opening_balance)
            + i64::from(self.earned_quota)
            + i64::from(self.rollover_quota)
            + i64::from(self.adjustment_quota)
    }

    pub fn available(&self) -> f64 {
        self.granted() as f64 - self.used_quota - self.pending_quota
    }

    /// Applies a mutation in full or not at all.
    pub fn apply(&mut self, mutation: &LedgerMutation) -> Result<(), LedgerError> {
        match mutation {
            LedgerMutation::Reserve { days } => self.reserve(*days),
            LedgerMutation::Consume { days } => self.consume(*days),
            LedgerMutation::Release { days } => self.release(*days),
            LedgerMutation::Adjust { delta, .. } => self.adjust(*delta),
            LedgerMutation::Rebase {
                opening_balance,
                earned_quota,
            } => self.rebase(*opening_balance, *earned_quota),
            LedgerMutation::Accrue { earned_quota } => {
                self.earned_quota = self.earned_quota.max(*earned_quota);
                Ok(())
            }
        }
    }

    pub fn reserve(&mut self, days: f64) -> Result<(), LedgerError> {
        check_amount(days)?;
        let available = self.available();
        if available + EPSILON < days {
            return Err(LedgerError::InsufficientQuota {
                available,
                requested: days,
            });
        }
        self.pending_quota += days;
        Ok(())
    }

    /// Moves an earlier reservation into used. Availability is not re-checked.
    pub fn consume(&mut self, days: f64) -> Result<(), LedgerError> {
        self.take_pending(days)?;
        self.used_quota += days;
        Ok(())
    }

    pub fn release(&mut self, days: f64) -> Result<(), LedgerError> {
        self.take_pending(days)
    }

    pub fn adjust(&mut self, delta: i32) -> Result<(), LedgerError> {
        let granted = self.granted() + i64::from(delta);
        let adjustment_quota = self
            .adjustment_quota
            .checked_add(delta)
            .filter(|_| i32::try_from(granted).is_ok())
            .ok_or(LedgerError::OutOfRange { resulting: granted })?;

        let resulting = self.available() + f64::from(delta);
        if resulting < -EPSILON {
            return Err(LedgerError::NegativeQuota { resulting });
        }
        self.adjustment_quota = adjustment_quota;
        Ok(())
    }

    pub fn rebase(&mut self, opening_balance: i32, earned_quota: i32) -> Result<(), LedgerError> {
        let granted = self.granted() - i64::from(self.opening_balance) - i64::from(self.earned_quota)
            + i64::from(opening_balance)
            + i64::from(earned_quota);
        if i32::try_from(granted).is_err() {
            return Err(LedgerError::OutOfRange { resulting: granted });
        }

        let resulting = granted as f64 - self.used_quota - self.pending_quota;
        if resulting < -EPSILON {
            return Err(LedgerError::NegativeQuota { resulting });
        }
        self.opening_balance = opening_balance;
        self.earned_quota = earned_quota;
        Ok(())
    }

    fn take_pending(&mut self, days: f64) -> Result<(), LedgerError> {
        check_amount(days)?;
        if self.pending_quota + EPSILON < days {
            return Err(LedgerError::ReservationMismatch {
                pending: self.pending_quota,
                requested: days,
            });
        }
        self.pending_quota = (self.pending_quota - days).max(0.0);
        Ok(())
    }
}

fn check_amount(days: f64) -> Result<(), LedgerError> {
    if days.is_finite() && days > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(opening: i32) -> LeaveQuota {
        LeaveQuota::from_new(
            1,
            NewLeaveQuota {
                company_id: 7,
                employee_id: 1000,
                leave_category_id: 3,
                year: 2024,
                opening_balance: opening,
                earned_quota: 0,
                rollover_quota: 0,
            },
        )
    }

    #[test]
    fn available_sums_every_bucket() {
        let mut entry = quota(10);
        entry.earned_quota = 2;
        entry.rollover_quota = 3;
        entry.adjustment_quota = -1;
        entry.used_quota = 4.5;
        entry.pending_quota = 1.0;

        assert_eq!(entry.available(), 8.5);
    }

    #[test]
    fn reserve_beyond_available_changes_nothing() {
        let mut entry = quota(2);

        let err = entry.reserve(3.0).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientQuota {
                available: 2.0,
                requested: 3.0
            }
        );
        assert_eq!(entry.pending_quota, 0.0);
    }

    #[test]
    fn reserve_then_consume_moves_days_into_used() {
        let mut entry = quota(10);

        entry.reserve(2.5).unwrap();
        entry.consume(2.5).unwrap();

        assert_eq!(entry.pending_quota, 0.0);
        assert_eq!(entry.used_quota, 2.5);
        assert_eq!(entry.available(), 7.5);
    }

    #[test]
    fn reserve_then_release_restores_balances() {
        let mut entry = quota(10);
        let before = entry.clone();

        entry.reserve(4.0).unwrap();
        entry.release(4.0).unwrap();

        assert_eq!(entry, before);
    }

    #[test]
    fn consume_without_reservation_is_rejected() {
        let mut entry = quota(10);

        assert!(matches!(
            entry.consume(1.0),
            Err(LedgerError::ReservationMismatch { .. })
        ));
        assert_eq!(entry.used_quota, 0.0);
    }

    #[test]
    fn negative_adjustment_cannot_overdraw() {
        let mut entry = quota(5);
        entry.reserve(3.0).unwrap();

        assert_eq!(
            entry.adjust(-3),
            Err(LedgerError::NegativeQuota { resulting: -1.0 })
        );
        assert_eq!(entry.adjustment_quota, 0);

        entry.adjust(-2).unwrap();
        assert_eq!(entry.adjustment_quota, -2);
        assert_eq!(entry.available(), 0.0);
    }

    #[test]
    fn rebase_keeps_consumption_and_rejects_overdraw() {
        let mut entry = quota(12);
        entry.reserve(6.0).unwrap();
        entry.consume(6.0).unwrap();

        entry.rebase(8, 0).unwrap();
        assert_eq!(entry.used_quota, 6.0);
        assert_eq!(entry.available(), 2.0);

        assert!(matches!(
            entry.rebase(4, 0),
            Err(LedgerError::NegativeQuota { .. })
        ));
        assert_eq!(entry.opening_balance, 8);
    }

    #[test]
    fn adjustment_beyond_the_integer_range_is_refused() {
        let mut entry = quota(10);

        assert_eq!(
            entry.adjust(i32::MAX),
            Err(LedgerError::OutOfRange {
                resulting: i64::from(i32::MAX) + 10
            })
        );
        assert_eq!(entry.adjustment_quota, 0);
        assert_eq!(entry.available(), 10.0);

        entry.adjustment_quota = i32::MIN + 1;
        assert!(matches!(
            entry.adjust(-2),
            Err(LedgerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn rebase_beyond_the_integer_range_is_refused() {
        let mut entry = quota(10);
        entry.rollover_quota = 5;

        assert!(matches!(
            entry.rebase(i32::MAX, 0),
            Err(LedgerError::OutOfRange { .. })
        ));
        assert_eq!(entry.opening_balance, 10);
    }

    #[test]
    fn available_never_overflows_on_stored_extremes() {
        let mut entry = quota(i32::MAX);
        entry.earned_quota = i32::MAX;

        assert_eq!(entry.available(), 2.0 * f64::from(i32::MAX));
    }

    #[test]
    fn accrue_never_lowers_earned() {
        let mut entry = quota(0);
        entry.apply(&LedgerMutation::Accrue { earned_quota: 5 }).unwrap();
        entry.apply(&LedgerMutation::Accrue { earned_quota: 3 }).unwrap();

        assert_eq!(entry.earned_quota, 5);
    }

    #[test]
    fn zero_or_negative_amounts_are_rejected() {
        let mut entry = quota(10);

        assert_eq!(entry.reserve(0.0), Err(LedgerError::InvalidAmount(0.0)));
        assert_eq!(entry.release(-1.0), Err(LedgerError::InvalidAmount(-1.0)));
    }
}
