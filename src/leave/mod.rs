//! Leave quota core: eligibility, day counting, the quota ledger and the
//! request lifecycle that drives it.

pub mod accrual;
pub mod calendar;
pub mod eligibility;
pub mod ledger;
pub mod lifecycle;

#[cfg(test)]
mod tests;

pub use ledger::{AllocationSummary, QuotaLedger};
pub use lifecycle::{AttachmentLimits, AttachmentRef, CreateLeave, LeaveRequestService};
