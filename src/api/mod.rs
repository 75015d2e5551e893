pub mod leave_quota;
pub mod leave_request;
