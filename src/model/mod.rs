pub mod actor;
pub mod attendance;
pub mod employee;
pub mod leave_category;
pub mod leave_quota;
pub mod leave_request;
pub mod role;
