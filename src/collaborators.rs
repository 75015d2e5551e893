//! Narrow interfaces to the systems the leave core depends on but does not own.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::model::attendance::AttendanceEntry;
use crate::model::employee::Employee;
use crate::model::leave_category::LeaveCategory;

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Employee directory, read-only.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get_by_id(
        &self,
        company_id: u64,
        employee_id: u64,
    ) -> Result<Option<Employee>, CollaboratorError>;

    async fn active_by_company(&self, company_id: u64) -> Result<Vec<Employee>, CollaboratorError>;
}

#[async_trait]
pub trait LeaveCategoryCatalog: Send + Sync {
    async fn get_by_id(
        &self,
        company_id: u64,
        category_id: u64,
    ) -> Result<Option<LeaveCategory>, CollaboratorError>;

    async fn active_by_company(
        &self,
        company_id: u64,
    ) -> Result<Vec<LeaveCategory>, CollaboratorError>;
}

/// Opaque file storage for supporting documents.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Stores the bytes and returns the stored path.
    async fn upload(
        &self,
        employee_id: u64,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, CollaboratorError>;

    /// Turns a stored path into a URL clients can open.
    fn resolve_url(&self, stored_path: &str) -> String;
}

#[async_trait]
pub trait AttendanceRecorder: Send + Sync {
    async fn create(&self, entry: AttendanceEntry) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    LeaveCancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

/// Fire-and-forget notification hand-off. Must not block or fail the caller.
pub trait Notifier: Send + Sync {
    fn enqueue(&self, notification: Notification);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
