use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::collaborators::{
    AttachmentStorage, AttendanceRecorder, Clock, CollaboratorError, EmployeeDirectory,
    LeaveCategoryCatalog, Notification, Notifier,
};
use crate::leave::ledger::QuotaLedger;
use crate::leave::lifecycle::{AttachmentLimits, LeaveRequestService};
use crate::model::actor::Actor;
use crate::model::attendance::AttendanceEntry;
use crate::model::employee::{Employee, EmploymentType};
use crate::model::leave_category::{
    AccrualMethod, AttachmentPolicy, DeductionType, EligibilityRules, LeaveCategory,
    RolloverPolicy, TenureRule, TimingPolicy,
};
use crate::model::role::Role;
use crate::store::memory::InMemoryLeaveStore;

pub(super) const COMPANY: u64 = 7;
pub(super) const HR_USER: u64 = 900;

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn employee(id: u64, hire_date: NaiveDate) -> Employee {
    Employee {
        id,
        company_id: COMPANY,
        employee_code: format!("EMP-{id:03}"),
        hire_date,
        position_id: 3,
        grade_id: Some(2),
        employment_type: EmploymentType::Permanent,
        is_active: true,
    }
}

/// Twelve working days a year, granted upfront.
pub(super) fn annual_leave(id: u64) -> LeaveCategory {
    LeaveCategory {
        id,
        company_id: COMPANY,
        name: "Annual Leave".to_string(),
        code: "AL".to_string(),
        description: None,
        color: Some("#2E86DE".to_string()),
        is_active: true,
        requires_approval: true,
        attachment: AttachmentPolicy::default(),
        has_quota: true,
        accrual_method: AccrualMethod::Yearly,
        deduction_type: DeductionType::WorkingDays,
        allow_half_day: true,
        timing: TimingPolicy::default(),
        rollover: RolloverPolicy::default(),
        eligibility_rules: EligibilityRules::Fixed { default_quota: 12 },
    }
}

/// `[0-12mo: 6, 12-36mo: 12]`, default 0.
pub(super) fn tenure_rules() -> EligibilityRules {
    EligibilityRules::Tenure {
        default_quota: 0,
        rules: vec![
            TenureRule {
                quota: 6,
                min_months: Some(0),
                max_months: Some(12),
            },
            TenureRule {
                quota: 12,
                min_months: Some(12),
                max_months: Some(36),
            },
        ],
    }
}

pub(super) fn hr() -> Actor {
    Actor {
        user_id: HR_USER,
        company_id: COMPANY,
        employee_id: None,
        role: Role::Hr,
    }
}

pub(super) fn staff(employee_id: u64) -> Actor {
    Actor {
        user_id: employee_id + 5000,
        company_id: COMPANY,
        employee_id: Some(employee_id),
        role: Role::Employee,
    }
}

pub(super) struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub(super) fn on(day: NaiveDate) -> Self {
        Self(Mutex::new(midday(day)))
    }

    pub(super) fn set(&self, day: NaiveDate) {
        *self.0.lock().unwrap() = midday(day);
    }
}

fn midday(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    pub(super) employees: Mutex<Vec<Employee>>,
}

impl MemoryDirectory {
    pub(super) fn with(employees: Vec<Employee>) -> Self {
        Self {
            employees: Mutex::new(employees),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn get_by_id(
        &self,
        company_id: u64,
        employee_id: u64,
    ) -> Result<Option<Employee>, CollaboratorError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.company_id == company_id && e.id == employee_id)
            .cloned())
    }

    async fn active_by_company(&self, company_id: u64) -> Result<Vec<Employee>, CollaboratorError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.company_id == company_id && e.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryCatalog {
    pub(super) categories: Mutex<Vec<LeaveCategory>>,
}

impl MemoryCatalog {
    pub(super) fn with(categories: Vec<LeaveCategory>) -> Self {
        Self {
            categories: Mutex::new(categories),
        }
    }

    pub(super) fn replace(&self, category: LeaveCategory) {
        let mut categories = self.categories.lock().unwrap();
        categories.retain(|c| c.id != category.id);
        categories.push(category);
    }
}

#[async_trait]
impl LeaveCategoryCatalog for MemoryCatalog {
    async fn get_by_id(
        &self,
        company_id: u64,
        category_id: u64,
    ) -> Result<Option<LeaveCategory>, CollaboratorError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.company_id == company_id && c.id == category_id)
            .cloned())
    }

    async fn active_by_company(
        &self,
        company_id: u64,
    ) -> Result<Vec<LeaveCategory>, CollaboratorError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.company_id == company_id && c.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    pub(super) sent: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn enqueue(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub(super) struct RecordingAttendance {
    pub(super) entries: Mutex<Vec<AttendanceEntry>>,
    /// Dates that fail to record.
    pub(super) failing: Mutex<Vec<NaiveDate>>,
}

#[async_trait]
impl AttendanceRecorder for RecordingAttendance {
    async fn create(&self, entry: AttendanceEntry) -> Result<(), CollaboratorError> {
        if self.failing.lock().unwrap().contains(&entry.date) {
            return Err(CollaboratorError::Malformed(format!(
                "attendance for {} rejected",
                entry.date
            )));
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAttachments {
    pub(super) files: Mutex<Vec<(u64, String, usize)>>,
}

#[async_trait]
impl AttachmentStorage for MemoryAttachments {
    async fn upload(
        &self,
        employee_id: u64,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, CollaboratorError> {
        let path = format!("{employee_id}/{filename}");
        self.files
            .lock()
            .unwrap()
            .push((employee_id, path.clone(), bytes.len()));
        Ok(path)
    }

    fn resolve_url(&self, stored_path: &str) -> String {
        format!("https://files.test/{stored_path}")
    }
}

pub(super) fn limits() -> AttachmentLimits {
    AttachmentLimits {
        max_bytes: 1024,
        allowed_types: vec!["application/pdf".to_string(), "image/png".to_string()],
    }
}

/// Fully wired services over in-memory collaborators.
pub(super) struct Harness {
    pub(super) store: Arc<InMemoryLeaveStore>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) catalog: Arc<MemoryCatalog>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) attendance: Arc<RecordingAttendance>,
    pub(super) attachments: Arc<MemoryAttachments>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) ledger: Arc<QuotaLedger>,
    pub(super) requests: LeaveRequestService,
}

impl Harness {
    pub(super) fn new(
        today: NaiveDate,
        employees: Vec<Employee>,
        categories: Vec<LeaveCategory>,
    ) -> Self {
        let store = Arc::new(InMemoryLeaveStore::new());
        let directory = Arc::new(MemoryDirectory::with(employees));
        let catalog = Arc::new(MemoryCatalog::with(categories));
        let notifier = Arc::new(RecordingNotifier::default());
        let attendance = Arc::new(RecordingAttendance::default());
        let attachments = Arc::new(MemoryAttachments::default());
        let clock = Arc::new(FixedClock::on(today));

        let ledger = Arc::new(QuotaLedger::new(
            store.clone(),
            directory.clone(),
            catalog.clone(),
            clock.clone(),
        ));
        let requests = LeaveRequestService::new(
            store.clone(),
            ledger.clone(),
            directory.clone(),
            catalog.clone(),
            attachments.clone(),
            attendance.clone(),
            notifier.clone(),
            clock.clone(),
            limits(),
        );

        Self {
            store,
            directory,
            catalog,
            notifier,
            attendance,
            attachments,
            clock,
            ledger,
            requests,
        }
    }
}
