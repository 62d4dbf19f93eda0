//! The attendance record and its lifecycle state.

use chrono::{DateTime, Duration, Utc};

use super::ControlNumber;

/// Observable lifecycle state of an attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    /// Created, control-number image not attached yet.
    Draft,
    /// Image attached, awaiting the on-site confirmation.
    Pending,
    /// Confirmation image attached. Terminal.
    Confirmed,
    /// Confirmation window elapsed before confirming. Terminal.
    Expired,
}

/// Mutation recorded by an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Create,
    Update,
}

impl AuditAction {
    /// Stored spelling of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
        }
    }
}

/// One shooter's training visit.
///
/// `id`, `created_at` and `updated_at` are assigned by the store; `revision`
/// is the optimistic-lock version, bumped by every successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    pub id: i64,
    pub control: i64,
    pub cr: String,
    pub caliber: String,
    pub weapon: String,
    pub serial_number: String,
    pub traffic_guide: Option<i64>,
    pub ammunition_count: u32,
    pub training_start: DateTime<Utc>,
    pub training_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub control_number_image: String,
    pub confirmation_image: String,
    pub revision: u32,
}

/// Validated, normalised registration fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceDraft {
    pub cr: String,
    pub caliber: String,
    pub weapon: String,
    pub serial_number: String,
    pub traffic_guide: Option<i64>,
    pub ammunition_count: u32,
    pub training_start: DateTime<Utc>,
    pub training_end: DateTime<Utc>,
}

impl Attendance {
    /// Build a not-yet-persisted record from a draft.
    ///
    /// The store overwrites `id`, `created_at`, `updated_at` and `revision`.
    pub fn new(draft: AttendanceDraft, control: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            control,
            cr: draft.cr,
            caliber: draft.caliber,
            weapon: draft.weapon,
            serial_number: draft.serial_number,
            traffic_guide: draft.traffic_guide,
            ammunition_count: draft.ammunition_count,
            training_start: draft.training_start,
            training_end: draft.training_end,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            control_number_image: String::new(),
            confirmation_image: String::new(),
            revision: 0,
        }
    }

    pub const fn control_number(&self) -> ControlNumber {
        ControlNumber::new(self.id, self.control)
    }

    pub const fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// True once `now` lies beyond `created_at + window`.
    pub fn window_elapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now > self.created_at + window
    }

    /// Classify the row by its observable fields.
    pub fn state(&self, now: DateTime<Utc>, window: Duration) -> AttendanceState {
        if self.is_confirmed() {
            AttendanceState::Confirmed
        } else if self.window_elapsed(now, window) {
            AttendanceState::Expired
        } else if self.control_number_image.is_empty() {
            AttendanceState::Draft
        } else {
            AttendanceState::Pending
        }
    }

    /// Attach the confirmation photograph and stamp the confirmation time.
    pub fn confirm(&mut self, image: String, now: DateTime<Utc>) {
        self.confirmation_image = image;
        self.confirmed_at = Some(now);
    }
}
