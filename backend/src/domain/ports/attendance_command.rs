//! Driving ports for attendance registration, confirmation and lookup.

use async_trait::async_trait;

use crate::domain::{Attendance, ControlNumber, Error, RegistrationInput};

/// Request to register a training visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAttendanceRequest {
    pub input: RegistrationInput,
    pub remote_addr: Option<String>,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAttendanceResponse {
    pub control_number: ControlNumber,
    pub image: String,
    pub verification_code: String,
}

/// Request to confirm a pending attendance with an on-site photograph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmAttendanceRequest {
    pub cr: String,
    pub control_number: String,
    pub image: String,
    pub verification_code: Option<String>,
    pub remote_addr: Option<String>,
}

/// Request to read an attendance through its public link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAttendanceRequest {
    pub cr: String,
    pub control_number: String,
    pub verification_code: Option<String>,
}

/// Port for attendance mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceCommand: Send + Sync {
    async fn register(
        &self,
        request: RegisterAttendanceRequest,
    ) -> Result<RegisterAttendanceResponse, Error>;

    async fn confirm(&self, request: ConfirmAttendanceRequest) -> Result<(), Error>;
}

/// Port for attendance reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceQuery: Send + Sync {
    async fn get(&self, request: GetAttendanceRequest) -> Result<Attendance, Error>;
}
