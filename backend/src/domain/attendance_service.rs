//! Attendance lifecycle service.
//!
//! Registration and confirmation each run inside one repository unit. The
//! service commits the unit when the whole operation succeeds and rolls it
//! back on any failure, so callers never observe a half-registered row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AttendanceCommand, AttendanceQuery, AttendanceRepository, AttendanceRepositoryError,
    AttendanceUnit, ConfirmAttendanceRequest, ControlNumberRenderer, ControlTokenSource,
    GetAttendanceRequest, RegisterAttendanceRequest, RegisterAttendanceResponse, RenderError,
    VerificationCodeDeriver, VerificationCodeError, verification_code_matches,
};
use crate::domain::{
    Attendance, AttendancePolicy, ControlNumber, Error, ErrorCode, validate_confirmation,
    validate_lookup, validate_registration,
};

fn map_repository_error(error: AttendanceRepositoryError, operation: &str) -> Error {
    match error {
        AttendanceRepositoryError::NotFound { .. } => {
            Error::not_found().with_context(format!("{operation}: {error}"))
        }
        AttendanceRepositoryError::Stale { .. } => {
            Error::stale().with_context(format!("{operation}: {error}"))
        }
        AttendanceRepositoryError::Connection { .. } | AttendanceRepositoryError::Query { .. } => {
            Error::storage(operation, error)
        }
    }
}

fn map_verification_error(error: VerificationCodeError) -> Error {
    // Derivation only fails on unusable key material.
    Error::resource(ErrorCode::SecretMissing, "derive verification code", error)
}

fn map_render_error(error: RenderError) -> Error {
    match error {
        RenderError::FontMissing { .. } => {
            Error::resource(ErrorCode::FontMissing, "render control number", error)
        }
        RenderError::Failed { .. } => {
            Error::resource(ErrorCode::RenderFailed, "render control number", error)
        }
    }
}

async fn discard(unit: Box<dyn AttendanceUnit>, operation: &'static str) {
    if let Err(error) = unit.rollback().await {
        warn!(%error, operation, "attendance rollback failed");
    }
}

/// Commit on success, roll back otherwise. Commit failures surface as
/// storage errors.
async fn finish<T>(
    unit: Box<dyn AttendanceUnit>,
    outcome: Result<T, Error>,
    operation: &'static str,
) -> Result<T, Error> {
    match outcome {
        Ok(value) => {
            unit.commit()
                .await
                .map_err(|error| Error::storage(operation, error))?;
            Ok(value)
        }
        Err(error) => {
            discard(unit, operation).await;
            Err(error)
        }
    }
}

/// Service implementing the attendance driving ports.
#[derive(Clone)]
pub struct AttendanceService<R> {
    repository: Arc<R>,
    deriver: Arc<dyn VerificationCodeDeriver>,
    renderer: Arc<dyn ControlNumberRenderer>,
    tokens: Arc<dyn ControlTokenSource>,
    clock: Arc<dyn Clock>,
    policy: AttendancePolicy,
}

impl<R> AttendanceService<R> {
    pub fn new(
        repository: Arc<R>,
        deriver: Arc<dyn VerificationCodeDeriver>,
        renderer: Arc<dyn ControlNumberRenderer>,
        tokens: Arc<dyn ControlTokenSource>,
        clock: Arc<dyn Clock>,
        policy: AttendancePolicy,
    ) -> Self {
        Self {
            repository,
            deriver,
            renderer,
            tokens,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }
}

impl<R> AttendanceService<R>
where
    R: AttendanceRepository,
{
    async fn begin(&self, remote_addr: Option<String>) -> Result<Box<dyn AttendanceUnit>, Error> {
        self.repository
            .begin(remote_addr)
            .await
            .map_err(|error| map_repository_error(error, "begin attendance unit"))
    }

    async fn register_in(
        &self,
        unit: &mut dyn AttendanceUnit,
        attendance: &mut Attendance,
    ) -> Result<RegisterAttendanceResponse, Error> {
        unit.create(attendance)
            .await
            .map_err(|error| map_repository_error(error, "create attendance"))?;

        let control_number = attendance.control_number();
        let verification_code = self
            .deriver
            .derive(&attendance.cr, control_number)
            .map_err(map_verification_error)?;
        let image = self
            .renderer
            .render(control_number, &attendance.cr, &verification_code)
            .map_err(map_render_error)?;

        attendance.control_number_image.clone_from(&image);
        attendance.confirmed_at = None;
        unit.update(attendance)
            .await
            .map_err(|error| map_repository_error(error, "attach control number image"))?;

        Ok(RegisterAttendanceResponse {
            control_number,
            image,
            verification_code,
        })
    }

    async fn confirm_in(
        &self,
        unit: &mut dyn AttendanceUnit,
        request: &ConfirmAttendanceRequest,
        control_number: ControlNumber,
        now: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let mut stored = unit
            .fetch(control_number.id())
            .await
            .map_err(|error| map_repository_error(error, "fetch attendance"))?;

        let verification_matches = request
            .verification_code
            .as_deref()
            .map(|code| {
                verification_code_matches(
                    self.deriver.as_ref(),
                    &stored.cr,
                    stored.control_number(),
                    code,
                )
            })
            .transpose()
            .map_err(map_verification_error)?;

        validate_confirmation(
            &stored,
            &request.cr,
            control_number,
            &request.image,
            verification_matches,
            &self.policy,
            now,
        )?;

        stored.confirm(request.image.trim().to_owned(), now);
        unit.update(&mut stored)
            .await
            .map_err(|error| map_repository_error(error, "confirm attendance"))?;
        Ok(stored.id)
    }

    async fn lookup_in(
        &self,
        unit: &mut dyn AttendanceUnit,
        request: &GetAttendanceRequest,
        control_number: ControlNumber,
    ) -> Result<Attendance, Error> {
        let stored = unit
            .fetch(control_number.id())
            .await
            .map_err(|error| map_repository_error(error, "fetch attendance"))?;

        let verification_matches = match request.verification_code.as_deref() {
            Some(code) => verification_code_matches(
                self.deriver.as_ref(),
                &stored.cr,
                stored.control_number(),
                code,
            )
            .map_err(map_verification_error)?,
            None => false,
        };

        validate_lookup(&stored, &request.cr, control_number, verification_matches)?;
        Ok(stored)
    }
}

#[async_trait]
impl<R> AttendanceCommand for AttendanceService<R>
where
    R: AttendanceRepository,
{
    async fn register(
        &self,
        request: RegisterAttendanceRequest,
    ) -> Result<RegisterAttendanceResponse, Error> {
        let now = self.clock.utc();
        let draft = validate_registration(&request.input, &self.policy, now)?;
        let mut attendance = Attendance::new(draft, self.tokens.next_control(), now);

        let remote_addr = request.remote_addr;
        let mut unit = self.begin(remote_addr.clone()).await?;
        let outcome = self.register_in(unit.as_mut(), &mut attendance).await;
        let response = finish(unit, outcome, "register attendance").await?;

        info!(
            attendance_id = attendance.id,
            cr = %attendance.cr,
            remote_addr = remote_addr.as_deref().unwrap_or("-"),
            "attendance registered"
        );
        Ok(response)
    }

    async fn confirm(&self, request: ConfirmAttendanceRequest) -> Result<(), Error> {
        let now = self.clock.utc();
        let control_number = ControlNumber::parse(&request.control_number)?;

        let mut unit = self.begin(request.remote_addr.clone()).await?;
        let outcome = self
            .confirm_in(unit.as_mut(), &request, control_number, now)
            .await;
        let attendance_id = finish(unit, outcome, "confirm attendance").await?;

        info!(
            attendance_id,
            cr = %request.cr.trim(),
            remote_addr = request.remote_addr.as_deref().unwrap_or("-"),
            "attendance confirmed"
        );
        Ok(())
    }
}

#[async_trait]
impl<R> AttendanceQuery for AttendanceService<R>
where
    R: AttendanceRepository,
{
    async fn get(&self, request: GetAttendanceRequest) -> Result<Attendance, Error> {
        let control_number = ControlNumber::parse(&request.control_number)?;

        let mut unit = self.begin(None).await?;
        let outcome = self.lookup_in(unit.as_mut(), &request, control_number).await;
        discard(unit, "read attendance").await;
        outcome
    }
}

#[cfg(test)]
#[path = "attendance_service_tests.rs"]
mod tests;
