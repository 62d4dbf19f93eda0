//! Wiring of the attendance service onto its adapters.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use frequencia::domain::{AttendanceService, HkdfVerificationCodeDeriver, LockedRandomSource};
use frequencia::inbound::http::state::HttpState;
use frequencia::outbound::imaging::ImageControlNumberRenderer;
use frequencia::outbound::persistence::{DbPool, DieselAttendanceRepository, DieselStoreHealth};
use frequencia::settings::{Settings, SettingsError};

/// Build the handler state backed by PostgreSQL.
///
/// # Errors
/// Returns [`SettingsError`] when the attendance limits cannot be expressed
/// as calendar durations.
pub fn build_http_state(
    pool: DbPool,
    settings: &Settings,
) -> Result<web::Data<HttpState>, SettingsError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let policy = settings.attendance_policy()?;

    let secret = settings.attendance.verification_secret.as_bytes().to_vec();
    if secret.is_empty() {
        warn!("verification secret is empty; registrations will fail");
    }

    let repository = Arc::new(DieselAttendanceRepository::new(
        pool.clone(),
        Arc::clone(&clock),
    ));
    let service = Arc::new(AttendanceService::new(
        repository,
        Arc::new(HkdfVerificationCodeDeriver::new(secret)),
        Arc::new(ImageControlNumberRenderer::new(settings.image_config())),
        Arc::new(LockedRandomSource::from_wall_clock()),
        clock,
        policy,
    ));

    Ok(web::Data::new(HttpState::new(
        service.clone(),
        service,
        Arc::new(DieselStoreHealth::new(pool)),
    )))
}
