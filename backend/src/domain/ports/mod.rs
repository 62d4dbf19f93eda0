//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod attendance_command;
mod attendance_repository;
mod control_number_renderer;
mod control_token_source;
mod store_health;
mod verification_code;

#[cfg(test)]
pub use attendance_command::{MockAttendanceCommand, MockAttendanceQuery};
pub use attendance_command::{
    AttendanceCommand, AttendanceQuery, ConfirmAttendanceRequest, GetAttendanceRequest,
    RegisterAttendanceRequest, RegisterAttendanceResponse,
};
#[cfg(test)]
pub use attendance_repository::MockAttendanceRepository;
pub use attendance_repository::{AttendanceRepository, AttendanceRepositoryError, AttendanceUnit};
#[cfg(test)]
pub use control_number_renderer::MockControlNumberRenderer;
pub use control_number_renderer::{
    ControlNumberRenderer, FixtureControlNumberRenderer, RenderError,
};
#[cfg(test)]
pub use control_token_source::MockControlTokenSource;
pub use control_token_source::ControlTokenSource;
#[cfg(test)]
pub use store_health::MockStoreHealth;
pub use store_health::{FixtureStoreHealth, StoreHealth, StoreHealthError};
#[cfg(test)]
pub use verification_code::MockVerificationCodeDeriver;
pub use verification_code::{
    FixtureVerificationCodeDeriver, VerificationCodeDeriver, VerificationCodeError,
    verification_code_matches,
};
