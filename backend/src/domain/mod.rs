//! Domain primitives, rules and services.
//!
//! Public surface:
//! - `Error`, `ErrorCode`, `ErrorMessage`: the ordered error bundle returned
//!   by every driving port.
//! - `Attendance`, `ControlNumber`: the attendance record and its public id.
//! - `AttendanceService`: registration, confirmation and lookup.
//! - `HkdfVerificationCodeDeriver`, `LockedRandomSource`: the verification
//!   code and control token collaborators.

pub mod attendance;
pub mod attendance_service;
pub mod control_token;
pub mod error;
pub mod ports;
pub mod trace_id;
pub mod verification_code;

pub use self::attendance::{
    Attendance, AttendanceDraft, AttendancePolicy, AttendanceState, AuditAction, ControlNumber,
    RegistrationInput, validate_confirmation, validate_lookup, validate_registration,
};
pub use self::attendance_service::AttendanceService;
pub use self::control_token::LockedRandomSource;
pub use self::error::{Error, ErrorCategory, ErrorCode, ErrorMessage, Violations};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::verification_code::{
    HkdfVerificationCodeDeriver, VERIFICATION_CODE_LEN, derive_verification_code,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use frequencia::domain::{ApiResult, Error, ErrorCode};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::new(ErrorCode::NotFound))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
