//! Attendance records: entity, control number and validation rules.

mod control_number;
mod record;
mod validation;

pub use control_number::ControlNumber;
pub use record::{Attendance, AttendanceDraft, AttendanceState, AuditAction};
pub use validation::{
    ACCEPTED_IMAGE_FORMATS, AttendancePolicy, RegistrationInput, check_confirmation_image, fields,
    is_valid_serial_number, normalize, validate_confirmation, validate_lookup,
    validate_registration,
};
