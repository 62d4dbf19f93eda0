//! Registration and confirmation checks.
//!
//! Every check appends to a [`Violations`] bundle instead of returning early,
//! so callers receive all failures of a phase at once.

use std::sync::OnceLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use image::ImageFormat;
use regex::Regex;

use crate::domain::{Error, ErrorCode, ErrorMessage, Violations};

use super::{Attendance, AttendanceDraft, ControlNumber};

/// Wire names of the validated fields.
pub mod fields {
    pub const CR: &str = "cr";
    pub const CALIBER: &str = "calibre";
    pub const WEAPON: &str = "armaUtilizada";
    pub const SERIAL_NUMBER: &str = "numeroSerie";
    pub const AMMUNITION_COUNT: &str = "quantidadeMunicao";
    pub const TRAINING_START: &str = "dataInicioTreino";
    pub const TRAINING_END: &str = "dataTerminoTreino";
    pub const CONFIRMATION_IMAGE: &str = "imagem";
    pub const VERIFICATION_CODE: &str = "verificacao";
    pub const CONTROL_NUMBER: &str = "numeroControle";
}

/// Time limits and size caps applied by the attendance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub confirmation_window: Duration,
    pub max_registration_delay: Duration,
    pub max_training_duration: Duration,
    pub max_confirmation_image_bytes: usize,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            confirmation_window: Duration::minutes(30),
            max_registration_delay: Duration::hours(12),
            max_training_duration: Duration::hours(12),
            max_confirmation_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Raw registration input as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationInput {
    pub cr: String,
    pub caliber: String,
    pub weapon: String,
    pub serial_number: String,
    pub traffic_guide: Option<i64>,
    pub ammunition_count: i64,
    pub training_start: Option<DateTime<Utc>>,
    pub training_end: Option<DateTime<Utc>>,
}

/// Trim and upper-case a free-text field.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

static SERIAL_NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn serial_number_regex() -> &'static Regex {
    SERIAL_NUMBER_RE.get_or_init(|| {
        Regex::new("^[A-Z]{2}[0-9]{6}$")
            .unwrap_or_else(|error| panic!("serial number regex failed to compile: {error}"))
    })
}

/// Return true when a normalised serial number is acceptable.
///
/// ```
/// use frequencia::domain::attendance::is_valid_serial_number;
///
/// assert!(is_valid_serial_number("ZA785671"));
/// assert!(!is_valid_serial_number("785671"));
/// ```
pub fn is_valid_serial_number(serial_number: &str) -> bool {
    serial_number_regex().is_match(serial_number)
}

fn required(field: &'static str) -> impl FnOnce() -> ErrorMessage {
    move || ErrorMessage::new(ErrorCode::RequiredField).with_field(field)
}

/// Validate and normalise a registration.
///
/// Required fields are checked first and reported on their own; serial
/// number and training dates are only inspected once those pass.
pub fn validate_registration(
    input: &RegistrationInput,
    policy: &AttendancePolicy,
    now: DateTime<Utc>,
) -> Result<AttendanceDraft, Error> {
    let cr = input.cr.trim().to_owned();
    let caliber = normalize(&input.caliber);
    let weapon = normalize(&input.weapon);
    // Counts are stored in a signed 32-bit column.
    let ammunition_count = i32::try_from(input.ammunition_count)
        .ok()
        .and_then(|count| u32::try_from(count).ok())
        .filter(|count| *count > 0);

    let mut violations = Violations::default();
    violations.check(cr.is_empty(), required(fields::CR));
    violations.check(caliber.is_empty(), required(fields::CALIBER));
    violations.check(weapon.is_empty(), required(fields::WEAPON));
    violations.check(ammunition_count.is_none(), || {
        required(fields::AMMUNITION_COUNT)().with_value(input.ammunition_count.to_string())
    });
    violations.into_result()?;

    let serial_number = normalize(&input.serial_number);
    let mut violations = Violations::default();
    if serial_number.is_empty() {
        violations.push(required(fields::SERIAL_NUMBER)());
    } else if !is_valid_serial_number(&serial_number) {
        violations.push(
            ErrorMessage::new(ErrorCode::SerialFormat)
                .with_field(fields::SERIAL_NUMBER)
                .with_value(serial_number.clone()),
        );
    }

    violations.check(input.training_start.is_none(), required(fields::TRAINING_START));
    violations.check(input.training_end.is_none(), required(fields::TRAINING_END));
    if let (Some(start), Some(end)) = (input.training_start, input.training_end) {
        check_training_dates(&mut violations, start, end, policy, now);
    }
    violations.into_result()?;

    match (ammunition_count, input.training_start, input.training_end) {
        (Some(ammunition_count), Some(training_start), Some(training_end)) => Ok(AttendanceDraft {
            cr,
            caliber,
            weapon,
            serial_number,
            traffic_guide: input.traffic_guide,
            ammunition_count,
            training_start,
            training_end,
        }),
        _ => Err(Error::new(ErrorCode::RequiredField)),
    }
}

fn check_training_dates(
    violations: &mut Violations,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    policy: &AttendancePolicy,
    now: DateTime<Utc>,
) {
    if end > now || start > end {
        violations.push(ErrorMessage::new(ErrorCode::DateRange).with_field(fields::TRAINING_END));
        return;
    }
    violations.check(end - start > policy.max_training_duration, || {
        ErrorMessage::new(ErrorCode::TrainingTooLong).with_field(fields::TRAINING_END)
    });
    violations.check(now - end > policy.max_registration_delay, || {
        ErrorMessage::new(ErrorCode::RegistrationTooLate).with_field(fields::TRAINING_END)
    });
}

/// Raster formats accepted as confirmation photographs.
pub const ACCEPTED_IMAGE_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif];

/// Check a base64 confirmation image.
///
/// Returns the violation instead of pushing it so callers keep the fixed
/// ordering of their checks.
pub fn check_confirmation_image(image: &str, policy: &AttendancePolicy) -> Option<ErrorMessage> {
    let Ok(bytes) = STANDARD.decode(image.trim()) else {
        return Some(ErrorMessage::new(ErrorCode::Base64).with_field(fields::CONFIRMATION_IMAGE));
    };
    if bytes.len() > policy.max_confirmation_image_bytes {
        return Some(
            ErrorMessage::new(ErrorCode::ImageNotAccepted)
                .with_field(fields::CONFIRMATION_IMAGE)
                .with_value(bytes.len().to_string()),
        );
    }
    match image::guess_format(&bytes) {
        Ok(format) if ACCEPTED_IMAGE_FORMATS.contains(&format) => None,
        _ => Some(ErrorMessage::new(ErrorCode::ImageFormat).with_field(fields::CONFIRMATION_IMAGE)),
    }
}

/// Confirmation checks in their fixed order: CR, control token, window,
/// image and state. `verification_matches` is `None` when the caller did
/// not present a code.
pub fn validate_confirmation(
    stored: &Attendance,
    cr: &str,
    control_number: ControlNumber,
    image: &str,
    verification_matches: Option<bool>,
    policy: &AttendancePolicy,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let mut violations = Violations::default();
    push_identity_checks(&mut violations, stored, cr, control_number);
    violations.check(stored.window_elapsed(now, policy.confirmation_window), || {
        ErrorMessage::new(ErrorCode::ConfirmationExpired)
    });
    if let Some(message) = check_confirmation_image(image, policy) {
        violations.push(message);
    }
    violations.check(stored.is_confirmed(), || {
        ErrorMessage::new(ErrorCode::AlreadyConfirmed)
    });
    violations.check(verification_matches == Some(false), || {
        ErrorMessage::new(ErrorCode::VerificationCodeMismatch).with_field(fields::VERIFICATION_CODE)
    });
    violations.into_result()
}

/// Lookup checks: CR, control token and verification code.
pub fn validate_lookup(
    stored: &Attendance,
    cr: &str,
    control_number: ControlNumber,
    verification_matches: bool,
) -> Result<(), Error> {
    let mut violations = Violations::default();
    push_identity_checks(&mut violations, stored, cr, control_number);
    violations.check(!verification_matches, || {
        ErrorMessage::new(ErrorCode::VerificationCodeMismatch).with_field(fields::VERIFICATION_CODE)
    });
    violations.into_result()
}

fn push_identity_checks(
    violations: &mut Violations,
    stored: &Attendance,
    cr: &str,
    control_number: ControlNumber,
) {
    violations.check(stored.cr != cr.trim(), || {
        ErrorMessage::new(ErrorCode::CrMismatch)
            .with_field(fields::CR)
            .with_value(cr.trim())
    });
    violations.check(stored.control != control_number.control(), || {
        ErrorMessage::new(ErrorCode::ControlMismatch)
            .with_field(fields::CONTROL_NUMBER)
            .with_value(control_number.to_string())
    });
}
