//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope.
//!
//! An [`Error`] is an ordered bundle of [`ErrorMessage`]s. Validation gathers
//! every failing check into one bundle; state and resource failures carry a
//! single message. The bundle serialises as a JSON array of messages and
//! keeps the order in which the checks ran.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::TraceId;

/// Broad family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller sent something the domain refuses.
    Input,
    /// The stored state does not allow the operation.
    State,
    /// A dependency (secret, font, renderer, store) failed.
    Resource,
}

/// Stable machine-readable error code.
///
/// Codes serialise to their wire names, e.g. `"ErrRequiredField"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A mandatory field is absent, empty or not positive.
    #[serde(rename = "ErrRequiredField")]
    RequiredField,
    /// The weapon serial number does not match the accepted pattern.
    #[serde(rename = "ErrSerialFormat")]
    SerialFormat,
    /// The control number is not `<id>-<control>`.
    #[serde(rename = "ErrControlNumberFormat")]
    ControlNumberFormat,
    /// Training dates are inverted or lie in the future.
    #[serde(rename = "ErrDateRange")]
    DateRange,
    /// Training lasted longer than allowed.
    #[serde(rename = "ErrTrainingTooLong")]
    TrainingTooLong,
    /// Registration arrived too long after the training ended.
    #[serde(rename = "ErrRegistrationTooLate")]
    RegistrationTooLate,
    /// The confirmation image is not valid base64.
    #[serde(rename = "ErrBase64")]
    Base64,
    /// The confirmation image is not PNG, JPEG or GIF.
    #[serde(rename = "ErrImageFormat")]
    ImageFormat,
    /// The confirmation image was refused (too large).
    #[serde(rename = "ErrImageNotAccepted")]
    ImageNotAccepted,
    /// The CR does not match the stored attendance.
    #[serde(rename = "ErrCrMismatch")]
    CrMismatch,
    /// The control token does not match the stored attendance.
    #[serde(rename = "ErrControlMismatch")]
    ControlMismatch,
    /// The confirmation window has elapsed.
    #[serde(rename = "ErrConfirmationExpired")]
    ConfirmationExpired,
    /// The attendance was already confirmed.
    #[serde(rename = "ErrAlreadyConfirmed")]
    AlreadyConfirmed,
    /// The verification code does not belong to this attendance.
    #[serde(rename = "ErrVerificationCodeMismatch")]
    VerificationCodeMismatch,
    /// The attendance does not exist.
    #[serde(rename = "ErrNotFound")]
    NotFound,
    /// A concurrent writer changed the attendance first.
    #[serde(rename = "ErrStale")]
    Stale,
    /// No verification secret is configured.
    #[serde(rename = "ErrSecretMissing")]
    SecretMissing,
    /// No TrueType face is available for rendering.
    #[serde(rename = "ErrFontMissing")]
    FontMissing,
    /// Rendering the control-number image failed.
    #[serde(rename = "ErrRenderFailed")]
    RenderFailed,
    /// The store could not be reached or refused the statement.
    #[serde(rename = "ErrStorageUnavailable")]
    StorageUnavailable,
}

impl ErrorCode {
    /// Category used by adapters to choose a status.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::NotFound | Self::Stale => ErrorCategory::State,
            Self::SecretMissing
            | Self::FontMissing
            | Self::RenderFailed
            | Self::StorageUnavailable => ErrorCategory::Resource,
            _ => ErrorCategory::Input,
        }
    }

    /// Wire name of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiredField => "ErrRequiredField",
            Self::SerialFormat => "ErrSerialFormat",
            Self::ControlNumberFormat => "ErrControlNumberFormat",
            Self::DateRange => "ErrDateRange",
            Self::TrainingTooLong => "ErrTrainingTooLong",
            Self::RegistrationTooLate => "ErrRegistrationTooLate",
            Self::Base64 => "ErrBase64",
            Self::ImageFormat => "ErrImageFormat",
            Self::ImageNotAccepted => "ErrImageNotAccepted",
            Self::CrMismatch => "ErrCrMismatch",
            Self::ControlMismatch => "ErrControlMismatch",
            Self::ConfirmationExpired => "ErrConfirmationExpired",
            Self::AlreadyConfirmed => "ErrAlreadyConfirmed",
            Self::VerificationCodeMismatch => "ErrVerificationCodeMismatch",
            Self::NotFound => "ErrNotFound",
            Self::Stale => "ErrStale",
            Self::SecretMissing => "ErrSecretMissing",
            Self::FontMissing => "ErrFontMissing",
            Self::RenderFailed => "ErrRenderFailed",
            Self::StorageUnavailable => "ErrStorageUnavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an error bundle.
///
/// # Examples
/// ```
/// use frequencia::domain::{ErrorCode, ErrorMessage};
///
/// let message = ErrorMessage::new(ErrorCode::RequiredField)
///     .with_field("quantidadeMunicao")
///     .with_value("0");
/// assert_eq!(message.field(), Some("quantidadeMunicao"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl ErrorMessage {
    /// Message carrying only a code.
    pub const fn new(code: ErrorCode) -> Self {
        Self {
            code,
            field: None,
            value: None,
        }
    }

    /// Attach the path of the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(field) = &self.field {
            write!(f, " ({field})")?;
        }
        if let Some(value) = &self.value {
            write!(f, " = {value:?}")?;
        }
        Ok(())
    }
}

/// Ordered bundle of error messages.
///
/// Besides the messages, an error remembers the trace identifier in scope
/// when it was built and an internal context (operation and cause) that is
/// logged by adapters but never serialised.
///
/// # Examples
/// ```
/// use frequencia::domain::{Error, ErrorCode, ErrorMessage};
///
/// let err = Error::from_messages(vec![
///     ErrorMessage::new(ErrorCode::RequiredField).with_field("calibre"),
///     ErrorMessage::new(ErrorCode::RequiredField).with_field("armaUtilizada"),
/// ]);
/// assert_eq!(err.messages().len(), 2);
/// assert_eq!(err.code(), Some(ErrorCode::RequiredField));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    messages: Vec<ErrorMessage>,
    trace_id: Option<String>,
    context: Option<String>,
}

impl Error {
    /// Build a bundle from already collected messages.
    pub fn from_messages(messages: Vec<ErrorMessage>) -> Self {
        Self {
            messages,
            trace_id: TraceId::current().map(|id| id.to_string()),
            context: None,
        }
    }

    /// Bundle holding a single code-only message.
    pub fn new(code: ErrorCode) -> Self {
        Self::from_messages(vec![ErrorMessage::new(code)])
    }

    /// Bundle holding one message.
    pub fn from_message(message: ErrorMessage) -> Self {
        Self::from_messages(vec![message])
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound)
    }

    /// Convenience constructor for [`ErrorCode::Stale`].
    pub fn stale() -> Self {
        Self::new(ErrorCode::Stale)
    }

    /// Resource failure wrapped with the operation that hit it.
    pub fn resource(code: ErrorCode, operation: &str, cause: impl fmt::Display) -> Self {
        Self::new(code).with_context(format!("{operation}: {cause}"))
    }

    /// Shortcut for [`ErrorCode::StorageUnavailable`] failures.
    pub fn storage(operation: &str, cause: impl fmt::Display) -> Self {
        Self::resource(ErrorCode::StorageUnavailable, operation, cause)
    }

    /// Attach an internal diagnostic context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Override the trace identifier.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }

    /// Code of the first message, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.messages.first().map(ErrorMessage::code)
    }

    /// Codes in bundle order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.messages.iter().map(ErrorMessage::code).collect()
    }

    /// True when some message carries `code`.
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.messages.iter().any(|message| message.code == code)
    }

    /// Category of the bundle.
    ///
    /// Any state or resource message dominates input messages; an empty
    /// bundle counts as a resource failure.
    pub fn category(&self) -> ErrorCategory {
        let mut category = None;
        for message in &self.messages {
            match message.code.category() {
                ErrorCategory::Resource => return ErrorCategory::Resource,
                ErrorCategory::State => category = Some(ErrorCategory::State),
                ErrorCategory::Input => {
                    category.get_or_insert(ErrorCategory::Input);
                }
            }
        }
        category.unwrap_or(ErrorCategory::Resource)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorMessage> {
        self.messages.iter()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in &self.messages {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{message}")?;
            first = false;
        }
        if let Some(context) = &self.context {
            write!(f, " [{context}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.messages.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Error {
    type Item = &'a ErrorMessage;
    type IntoIter = std::slice::Iter<'a, ErrorMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl IntoIterator for Error {
    type Item = ErrorMessage;
    type IntoIter = std::vec::IntoIter<ErrorMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl From<ErrorMessage> for Error {
    fn from(message: ErrorMessage) -> Self {
        Self::from_message(message)
    }
}

/// Accumulates validation failures without short-circuiting.
///
/// # Examples
/// ```
/// use frequencia::domain::{ErrorCode, ErrorMessage, Violations};
///
/// let mut violations = Violations::default();
/// violations.push(ErrorMessage::new(ErrorCode::DateRange));
/// let err = violations.into_result().expect_err("one violation recorded");
/// assert_eq!(err.codes(), vec![ErrorCode::DateRange]);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Violations(Vec<ErrorMessage>);

impl Violations {
    pub fn push(&mut self, message: ErrorMessage) {
        self.0.push(message);
    }

    /// Record `message` when `failed` holds.
    pub fn check(&mut self, failed: bool, message: impl FnOnce() -> ErrorMessage) {
        if failed {
            self.0.push(message());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise the whole bundle.
    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::from_messages(self.0))
        }
    }
}

#[cfg(test)]
mod tests;
