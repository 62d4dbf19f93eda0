//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay free of `ToSchema`; these wrappers mirror their wire
//! shape for the generated document.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "ErrRequiredField")]
    RequiredField,
    #[schema(rename = "ErrSerialFormat")]
    SerialFormat,
    #[schema(rename = "ErrControlNumberFormat")]
    ControlNumberFormat,
    #[schema(rename = "ErrDateRange")]
    DateRange,
    #[schema(rename = "ErrTrainingTooLong")]
    TrainingTooLong,
    #[schema(rename = "ErrRegistrationTooLate")]
    RegistrationTooLate,
    #[schema(rename = "ErrBase64")]
    Base64,
    #[schema(rename = "ErrImageFormat")]
    ImageFormat,
    #[schema(rename = "ErrImageNotAccepted")]
    ImageNotAccepted,
    #[schema(rename = "ErrCrMismatch")]
    CrMismatch,
    #[schema(rename = "ErrControlMismatch")]
    ControlMismatch,
    #[schema(rename = "ErrConfirmationExpired")]
    ConfirmationExpired,
    #[schema(rename = "ErrAlreadyConfirmed")]
    AlreadyConfirmed,
    #[schema(rename = "ErrVerificationCodeMismatch")]
    VerificationCodeMismatch,
    #[schema(rename = "ErrNotFound")]
    NotFound,
    #[schema(rename = "ErrStale")]
    Stale,
    #[schema(rename = "ErrSecretMissing")]
    SecretMissing,
    #[schema(rename = "ErrFontMissing")]
    FontMissing,
    #[schema(rename = "ErrRenderFailed")]
    RenderFailed,
    #[schema(rename = "ErrStorageUnavailable")]
    StorageUnavailable,
}

/// OpenAPI schema for [`crate::domain::ErrorMessage`].
///
/// Error responses are a JSON array of these entries, in the order the
/// checks ran.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorMessage)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorMessageSchema {
    /// Stable machine-readable error code.
    #[schema(example = "ErrRequiredField")]
    code: ErrorCodeSchema,
    /// Request field the message refers to.
    #[schema(example = "quantidadeMunicao")]
    field: Option<String>,
    /// Offending value, when it is safe to echo.
    #[schema(example = "0")]
    value: Option<String>,
}
