//! Port for the verification code bound to a control number.

use subtle::ConstantTimeEq;

use crate::domain::ControlNumber;

/// Errors raised while deriving a verification code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationCodeError {
    /// No secret key is configured.
    #[error("verification code secret is not configured")]
    SecretMissing,
    /// Key derivation or MAC computation failed.
    #[error("verification code derivation failed: {message}")]
    Derivation { message: String },
}

/// Derives the opaque code that authenticates links to an attendance.
#[cfg_attr(test, mockall::automock)]
pub trait VerificationCodeDeriver: Send + Sync {
    /// Derive the code for `(cr, control_number)`.
    fn derive(
        &self,
        cr: &str,
        control_number: ControlNumber,
    ) -> Result<String, VerificationCodeError>;
}

/// Compare a presented code against the derived one in constant time.
pub fn verification_code_matches(
    deriver: &dyn VerificationCodeDeriver,
    cr: &str,
    control_number: ControlNumber,
    presented: &str,
) -> Result<bool, VerificationCodeError> {
    let expected = deriver.derive(cr, control_number)?;
    Ok(expected.as_bytes().ct_eq(presented.trim().as_bytes()).into())
}

/// Fixture deriver returning a code built from its inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVerificationCodeDeriver;

impl VerificationCodeDeriver for FixtureVerificationCodeDeriver {
    fn derive(
        &self,
        cr: &str,
        control_number: ControlNumber,
    ) -> Result<String, VerificationCodeError> {
        Ok(format!("code-{cr}-{control_number}"))
    }
}
