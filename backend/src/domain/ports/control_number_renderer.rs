//! Port for rendering the control-number image.

use crate::domain::ControlNumber;

/// Errors raised by renderer adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The configured TrueType face could not be loaded.
    #[error("font face unavailable: {message}")]
    FontMissing { message: String },
    /// Any other drawing, QR or encoding failure.
    #[error("{operation} failed: {message}")]
    Failed { operation: String, message: String },
}

impl RenderError {
    pub fn font_missing(message: impl Into<String>) -> Self {
        Self::FontMissing {
            message: message.into(),
        }
    }

    pub fn failed(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Failed {
            operation: operation.into(),
            message: cause.to_string(),
        }
    }
}

/// Renders the ticket a shooter photographs on site.
#[cfg_attr(test, mockall::automock)]
pub trait ControlNumberRenderer: Send + Sync {
    /// Render the ticket for `control_number` and return a base64 PNG.
    fn render(
        &self,
        control_number: ControlNumber,
        cr: &str,
        verification_code: &str,
    ) -> Result<String, RenderError>;
}

/// Fixture renderer returning a fixed base64 payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureControlNumberRenderer;

impl ControlNumberRenderer for FixtureControlNumberRenderer {
    fn render(
        &self,
        _control_number: ControlNumber,
        _cr: &str,
        _verification_code: &str,
    ) -> Result<String, RenderError> {
        // Base64 of the eight-byte PNG signature.
        Ok("iVBORw0KGgo=".to_owned())
    }
}
