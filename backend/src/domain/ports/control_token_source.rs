//! Port for allocating random control tokens.

/// Source of the random half of a control number.
///
/// Implementations are shared by every worker and must serialise access to
/// their internal state.
#[cfg_attr(test, mockall::automock)]
pub trait ControlTokenSource: Send + Sync {
    /// Next non-negative 63-bit token.
    fn next_control(&self) -> i64;
}
