//! Predictable control token source.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::ports::ControlTokenSource;

/// Hands out consecutive tokens from a starting value.
#[derive(Debug)]
pub struct CountingTokenSource(AtomicI64);

impl CountingTokenSource {
    pub fn starting_at(first: i64) -> Self {
        Self(AtomicI64::new(first))
    }
}

impl ControlTokenSource for CountingTokenSource {
    fn next_control(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}
