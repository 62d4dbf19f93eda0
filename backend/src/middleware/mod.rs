//! Request middleware: trace identifiers and the panic envelope.

pub mod recover;
pub mod trace;

pub use recover::Recover;
pub use trace::Trace;
