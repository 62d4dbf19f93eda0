//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL repositories built on Diesel
//! - **imaging**: control-number ticket rendering

pub mod imaging;
pub mod persistence;
