//! Error types shared across subsystems.
//!
//! Each subsystem owns one enum in [`types`]; the web layer maps them onto
//! HTTP statuses and the controller wraps them for startup failures.

pub mod types;
