//! System-level modules
//!
//! Logging initialization; lifecycle lives under `runtime`.

pub mod logging;
