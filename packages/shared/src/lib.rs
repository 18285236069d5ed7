//! Shared utilities for the Vitalink workspace.
//!
//! - `logger`: tracing subscriber setup used by every binary
//! - `time`: clock abstraction and timestamp formatting

pub mod logger;
pub mod time;
