//! Shared helpers: errors, logging setup and formatting
pub mod error;
pub mod format;
pub mod logging;
