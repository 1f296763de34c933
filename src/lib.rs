//! adb-verify library root
//!
//! Re-exports core functionality for external use.

pub mod config;
pub mod core;
pub mod error;
pub mod util;

pub use config::Config;
pub use error::{Error, LedgerError, Result};
