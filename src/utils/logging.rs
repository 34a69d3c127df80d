//! Logger setup plus macros that respect a module-level `ENABLE_LOGS` flag.
//!
//! A module opts in by declaring the flag and importing the macros, which are
//! exported at the crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//!
//! log_info!("stored {} rows", rows.len());
//! ```
//! Setting the flag to `false` silences the module without touching
//! `RUST_LOG`.

use env_logger::Env;

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}
