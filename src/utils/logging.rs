//! Conditional logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Each module that wants them defines its own flag so chatty loops can be
//! silenced individually:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn, log_error};
//! ```

/// Info-level logging, gated on the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn-level logging, gated on the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level logging, gated on the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
