//! Logger setup plus per-module switchable logging macros.
//!
//! A module opts in by declaring its own flag and importing the macros from the
//! crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("capture finished in {}ms", elapsed);
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Install `env_logger` once. `RUST_LOG` still wins; without it the level is `Info`,
/// or `Debug` when `TRACE_DEBUG` is `1`/`true`.
pub fn init_logging() {
    INIT.call_once(|| {
        let debug_mode = std::env::var("TRACE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let default_level = if debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };

        let result = env_logger::Builder::new()
            .filter_level(default_level)
            .parse_default_env()
            .try_init();

        if result.is_err() {
            log::debug!("logger already installed by the host application");
        }
    });
}

/// Info-level log gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn-level log gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level log gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Debug-level log gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}
