//! Verbosity-gated scheduler logging on top of `tracing`.
//!
//! The host installs whatever subscriber it wants; [`level_filter`] gives the
//! matching filter for a configured verbosity. The gate keeps hot loops free
//! of event construction when logging is off.
//! - 0: SILENT (warnings only)
//! - 1: CHANGES (run summaries, recomputes)
//! - 2: CHECKS (per-sweep progress)
//! - 3: DEBUG (per-task values)

use tracing::level_filters::LevelFilter;

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Most detailed level a subscriber needs to show everything a run at
/// `verbosity` emits.
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        VERBOSITY_SILENT => LevelFilter::WARN,
        VERBOSITY_CHANGES => LevelFilter::INFO,
        VERBOSITY_CHECKS => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_gated {
    ($min:expr, $level:expr, $verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $min {
            ::tracing::event!($level, $($arg)*);
        }
    };
}

/// Run summaries and recomputes (verbosity >= 1), at INFO.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!(
            $crate::logging::VERBOSITY_CHANGES,
            ::tracing::Level::INFO,
            $verbosity,
            $($arg)*
        )
    };
}

/// Per-pass progress (verbosity >= 2), at DEBUG.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!(
            $crate::logging::VERBOSITY_CHECKS,
            ::tracing::Level::DEBUG,
            $verbosity,
            $($arg)*
        )
    };
}

/// Per-task values (verbosity >= 3), at TRACE.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!(
            $crate::logging::VERBOSITY_DEBUG,
            ::tracing::Level::TRACE,
            $verbosity,
            $($arg)*
        )
    };
}
