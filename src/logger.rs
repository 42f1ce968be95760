// Logging for setup-devstack.
// Every installer step reports through these macros so a run reads as a linear
// transcript on stderr: colored level tag, component tag, message.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// `log_info!` for step progress the user should always see.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_green("[INFO]"), format!($($arg)*)));
}

/// `log_warn!` for problems that do not stop the run.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_yellow("[WARN]"), format!($($arg)*)));
}

/// `log_error!` for the failure that ends a run.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_red("[ERROR]"), format!($($arg)*)));
}

/// `log_debug!` prints only when `--debug` was given.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
           eprintln!("{} {}", colored::Colorize::dimmed("[DEBUG]"), format!($($arg)*));
        }
    };
}

static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Sets the global debug flag. Called once from `main` after argument parsing.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug))
        .store(debug, Ordering::Relaxed);

    if debug {
        log_debug!("[SDS::Logger] Logger initialized in DEBUG mode");
    }
}

/// Returns `false` until `init(true)` has been called.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_follows_init() {
        init(true);
        assert!(is_debug_enabled());
        init(false);
        assert!(!is_debug_enabled());
    }
}
