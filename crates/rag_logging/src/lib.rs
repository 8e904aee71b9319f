#![deny(missing_docs)]
//! Shared logging utilities for the export workspace.
//!
//! Every crate logs through the `rag_*` macros so that all records land under
//! the single [`LOG_TARGET`] target, which keeps them filterable from host
//! logs when the exporter is embedded.

/// Log target used by every `rag_*` macro.
pub const LOG_TARGET: &str = "wikirag";

/// Formats a page as `namespace:title` for log lines.
pub fn page_label(namespace: i32, title: &str) -> String {
    format!("{namespace}:{title}")
}

/// Logs a trace-level message under the export log target.
#[macro_export]
macro_rules! rag_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the export log target.
#[macro_export]
macro_rules! rag_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the export log target.
#[macro_export]
macro_rules! rag_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the export log target.
#[macro_export]
macro_rules! rag_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the export log target.
#[macro_export]
macro_rules! rag_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_label_joins_namespace_and_title() {
        assert_eq!(page_label(0, "Main_Page"), "0:Main_Page");
        assert_eq!(page_label(6, "Report.pdf"), "6:Report.pdf");
    }

    #[test]
    fn macros_accept_format_arguments() {
        initialize_for_tests();
        rag_trace!("trace {}", 1);
        rag_debug!("debug {}", 2);
        rag_info!("info {}", 3);
        rag_warn!("warn {}", 4);
        rag_error!("error {}", 5);
    }
}
