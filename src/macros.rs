//! Logging macros with `format!`-style arguments.
//!
//! Each macro builds the message with `format!` and calls the matching
//! [`Logger`](crate::core::Logger) method, returning its
//! [`Dispatch`](crate::core::Dispatch) future. Delivery has already started
//! when the macro returns; await the future to collect per-handler results.
//!
//! # Examples
//!
//! ```
//! use rufus::prelude::*;
//! use rufus::info;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let logger = Logger::new("server");
//! let handler = StreamHandler::new(
//!     MemorySink::new(),
//!     HandlerOptions::new().with_formatter(Arc::new(MessageFormatter)),
//! );
//! logger.add_handler(Arc::new(handler.clone()));
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).await;
//! assert_eq!(handler.sink().contents(), "Server listening on port 8080\n");
//! # });
//! ```

/// Log a message at an explicit level.
///
/// ```
/// # use rufus::prelude::*;
/// use rufus::log;
/// # tokio_test::block_on(async {
/// let logger = Logger::new("app");
/// log!(logger, Level::INFO, "Simple message").await;
/// log!(logger, Level::ERROR, "Error code: {}", 500).await;
/// # });
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::VERBOSE, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARN, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// ```
/// # use rufus::prelude::*;
/// use rufus::critical;
/// # tokio_test::block_on(async {
/// let logger = Logger::new("app");
/// critical!(logger, "Unable to recover from error: {}", "disk full").await;
/// # });
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::CRITICAL, $($arg)+)
    };
}
