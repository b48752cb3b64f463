//! # rufus
//!
//! Structured logging pipeline with asynchronous, deadline-bounded handlers.
//!
//! Records flow from a [`Logger`] (or straight from the caller) into one or
//! more handlers. Each handler gates records by level and filters, formats
//! them lazily, and delivers them to its sink on the tokio runtime. Delivery
//! of a record is raced against the handler's timeout; a slow or failing
//! sink only ever fails its own record.
//!
//! ## Handlers
//!
//! - [`StreamHandler`]: any byte [`Sink`](handlers::Sink)
//! - [`FileHandler`]: lazily opened append-mode file
//! - [`RotatingFileHandler`]: size-bounded files with numbered backups
//! - [`ConsoleHandler`]: stdout, stderr from WARN up, ANSI colors by level
//!
//! ## Example
//!
//! ```no_run
//! use rufus::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rufus::Result<()> {
//!     let logger = Logger::new("app");
//!     logger.add_handler(Arc::new(ConsoleHandler::new(HandlerOptions::new())));
//!     logger.add_handler(Arc::new(RotatingFileHandler::new(
//!         "logs/app.log",
//!         RotationPolicy::new().with_max_bytes(1024 * 1024).with_max_files(5),
//!         HandlerOptions::new().with_level(Level::INFO),
//!     )));
//!
//!     for result in logger.info("service started").await {
//!         result?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        Delivery, Emit, Filter, FormatLayer, Formatter, Handleable, Handler, HandlerOptions,
        JsonFormatter, Level, Logger, LoggerError, MessageFormatter, NameFilter, Record, Result,
        TextFormatter, TimestampFormat,
    };
    pub use crate::handlers::{
        ConsoleHandler, FileHandler, MemorySink, RotatingFileHandler, RotationPolicy, Sink,
        StreamHandler, WriterSink,
    };
}

pub use crate::core::{
    Delivery, Dispatch, Emit, Filter, Filterer, FormatLayer, Formatter, Handleable, Handler,
    HandlerCore, HandlerMetrics, HandlerOptions, JsonFormatter, Level, Logger, LoggerError,
    MessageFormatter, NameFilter, Record, Result, TextFormatter, TimestampFormat,
    DEFAULT_EMIT_TIMEOUT,
};
pub use handlers::{
    ConsoleHandler, FileHandler, MemorySink, RotatingFileHandler, RotationPolicy, Sink,
    StreamHandler, WriterSink,
};
