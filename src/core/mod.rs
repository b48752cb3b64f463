//! Core logger types and traits

pub mod delivery;
pub mod emit;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod timestamp;

pub use delivery::Delivery;
pub use emit::Emit;
pub use error::{LoggerError, Result};
pub use filter::{Filter, Filterer, NameFilter};
pub use formatter::{FormatLayer, Formatter, JsonFormatter, MessageFormatter, TextFormatter};
pub use handler::{Handleable, Handler, HandlerCore, HandlerOptions, DEFAULT_EMIT_TIMEOUT};
pub use log_level::Level;
pub use logger::{Dispatch, Logger};
pub use metrics::HandlerMetrics;
pub use record::Record;
pub use timestamp::TimestampFormat;
