//! Generic handler: level, formatter, filters and timeout around an emitter
//!
//! [`Handler::handle`] is the orchestration step shared by every sink:
//! filter synchronously, then spawn `format + emit` on the tokio runtime and
//! race it against the handler's deadline. Sink-specific I/O lives in the
//! [`Emit`] implementation.

use super::delivery::Delivery;
use super::emit::Emit;
use super::error::{LoggerError, Result};
use super::filter::{Filter, Filterer};
use super::formatter::{FormatLayer, Formatter, TextFormatter};
use super::log_level::Level;
use super::metrics::HandlerMetrics;
use super::record::Record;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Delivery deadline used when none is configured
pub const DEFAULT_EMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction options shared by all handlers
///
/// # Example
///
/// ```
/// use rufus::core::{HandlerOptions, Level, MessageFormatter};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let options = HandlerOptions::new()
///     .with_level(Level::WARN)
///     .with_formatter(Arc::new(MessageFormatter))
///     .with_timeout(Duration::from_millis(250));
/// assert_eq!(options.level(), Level::WARN);
/// ```
#[derive(Clone)]
pub struct HandlerOptions {
    level: Level,
    formatter: Option<Arc<dyn Formatter>>,
    default_formatter: Arc<dyn Formatter>,
    timeout: Option<Duration>,
    filters: Filterer,
    terminator: String,
    layer: Option<Arc<dyn FormatLayer>>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            level: Level::NOTSET,
            formatter: None,
            default_formatter: Arc::new(TextFormatter::new()),
            timeout: Some(DEFAULT_EMIT_TIMEOUT),
            filters: Filterer::new(),
            terminator: String::from("\n"),
            layer: None,
        }
    }
}

impl HandlerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Formatter used while no explicit formatter is set.
    ///
    /// Pass the same `Arc` to every handler to share one process default.
    #[must_use]
    pub fn with_default_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.default_formatter = formatter;
        self
    }

    /// Delivery deadline; `Duration::ZERO` means unlimited
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.add_filter(filter);
        self
    }

    /// Appended by stream-based handlers after each formatted record
    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    #[must_use]
    pub fn with_format_layer(mut self, layer: Arc<dyn FormatLayer>) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }
}

impl std::fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level)
            .field("has_formatter", &self.formatter.is_some())
            .field("timeout", &self.timeout)
            .field("filters", &self.filters)
            .field("terminator", &self.terminator)
            .finish_non_exhaustive()
    }
}

/// Mutable handler state, shared between the handler and its emit tasks
pub struct HandlerCore {
    level: RwLock<Level>,
    formatter: RwLock<Option<Arc<dyn Formatter>>>,
    default_formatter: Arc<dyn Formatter>,
    filters: RwLock<Filterer>,
    timeout: RwLock<Option<Duration>>,
    terminator: String,
    layer: Option<Arc<dyn FormatLayer>>,
    metrics: Arc<HandlerMetrics>,
}

impl HandlerCore {
    pub fn new(options: HandlerOptions) -> Self {
        Self {
            level: RwLock::new(options.level),
            formatter: RwLock::new(options.formatter),
            default_formatter: options.default_formatter,
            filters: RwLock::new(options.filters),
            timeout: RwLock::new(options.timeout),
            terminator: options.terminator,
            layer: options.layer,
            metrics: Arc::new(HandlerMetrics::new()),
        }
    }

    pub fn level(&self) -> Level {
        *self.level.read()
    }

    pub fn timeout(&self) -> Option<Duration> {
        *self.timeout.read()
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        &self.metrics
    }

    /// The explicitly configured formatter, if any
    pub fn formatter(&self) -> Option<Arc<dyn Formatter>> {
        self.formatter.read().clone()
    }

    /// Format with the configured (or default) formatter, then the format layer
    pub fn format(&self, record: &Record) -> Result<String> {
        let formatter = self
            .formatter()
            .unwrap_or_else(|| Arc::clone(&self.default_formatter));
        let formatted = formatter.format(record)?;
        match &self.layer {
            Some(layer) => layer.wrap(record, formatted),
            None => Ok(formatted),
        }
    }

    /// [`format`](Self::format) plus the line terminator, as bytes for a sink
    pub fn format_line(&self, record: &Record) -> Result<Vec<u8>> {
        let mut line = self.format(record)?;
        line.push_str(&self.terminator);
        Ok(line.into_bytes())
    }

    /// Level threshold first, then the filter chain
    pub fn accepts(&self, record: &Record) -> bool {
        record.level >= self.level() && self.filters.read().filter(record)
    }
}

/// Object-safe handler capability used by multi-handler dispatch
pub trait Handleable: Send + Sync {
    fn handle(&self, record: Record) -> Delivery;
    fn name(&self) -> &str;
    fn level(&self) -> Level;
    fn set_level(&self, level: Level);
    fn set_formatter(&self, formatter: Arc<dyn Formatter>);
    fn add_filter(&self, filter: Arc<dyn Filter>);
}

struct Shared<E> {
    core: HandlerCore,
    emitter: E,
}

/// A handler delivering records through the emitter `E`.
///
/// Cloning is cheap and yields another reference to the same handler.
pub struct Handler<E> {
    inner: Arc<Shared<E>>,
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Emit> Handler<E> {
    pub fn from_emitter(emitter: E, options: HandlerOptions) -> Self {
        Self {
            inner: Arc::new(Shared {
                core: HandlerCore::new(options),
                emitter,
            }),
        }
    }

    /// Start delivering `record` and return its pending result.
    ///
    /// Filtering happens before this returns; a rejected record yields an
    /// already-successful delivery and is never formatted. Accepted records
    /// are formatted and emitted on a spawned task, so this must be called
    /// from within a tokio runtime.
    pub fn handle(&self, record: Record) -> Delivery {
        let core = &self.inner.core;
        let name = self.inner.emitter.name();

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| core.accepts(&record))) {
            Ok(true) => {}
            Ok(false) => {
                core.metrics.record_filtered();
                return Delivery::settled(Ok(()));
            }
            Err(payload) => {
                core.metrics.record_failed();
                return Delivery::settled(Err(LoggerError::panicked(name, payload.as_ref())));
            }
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                return Delivery::settled(Err(LoggerError::config(
                    name,
                    "handle() must be called from within a tokio runtime",
                )))
            }
        };

        let deadline = core
            .timeout()
            .map(|timeout| (tokio::time::Instant::now() + timeout, timeout));
        let inner = Arc::clone(&self.inner);
        let task = runtime.spawn(async move {
            let mut outcome = EmitOutcome::new(&inner.core.metrics);
            let result = inner.emitter.emit(&inner.core, &record).await;
            outcome.settle(result.is_ok());
            result
        });

        Delivery::spawned(task, deadline, name.to_string(), Arc::clone(&core.metrics))
    }

    /// Run the emitter directly, without filtering or deadline
    pub async fn emit(&self, record: &Record) -> Result<()> {
        self.inner.emitter.emit(&self.inner.core, record).await
    }

    pub fn format(&self, record: &Record) -> Result<String> {
        self.inner.core.format(record)
    }

    pub fn set_level(&self, level: Level) -> &Self {
        *self.inner.core.level.write() = level;
        self
    }

    pub fn level(&self) -> Level {
        self.inner.core.level()
    }

    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) -> &Self {
        *self.inner.core.formatter.write() = Some(Arc::clone(&formatter));
        self.inner.emitter.on_formatter_change(Some(&formatter));
        self
    }

    /// Fall back to the default formatter again
    pub fn clear_formatter(&self) -> &Self {
        *self.inner.core.formatter.write() = None;
        self.inner.emitter.on_formatter_change(None);
        self
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) -> &Self {
        self.inner.core.filters.write().add_filter(filter);
        self
    }

    /// Replace the delivery deadline; `None` means unlimited
    pub fn set_timeout(&self, timeout: Option<Duration>) -> &Self {
        *self.inner.core.timeout.write() = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.core.timeout()
    }

    pub fn name(&self) -> &str {
        self.inner.emitter.name()
    }

    pub fn core(&self) -> &HandlerCore {
        &self.inner.core
    }

    pub fn emitter(&self) -> &E {
        &self.inner.emitter
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        self.inner.core.metrics()
    }
}

impl<E: Emit> Handleable for Handler<E> {
    fn handle(&self, record: Record) -> Delivery {
        Handler::handle(self, record)
    }

    fn name(&self) -> &str {
        Handler::name(self)
    }

    fn level(&self) -> Level {
        Handler::level(self)
    }

    fn set_level(&self, level: Level) {
        Handler::set_level(self, level);
    }

    fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        Handler::set_formatter(self, formatter);
    }

    fn add_filter(&self, filter: Arc<dyn Filter>) {
        Handler::add_filter(self, filter);
    }
}

/// Counts one emit task's outcome, including a panic or cancellation that
/// never reaches [`settle`](Self::settle)
struct EmitOutcome<'a> {
    metrics: &'a HandlerMetrics,
    settled: bool,
}

impl<'a> EmitOutcome<'a> {
    fn new(metrics: &'a HandlerMetrics) -> Self {
        Self {
            metrics,
            settled: false,
        }
    }

    fn settle(&mut self, delivered: bool) {
        if delivered {
            self.metrics.record_delivered();
        } else {
            self.metrics.record_failed();
        }
        self.settled = true;
    }
}

impl Drop for EmitOutcome<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.metrics.record_failed();
        }
    }
}
