//! Console handler: stdout for routine records, stderr from WARN up

use super::sink::{Sink, WriterSink};
use super::stream::StreamHandler;
use crate::core::{
    Emit, FormatLayer, Formatter, Handler, HandlerCore, HandlerOptions, Level, LoggerError,
    Record, Result,
};
use async_trait::async_trait;
use colored::Color;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Color used for each known level name
pub fn level_color(levelname: &str) -> Option<Color> {
    match levelname {
        "VERBOSE" => Some(Color::Cyan),
        "DEBUG" => Some(Color::Blue),
        "INFO" => Some(Color::Green),
        "WARN" => Some(Color::Yellow),
        "ERROR" => Some(Color::Red),
        "CRITICAL" => Some(Color::Magenta),
        _ => None,
    }
}

/// Wraps formatted lines in the ANSI color of the record's level name
#[derive(Debug)]
pub struct ColorLayer {
    enabled: AtomicBool,
}

impl ColorLayer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

impl FormatLayer for ColorLayer {
    fn wrap(&self, record: &Record, formatted: String) -> Result<String> {
        if !self.is_enabled() {
            return Ok(formatted);
        }
        let color = level_color(&record.levelname).ok_or_else(|| {
            LoggerError::config(
                "ConsoleHandler",
                format!("no color defined for level name '{}'", record.levelname),
            )
        })?;
        // Raw escape: `Colorize` would defer to colored's process-wide override
        Ok(format!("\x1b[{}m{}\x1b[0m", color.to_fg_str(), formatted))
    }
}

pub struct ConsoleEmitter {
    stdout: StreamHandler<Arc<dyn Sink>>,
    stderr: StreamHandler<Arc<dyn Sink>>,
    colors: Arc<ColorLayer>,
}

#[async_trait]
impl Emit for ConsoleEmitter {
    async fn emit(&self, _core: &HandlerCore, record: &Record) -> Result<()> {
        if record.level >= Level::WARN {
            self.stderr.emit(record).await
        } else {
            self.stdout.emit(record).await
        }
    }

    fn name(&self) -> &str {
        "console"
    }

    fn on_formatter_change(&self, formatter: Option<&Arc<dyn Formatter>>) {
        for handler in [&self.stdout, &self.stderr] {
            match formatter {
                Some(formatter) => handler.set_formatter(Arc::clone(formatter)),
                None => handler.clear_formatter(),
            };
        }
    }
}

/// Handler writing to the process's standard output and standard error.
///
/// Records at [`Level::WARN`] and above go to stderr, everything else to
/// stdout. Both streams share the handler's formatter; colorization (on by
/// default) wraps the formatted line in an ANSI color picked by the record's
/// level name, and an unknown level name fails that record's delivery.
///
/// # Example
///
/// ```no_run
/// use rufus::core::{HandlerOptions, Level, Record};
/// use rufus::handlers::ConsoleHandler;
///
/// # async fn run() -> rufus::core::Result<()> {
/// let console = ConsoleHandler::new(HandlerOptions::new().with_level(Level::DEBUG));
/// console.set_colorize(false);
/// console.handle(Record::new(Level::WARN, "disk almost full")).await?;
/// # Ok(())
/// # }
/// ```
pub type ConsoleHandler = Handler<ConsoleEmitter>;

impl Handler<ConsoleEmitter> {
    pub fn new(options: HandlerOptions) -> Self {
        Self::with_sinks(
            Arc::new(WriterSink::stdout()),
            Arc::new(WriterSink::stderr()),
            options,
        )
    }

    /// Console handler over arbitrary sinks standing in for stdout and stderr
    pub fn with_sinks(
        stdout: Arc<dyn Sink>,
        stderr: Arc<dyn Sink>,
        options: HandlerOptions,
    ) -> Self {
        let colors = Arc::new(ColorLayer::new(true));
        let stream_options = options.clone().with_format_layer(colors.clone());
        let emitter = ConsoleEmitter {
            stdout: StreamHandler::new(stdout, stream_options.clone()),
            stderr: StreamHandler::new(stderr, stream_options),
            colors,
        };
        Handler::from_emitter(emitter, options)
    }

    pub fn set_colorize(&self, enabled: bool) -> &Self {
        self.emitter().colors.set_enabled(enabled);
        self
    }

    pub fn colorize(&self) -> bool {
        self.emitter().colors.is_enabled()
    }

    pub fn stdout_handler(&self) -> &StreamHandler<Arc<dyn Sink>> {
        &self.emitter().stdout
    }

    pub fn stderr_handler(&self) -> &StreamHandler<Arc<dyn Sink>> {
        &self.emitter().stderr
    }
}
