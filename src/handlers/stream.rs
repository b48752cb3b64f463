//! Stream handler: formatted lines to an arbitrary byte sink

use super::sink::{write_confirmed, Sink};
use crate::core::{Emit, Handler, HandlerCore, HandlerOptions, Record, Result};
use async_trait::async_trait;

pub struct StreamEmitter<S> {
    sink: S,
}

impl<S: Sink> StreamEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[async_trait]
impl<S: Sink> Emit for StreamEmitter<S> {
    async fn emit(&self, core: &HandlerCore, record: &Record) -> Result<()> {
        let line = core.format_line(record)?;
        write_confirmed(&self.sink, &line).await
    }

    fn name(&self) -> &str {
        "stream"
    }
}

/// Handler writing `format(record) + terminator` to a [`Sink`]
///
/// # Example
///
/// ```
/// use rufus::core::{HandlerOptions, Level, MessageFormatter, Record};
/// use rufus::handlers::{MemorySink, StreamHandler};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let handler = StreamHandler::new(
///     MemorySink::new(),
///     HandlerOptions::new().with_formatter(Arc::new(MessageFormatter)),
/// );
/// handler.handle(Record::new(Level::INFO, "ready")).await.unwrap();
/// assert_eq!(handler.sink().contents(), "ready\n");
/// # });
/// ```
pub type StreamHandler<S> = Handler<StreamEmitter<S>>;

impl<S: Sink> Handler<StreamEmitter<S>> {
    pub fn new(sink: S, options: HandlerOptions) -> Self {
        Handler::from_emitter(StreamEmitter::new(sink), options)
    }

    pub fn sink(&self) -> &S {
        self.emitter().sink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Formatter, Level, LoggerError, MessageFormatter, TextFormatter};
    use crate::handlers::MemorySink;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn message_options() -> HandlerOptions {
        HandlerOptions::new().with_formatter(Arc::new(MessageFormatter))
    }

    struct BrokenSink;

    #[async_trait]
    impl Sink for BrokenSink {
        async fn write(&self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }
    }

    #[tokio::test]
    async fn test_writes_message_and_terminator() {
        let handler = StreamHandler::new(MemorySink::new(), message_options());
        handler.handle(Record::new(Level::INFO, "foo")).await.unwrap();
        assert_eq!(handler.sink().contents(), "foo\n");
    }

    #[tokio::test]
    async fn test_custom_terminator() {
        let handler = StreamHandler::new(
            MemorySink::new(),
            message_options().with_terminator("\r\n"),
        );
        handler.handle(Record::new(Level::INFO, "a")).await.unwrap();
        handler.handle(Record::new(Level::INFO, "b")).await.unwrap();
        assert_eq!(handler.sink().contents(), "a\r\nb\r\n");
    }

    #[tokio::test]
    async fn test_waits_for_flush_on_slow_sinks() {
        let handler = StreamHandler::new(
            MemorySink::with_delay(Duration::from_millis(5)),
            message_options(),
        );
        let started = Instant::now();
        handler.handle(Record::new(Level::INFO, "secret")).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(handler.sink().contents(), "secret\n");
    }

    #[tokio::test]
    async fn test_slow_sink_past_deadline_times_out_without_cancelling_write() {
        let sink = Arc::new(MemorySink::with_delay(Duration::from_millis(40)));
        let handler = StreamHandler::new(
            Arc::clone(&sink),
            message_options().with_timeout(Duration::from_millis(5)),
        );

        let err = handler.handle(Record::new(Level::INFO, "late")).await.unwrap_err();
        assert!(err.is_timeout());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.contents(), "late\n");
        assert_eq!(handler.metrics().delivered(), 1);
        assert_eq!(handler.metrics().timed_out(), 1);
    }

    #[tokio::test]
    async fn test_write_error_rejects_delivery() {
        let handler = StreamHandler::new(BrokenSink, message_options());
        let err = handler.handle(Record::new(Level::ERROR, "x")).await.unwrap_err();
        assert!(matches!(err, LoggerError::Sink { .. }));
        assert!(err.to_string().contains("reader went away"));
    }

    #[tokio::test]
    async fn test_written_bytes_equal_formatter_output() {
        let formatter: Arc<dyn Formatter> = Arc::new(TextFormatter::new());
        let handler = StreamHandler::new(
            MemorySink::new(),
            HandlerOptions::new().with_formatter(Arc::clone(&formatter)),
        );
        let record = Record::new(Level::WARN, "exactly once").with_name("svc");
        let expected = format!("{}\n", formatter.format(&record).unwrap());

        handler.handle(record).await.unwrap();
        assert_eq!(handler.sink().contents(), expected);
    }
}
