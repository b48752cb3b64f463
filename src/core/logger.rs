//! Named logger fanning records out to its handlers

use super::{
    delivery::Delivery,
    error::Result,
    handler::Handleable,
    log_level::Level,
    record::Record,
};
use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Per-handler results of one dispatched record, in handler registration order
pub type Dispatch = Pin<Box<dyn Future<Output = Vec<Result<()>>> + Send>>;

pub struct Logger {
    name: String,
    level: RwLock<Level>,
    handlers: RwLock<Vec<Arc<dyn Handleable>>>,
}

impl Logger {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(Level::NOTSET),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_handler(&self, handler: Arc<dyn Handleable>) {
        self.handlers.write().push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write() = level;
    }

    pub fn level(&self) -> Level {
        *self.level.read()
    }

    /// Hand `record` to every handler and collect one result per handler.
    ///
    /// Every handler starts delivering before this returns, so dropping the
    /// returned future still logs. A timeout or sink failure in one handler
    /// never holds up the others; failures are also reported on stderr.
    pub fn handle(&self, record: Record) -> Dispatch {
        let deliveries: Vec<(String, Delivery)> = if record.level < self.level() {
            Vec::new()
        } else {
            self.handlers
                .read()
                .iter()
                .map(|handler| (handler.name().to_string(), handler.handle(record.clone())))
                .collect()
        };

        Box::pin(async move {
            let mut results = Vec::with_capacity(deliveries.len());
            for (idx, (name, delivery)) in deliveries.into_iter().enumerate() {
                let result = delivery.await;
                if let Err(ref e) = result {
                    eprintln!("[LOGGER ERROR] Handler #{} ({}) failed: {}", idx, name, e);
                }
                results.push(result);
            }
            results
        })
    }

    pub fn log(&self, level: Level, message: impl Into<String>) -> Dispatch {
        self.handle(Record::new(level, message).with_name(self.name.as_str()))
    }

    #[inline]
    pub fn verbose(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::VERBOSE, message)
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::DEBUG, message)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::INFO, message)
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::WARN, message)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::ERROR, message)
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) -> Dispatch {
        self.log(Level::CRITICAL, message)
    }
}
