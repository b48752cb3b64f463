//! Formatters turn a [`Record`] into a display line
//!
//! A formatter is an opaque `record -> string` function. Handlers call it
//! lazily, only for records that passed their filter chain, and append their
//! own line terminator afterwards.

use super::error::{LoggerError, Result};
use super::record::Record;
use super::timestamp::TimestampFormat;

pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record) -> Result<String>;
}

impl<F> Formatter for F
where
    F: Fn(&Record) -> Result<String> + Send + Sync,
{
    fn format(&self, record: &Record) -> Result<String> {
        self(record)
    }
}

/// Post-processing applied on top of whichever formatter is active.
///
/// The layer receives the formatted line and returns a new string; the
/// record itself stays untouched.
pub trait FormatLayer: Send + Sync {
    fn wrap(&self, record: &Record, formatted: String) -> Result<String>;
}

/// `[timestamp] LEVEL    name - message`, followed by ` key=value` attributes
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    timestamp_format: TimestampFormat,
}

impl TextFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let mut line = format!(
            "[{}] {:8} {} - {}",
            self.timestamp_format.format(&record.timestamp),
            record.levelname,
            record.name,
            record.message
        );
        for (key, value) in &record.attributes {
            match value {
                serde_json::Value::String(s) => line.push_str(&format!(" {}={}", key, s)),
                other => line.push_str(&format!(" {}={}", key, other)),
            }
        }
        Ok(line)
    }
}

/// Only the record message
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFormatter;

impl Formatter for MessageFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        Ok(record.message.clone())
    }
}

/// One JSON object per record
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
}

impl JsonFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let mut object = serde_json::Map::new();
        object.insert(
            "timestamp".to_string(),
            self.timestamp_format.format(&record.timestamp).into(),
        );
        object.insert("level".to_string(), record.level.value().into());
        object.insert("levelname".to_string(), record.levelname.clone().into());
        object.insert("name".to_string(), record.name.clone().into());
        object.insert("message".to_string(), record.message.clone().into());
        for (key, value) in &record.attributes {
            if object.contains_key(key) {
                return Err(LoggerError::formatter(
                    "JSON",
                    format!("attribute '{}' collides with a record field", key),
                ));
            }
            object.insert(key.clone(), value.clone());
        }
        Ok(serde_json::to_string(&object)?)
    }
}
