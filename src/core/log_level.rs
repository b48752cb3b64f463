//! Level table: integer severities with named constants

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record, on an integer scale.
///
/// `NOTSET` accepts everything; a handler processes a record iff
/// `record.level >= handler.level`. Values above `CRITICAL` are rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", into = "String")]
pub struct Level(u32);

impl Level {
    pub const NOTSET: Level = Level(0);
    pub const VERBOSE: Level = Level(5);
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const WARN: Level = Level(30);
    pub const ERROR: Level = Level(40);
    pub const CRITICAL: Level = Level(50);

    /// Every named level, lowest first
    pub const NAMED: [Level; 7] = [
        Level::NOTSET,
        Level::VERBOSE,
        Level::DEBUG,
        Level::INFO,
        Level::WARN,
        Level::ERROR,
        Level::CRITICAL,
    ];

    /// Look up a level by number
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidLevel`] for values above `CRITICAL`.
    pub fn from_value(value: u32) -> Result<Self> {
        if value > Level::CRITICAL.0 {
            return Err(LoggerError::invalid_level(value.to_string()));
        }
        Ok(Level(value))
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Name of a level from the table, `None` for unnamed numbers
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Level::NOTSET => Some("NOTSET"),
            Level::VERBOSE => Some("VERBOSE"),
            Level::DEBUG => Some("DEBUG"),
            Level::INFO => Some("INFO"),
            Level::WARN => Some("WARN"),
            Level::ERROR => Some("ERROR"),
            Level::CRITICAL => Some("CRITICAL"),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Level {}", self.0),
        }
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NOTSET" => Ok(Level::NOTSET),
            "VERBOSE" => Ok(Level::VERBOSE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARN),
            "ERROR" => Ok(Level::ERROR),
            "CRITICAL" => Ok(Level::CRITICAL),
            other => other
                .strip_prefix("LEVEL ")
                .unwrap_or(other)
                .parse::<u32>()
                .map_err(|_| LoggerError::invalid_level(s))
                .and_then(Level::from_value),
        }
    }
}

impl TryFrom<u32> for Level {
    type Error = LoggerError;

    fn try_from(value: u32) -> Result<Self> {
        Level::from_value(value)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Value(u32),
    Name(String),
}

impl TryFrom<LevelRepr> for Level {
    type Error = LoggerError;

    fn try_from(repr: LevelRepr) -> Result<Self> {
        match repr {
            LevelRepr::Value(value) => Level::from_value(value),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}
