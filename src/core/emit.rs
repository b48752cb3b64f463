//! Emit capability implemented by every sink-specific handler

use super::error::Result;
use super::formatter::Formatter;
use super::handler::HandlerCore;
use super::record::Record;
use async_trait::async_trait;
use std::sync::Arc;

/// Sink-specific delivery of one record.
///
/// The returned future is the completion signal: it resolves once the sink
/// has confirmed the write, or with the error that stopped it. The handler
/// runs it as a detached task, so it must not borrow anything beyond the
/// arguments.
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use rufus::core::{Emit, HandlerCore, Record, Result};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Emit for Discard {
///     async fn emit(&self, core: &HandlerCore, record: &Record) -> Result<()> {
///         let _line = core.format(record)?;
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "discard"
///     }
/// }
/// ```
#[async_trait]
pub trait Emit: Send + Sync + 'static {
    async fn emit(&self, core: &HandlerCore, record: &Record) -> Result<()>;

    fn name(&self) -> &str;

    /// Called after the owning handler's formatter was replaced or cleared
    fn on_formatter_change(&self, _formatter: Option<&Arc<dyn Formatter>>) {}
}
