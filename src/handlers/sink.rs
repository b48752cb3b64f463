//! Byte sinks that stream-based handlers write to
//!
//! A sink confirms each write once the bytes are flushed. Sinks may also
//! raise faults outside of any write (a closed pipe, a revoked device); such
//! a fault fails the write that is in flight when it arrives and is dropped
//! when nothing is being written.

use crate::core::LoggerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

const FAULT_CHANNEL_CAPACITY: usize = 16;

/// Out-of-band failure reported by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFault {
    pub kind: io::ErrorKind,
    pub message: String,
}

impl From<io::Error> for SinkFault {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<SinkFault> for LoggerError {
    fn from(fault: SinkFault) -> Self {
        LoggerError::sink("waiting for write confirmation", fault.message)
    }
}

/// Handle used to raise faults on a sink from outside a write
#[derive(Debug, Clone)]
pub struct FaultReporter {
    tx: broadcast::Sender<SinkFault>,
}

impl FaultReporter {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FAULT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Raise a fault. Returns `false` when no write was waiting for it.
    pub fn report(&self, fault: impl Into<SinkFault>) -> bool {
        self.tx.send(fault.into()).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SinkFault> {
        self.tx.subscribe()
    }
}

impl Default for FaultReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Write all of `bytes`, resolving once they are flushed
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Fault notifications for the duration of one write
    fn subscribe_faults(&self) -> Option<broadcast::Receiver<SinkFault>> {
        None
    }
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes).await
    }

    fn subscribe_faults(&self) -> Option<broadcast::Receiver<SinkFault>> {
        (**self).subscribe_faults()
    }
}

/// Any tokio writer, serialized behind an async mutex
pub struct WriterSink<W> {
    writer: tokio::sync::Mutex<W>,
    faults: FaultReporter,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            faults: FaultReporter::new(),
        }
    }

    pub fn faults(&self) -> FaultReporter {
        self.faults.clone()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl WriterSink<tokio::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(tokio::io::stderr())
    }
}

#[async_trait]
impl<W> Sink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }

    fn subscribe_faults(&self) -> Option<broadcast::Receiver<SinkFault>> {
        Some(self.faults.subscribe())
    }
}

/// In-memory sink, optionally slow, for tests and embedding
#[derive(Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
    delay: Option<Duration>,
    faults: FaultReporter,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write waits `delay` before it is stored and confirmed
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    pub fn faults(&self) -> FaultReporter {
        self.faults.clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.buffer.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn subscribe_faults(&self) -> Option<broadcast::Receiver<SinkFault>> {
        Some(self.faults.subscribe())
    }
}

/// Write `bytes` to `sink`, failing early if the sink raises a fault first
pub(crate) async fn write_confirmed<S: Sink + ?Sized>(
    sink: &S,
    bytes: &[u8],
) -> crate::core::Result<()> {
    let mut faults = sink.subscribe_faults();
    tokio::select! {
        written = sink.write(bytes) => {
            written.map_err(|e| LoggerError::sink("writing record", e.to_string()))
        }
        fault = next_fault(&mut faults) => Err(fault.into()),
    }
}

async fn next_fault(faults: &mut Option<broadcast::Receiver<SinkFault>>) -> SinkFault {
    if let Some(rx) = faults {
        loop {
            match rx.recv().await {
                Ok(fault) => return fault,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    std::future::pending().await
}
