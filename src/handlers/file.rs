//! File handler: a stream handler over a lazily opened append-mode file

use super::sink::{FaultReporter, Sink, SinkFault};
use super::stream::StreamEmitter;
use crate::core::{Emit, Handler, HandlerCore, HandlerOptions, Record, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, Mutex};

/// Open `path` for appending, creating it and its parent directories
pub(crate) async fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

/// Append-mode file, opened on the first write
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
    faults: FaultReporter,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
            faults: FaultReporter::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn faults(&self) -> FaultReporter {
        self.faults.clone()
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.file.lock().await;
        if guard.is_none() {
            let file = open_append(&self.path).await.map_err(|e| {
                io::Error::new(e.kind(), format!("cannot open '{}': {}", self.path.display(), e))
            })?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(bytes).await?;
            file.flush().await?;
        }
        Ok(())
    }

    fn subscribe_faults(&self) -> Option<broadcast::Receiver<SinkFault>> {
        Some(self.faults.subscribe())
    }
}

pub struct FileEmitter {
    stream: StreamEmitter<FileSink>,
}

#[async_trait]
impl Emit for FileEmitter {
    async fn emit(&self, core: &HandlerCore, record: &Record) -> Result<()> {
        self.stream.emit(core, record).await
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Handler appending formatted records to a file.
///
/// The file is created (with any missing parent directories) on the first
/// delivered record, so constructing a handler never touches the disk.
///
/// # Example
///
/// ```no_run
/// use rufus::core::{HandlerOptions, Level};
/// use rufus::handlers::FileHandler;
///
/// let options = HandlerOptions::new().with_level(Level::INFO);
/// let handler = FileHandler::new("/var/log/app.log", options);
/// assert_eq!(handler.path().to_str(), Some("/var/log/app.log"));
/// ```
pub type FileHandler = Handler<FileEmitter>;

impl Handler<FileEmitter> {
    pub fn new(path: impl Into<PathBuf>, options: HandlerOptions) -> Self {
        let emitter = FileEmitter {
            stream: StreamEmitter::new(FileSink::new(path)),
        };
        Handler::from_emitter(emitter, options)
    }

    pub fn path(&self) -> &Path {
        self.emitter().stream.sink().path()
    }

    /// Reporter for out-of-band faults on the underlying file
    pub fn faults(&self) -> FaultReporter {
        self.emitter().stream.sink().faults()
    }
}
