//! Size-based rotating file handler
//!
//! Rotation is checked before each write against the size the write would
//! produce. The current file therefore never grows past `max_bytes` unless a
//! single record is larger than the limit, in which case that record is
//! written whole into an otherwise empty file. Backups are named
//! `<base>.1`, `<base>.2`, ... with `.1` always the most recently rotated.

use super::file::open_append;
use crate::core::{Emit, Handler, HandlerCore, HandlerOptions, LoggerError, Record, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// When to rotate and how many backups to keep
///
/// # Examples
///
/// ```
/// use rufus::handlers::RotationPolicy;
///
/// // 1 MB files, current file plus at most four backups
/// let policy = RotationPolicy::new()
///     .with_max_bytes(1024 * 1024)
///     .with_max_files(5);
/// assert_eq!(policy.max_backups, Some(4));
///
/// // Never rotate
/// let policy = RotationPolicy::new().with_max_bytes(0);
/// assert!(!policy.should_rotate(10_000, 10_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Rotation threshold in bytes; 0 disables rotation
    pub max_bytes: u64,
    /// Numbered backups kept; `None` keeps all of them
    pub max_backups: Option<usize>,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024, // 10 MB
            max_backups: None,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Keep at most `count` numbered backups; 0 keeps all of them
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = (count > 0).then_some(count);
        self
    }

    /// Keep at most `count` files including the current one; 0 is unlimited.
    ///
    /// With `count == 1` no backups are kept: rotation discards the current
    /// file and starts a fresh one.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_backups = (count > 0).then(|| count - 1);
        self
    }

    /// Whether writing `incoming` bytes onto a file of `current` bytes must
    /// rotate first
    #[must_use]
    pub fn should_rotate(&self, current: u64, incoming: u64) -> bool {
        self.max_bytes > 0 && current > 0 && current.saturating_add(incoming) > self.max_bytes
    }
}

/// `<base>.<index>`
pub fn backup_path(base: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

#[derive(Default)]
struct RotationState {
    file: Option<File>,
    current_size: u64,
}

pub struct RotatingFileEmitter {
    base_path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<RotationState>,
}

impl RotatingFileEmitter {
    pub fn new(base_path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            base_path: base_path.into(),
            policy,
            state: Mutex::new(RotationState::default()),
        }
    }

    fn rotation_error(&self, action: &str, err: io::Error) -> LoggerError {
        LoggerError::file_rotation(
            self.base_path.display().to_string(),
            format!("{}: {}", action, err),
        )
    }

    async fn open(&self, state: &mut RotationState) -> Result<()> {
        let file = open_append(&self.base_path).await.map_err(|e| {
            LoggerError::io_operation(
                "open log file",
                format!("Failed to open '{}'", self.base_path.display()),
                e,
            )
        })?;
        let metadata = file.metadata().await.map_err(|e| {
            LoggerError::io_operation(
                "read log file metadata",
                format!("Cannot access '{}'", self.base_path.display()),
                e,
            )
        })?;
        state.current_size = metadata.len();
        state.file = Some(file);
        Ok(())
    }

    /// Shift the backup chain up by one and move the current file to `.1`.
    ///
    /// Renames run in descending index order so no backup is overwritten
    /// before it has moved. The first failure aborts the rotation.
    async fn rotate(&self, state: &mut RotationState) -> Result<()> {
        if let Some(mut file) = state.file.take() {
            file.flush()
                .await
                .map_err(|e| self.rotation_error("Failed to flush before rotation", e))?;
        }

        match self.policy.max_backups {
            Some(0) => {
                remove_if_exists(&self.base_path)
                    .await
                    .map_err(|e| self.rotation_error("Failed to discard current log file", e))?;
            }
            Some(max) => {
                remove_if_exists(&backup_path(&self.base_path, max))
                    .await
                    .map_err(|e| self.rotation_error("Failed to remove oldest backup", e))?;
                self.shift_backups(max - 1).await?;
            }
            None => {
                let mut top = 0;
                loop {
                    let next = backup_path(&self.base_path, top + 1);
                    if !exists(&next)
                        .await
                        .map_err(|e| self.rotation_error("Failed to inspect backup", e))?
                    {
                        break;
                    }
                    top += 1;
                }
                self.shift_backups(top).await?;
            }
        }

        if exists(&self.base_path)
            .await
            .map_err(|e| self.rotation_error("Failed to inspect current log file", e))?
        {
            tokio::fs::rename(&self.base_path, backup_path(&self.base_path, 1))
                .await
                .map_err(|e| self.rotation_error("Failed to rotate current log file", e))?;
        }

        self.open(state).await
    }

    /// Rename `.i` to `.(i+1)` for `i` from `top` down to 1
    async fn shift_backups(&self, top: usize) -> Result<()> {
        for i in (1..=top).rev() {
            let from = backup_path(&self.base_path, i);
            let backup_error = |action: &str, e: io::Error| {
                LoggerError::file_rotation(from.display().to_string(), format!("{}: {}", action, e))
            };
            if exists(&from)
                .await
                .map_err(|e| backup_error("Failed to inspect backup", e))?
            {
                tokio::fs::rename(&from, backup_path(&self.base_path, i + 1))
                    .await
                    .map_err(|e| backup_error("Failed to rotate backup files", e))?;
            }
        }
        Ok(())
    }

    async fn write(&self, payload: &[u8]) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.file.is_none() {
            self.open(&mut state).await?;
        }

        let incoming = payload.len() as u64;
        if self.policy.should_rotate(state.current_size, incoming) {
            self.rotate(&mut state).await?;
        }

        let file = state.file.as_mut().ok_or_else(|| {
            LoggerError::sink("writing record", "rotating log file is not open")
        })?;
        file.write_all(payload)
            .await
            .map_err(|e| LoggerError::sink("writing record", e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| LoggerError::sink("flushing record", e.to_string()))?;
        state.current_size += incoming;
        Ok(())
    }

    /// Bytes written to the current file, including what it held when opened
    pub async fn current_size(&self) -> u64 {
        self.state.lock().await.current_size
    }
}

/// Whether a directory entry sits at `path`; dangling symlinks count
async fn exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[async_trait]
impl Emit for RotatingFileEmitter {
    async fn emit(&self, core: &HandlerCore, record: &Record) -> Result<()> {
        let payload = core.format_line(record)?;
        self.write(&payload).await
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

/// File handler that rotates into numbered backups once a size limit is hit.
///
/// Emits on one handler are serialized: rotation and the write that
/// triggered it happen as one step, so `current_size` always equals the
/// bytes in the current file.
///
/// # Example
///
/// ```no_run
/// use rufus::core::HandlerOptions;
/// use rufus::handlers::{RotatingFileHandler, RotationPolicy};
///
/// let handler = RotatingFileHandler::new(
///     "/var/log/app.log",
///     RotationPolicy::new().with_max_bytes(50 * 1024 * 1024).with_max_backups(7),
///     HandlerOptions::new(),
/// );
/// ```
pub type RotatingFileHandler = Handler<RotatingFileEmitter>;

impl Handler<RotatingFileEmitter> {
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy, options: HandlerOptions) -> Self {
        Handler::from_emitter(RotatingFileEmitter::new(path, policy), options)
    }

    pub fn path(&self) -> &Path {
        &self.emitter().base_path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.emitter().policy
    }

    pub async fn current_size(&self) -> u64 {
        self.emitter().current_size().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Level, MessageFormatter};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn handler(path: &Path, policy: RotationPolicy) -> RotatingFileHandler {
        RotatingFileHandler::new(
            path,
            policy,
            HandlerOptions::new().with_formatter(Arc::new(MessageFormatter)),
        )
    }

    /// `<aaa...a>` with `n` a's; the line is `n + 3` bytes with its newline
    fn framed(n: usize) -> String {
        format!("<{}>", "a".repeat(n))
    }

    fn len(path: &Path) -> u64 {
        std::fs::metadata(path).unwrap().len()
    }

    #[test]
    fn test_should_rotate() {
        let policy = RotationPolicy::new().with_max_bytes(64);
        assert!(!policy.should_rotate(0, 100));
        assert!(!policy.should_rotate(10, 54));
        assert!(policy.should_rotate(10, 55));
    }

    #[test]
    fn test_max_files_counts_current_file() {
        assert_eq!(RotationPolicy::new().with_max_files(3).max_backups, Some(2));
        assert_eq!(RotationPolicy::new().with_max_files(1).max_backups, Some(0));
        assert_eq!(RotationPolicy::new().with_max_files(0).max_backups, None);
        assert_eq!(RotationPolicy::new().with_max_backups(0).max_backups, None);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: RotationPolicy = serde_json::from_str(r#"{"max_bytes": 64}"#).unwrap();
        assert_eq!(policy.max_bytes, 64);
        assert_eq!(policy.max_backups, None);
    }

    #[test]
    fn test_backup_path_appends_index() {
        let path = backup_path(Path::new("/tmp/app.log"), 3);
        assert_eq!(path, PathBuf::from("/tmp/app.log.3"));
    }

    #[tokio::test]
    async fn test_rotates_in_descending_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(64));

        for n in [58, 48, 43] {
            handler.handle(Record::new(Level::INFO, framed(n))).await.unwrap();
        }

        assert_eq!(len(&path), 46);
        assert_eq!(len(&backup_path(&path, 1)), 51);
        assert_eq!(len(&backup_path(&path, 2)), 61);
        assert!(!backup_path(&path, 3).exists());
        assert_eq!(handler.current_size().await, 46);
    }

    #[tokio::test]
    async fn test_oldest_backup_is_evicted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(
            &path,
            RotationPolicy::new().with_max_bytes(64).with_max_files(3),
        );

        for n in [48, 53, 58, 43] {
            handler.handle(Record::new(Level::INFO, framed(n))).await.unwrap();
        }

        assert_eq!(len(&path), 46);
        assert_eq!(len(&backup_path(&path, 1)), 61);
        assert_eq!(len(&backup_path(&path, 2)), 56);
        assert!(!backup_path(&path, 3).exists());
    }

    #[tokio::test]
    async fn test_oversized_record_is_written_whole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(16));

        handler.handle(Record::new(Level::INFO, framed(40))).await.unwrap();
        assert_eq!(len(&path), 43);
        assert!(!backup_path(&path, 1).exists());

        handler.handle(Record::new(Level::INFO, "x")).await.unwrap();
        assert_eq!(len(&path), 2);
        assert_eq!(len(&backup_path(&path, 1)), 43);
    }

    #[tokio::test]
    async fn test_zero_max_bytes_never_rotates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(0));

        for _ in 0..10 {
            handler.handle(Record::new(Level::INFO, framed(97))).await.unwrap();
        }

        assert_eq!(len(&path), 1000);
        assert!(!backup_path(&path, 1).exists());
    }

    #[tokio::test]
    async fn test_single_file_policy_discards_on_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(
            &path,
            RotationPolicy::new().with_max_bytes(8).with_max_files(1),
        );

        handler.handle(Record::new(Level::INFO, "first")).await.unwrap();
        handler.handle(Record::new(Level::INFO, "second")).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[tokio::test]
    async fn test_unlimited_backups_keep_growing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(4));

        for i in 0..5 {
            handler.handle(Record::new(Level::INFO, format!("r{}", i))).await.unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "r4\n");
        assert_eq!(std::fs::read_to_string(backup_path(&path, 1)).unwrap(), "r3\n");
        assert_eq!(std::fs::read_to_string(backup_path(&path, 4)).unwrap(), "r0\n");
    }

    #[tokio::test]
    async fn test_existing_file_size_counts_toward_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "0123456789").unwrap();
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(12));

        handler.handle(Record::new(Level::INFO, "abc")).await.unwrap();

        assert_eq!(std::fs::read_to_string(backup_path(&path, 1)).unwrap(), "0123456789");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc\n");
        assert_eq!(handler.current_size().await, 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_rotation_drops_record_and_keeps_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(
            &path,
            RotationPolicy::new().with_max_bytes(8).with_max_backups(1),
        );

        handler.handle(Record::new(Level::INFO, "abcdef")).await.unwrap();
        assert_eq!(handler.current_size().await, 7);

        // A directory squatting on the oldest backup cannot be removed as a file
        std::fs::create_dir(backup_path(&path, 1)).unwrap();
        std::fs::write(backup_path(&path, 1).join("keep"), "").unwrap();

        let err = handler.handle(Record::new(Level::INFO, "ghijkl")).await.unwrap_err();
        assert!(matches!(err, LoggerError::FileRotationError { .. }));
        assert_eq!(handler.current_size().await, 7);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abcdef\n");
        assert_eq!(handler.metrics().failed(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_backup_is_shifted_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let looped = backup_path(&path, 2);
        std::fs::write(backup_path(&path, 1), "backup-one").unwrap();
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let handler = handler(
            &path,
            RotationPolicy::new().with_max_bytes(16).with_max_backups(3),
        );

        handler.handle(Record::new(Level::INFO, framed(10))).await.unwrap();
        handler.handle(Record::new(Level::INFO, framed(10))).await.unwrap();

        let moved = std::fs::symlink_metadata(backup_path(&path, 3)).unwrap();
        assert!(moved.file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(backup_path(&path, 2)).unwrap(), "backup-one");
        assert_eq!(len(&backup_path(&path, 1)), 13);
        assert_eq!(handler.current_size().await, 13);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_backup_slot_aborts_rotation() {
        let dir = TempDir::new().unwrap();
        // Fits NAME_MAX, but "<base>.1" does not
        let path = dir.path().join(format!("{}.log", "a".repeat(251)));
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(8));

        handler.handle(Record::new(Level::INFO, "abcdef")).await.unwrap();
        let err = handler.handle(Record::new(Level::INFO, "ghijkl")).await.unwrap_err();

        assert!(matches!(err, LoggerError::FileRotationError { .. }));
        assert_eq!(handler.current_size().await, 7);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abcdef\n");
    }

    /// Makes `dir` read-only; false when permissions are not enforced (root)
    #[cfg(unix)]
    fn lock_dir(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        let canary = dir.join("canary");
        if std::fs::write(&canary, "").is_ok() {
            std::fs::remove_file(&canary).unwrap();
            unlock_dir(dir);
            return false;
        }
        true
    }

    #[cfg(unix)]
    fn unlock_dir(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_current_file_rename_keeps_record_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(8));
        handler.handle(Record::new(Level::INFO, "abcdef")).await.unwrap();

        if !lock_dir(dir.path()) {
            return;
        }
        let result = handler.handle(Record::new(Level::INFO, "ghijkl")).await;
        unlock_dir(dir.path());

        assert!(matches!(result, Err(LoggerError::FileRotationError { .. })));
        assert_eq!(handler.current_size().await, 7);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abcdef\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_backup_shift_keeps_chain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = handler(&path, RotationPolicy::new().with_max_bytes(8));
        handler.handle(Record::new(Level::INFO, "abcdef")).await.unwrap();
        handler.handle(Record::new(Level::INFO, "ghijkl")).await.unwrap();
        assert_eq!(std::fs::read_to_string(backup_path(&path, 1)).unwrap(), "abcdef\n");

        if !lock_dir(dir.path()) {
            return;
        }
        let result = handler.handle(Record::new(Level::INFO, "mnopqr")).await;
        unlock_dir(dir.path());

        assert!(matches!(result, Err(LoggerError::FileRotationError { .. })));
        assert_eq!(handler.current_size().await, 7);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ghijkl\n");
        assert_eq!(std::fs::read_to_string(backup_path(&path, 1)).unwrap(), "abcdef\n");
        assert!(!backup_path(&path, 2).exists());
    }
}
