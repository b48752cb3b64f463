//! Integration tests for the handler pipeline
//!
//! These tests verify:
//! - Level gating and filter chains across handler types
//! - Timeout isolation between handlers sharing a logger
//! - Rotation layout for size-bounded files
//! - Console routing and colorization
//! - Out-of-band sink faults

use async_trait::async_trait;
use rufus::core::{Emit, HandlerCore, JsonFormatter};
use rufus::handlers::{backup_path, ColorLayer, FaultReporter};
use rufus::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn message_options() -> HandlerOptions {
    HandlerOptions::new().with_formatter(Arc::new(MessageFormatter))
}

fn framed(n: usize) -> String {
    format!("<{}>", "a".repeat(n))
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).expect("file should exist").len()
}

struct NeverCompletes;

#[async_trait]
impl Emit for NeverCompletes {
    async fn emit(&self, _core: &HandlerCore, _record: &Record) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "never"
    }
}

#[tokio::test]
async fn test_rotation_keeps_records_whole_and_descending() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("rotating.log");
    let handler = RotatingFileHandler::new(
        &log_file,
        RotationPolicy::new().with_max_bytes(64),
        message_options(),
    );

    // 60, 50 and 45 byte payloads, framed
    for n in [58, 48, 43] {
        handler
            .handle(Record::new(Level::INFO, framed(n)))
            .await
            .expect("delivery should succeed");
    }

    assert_eq!(file_len(&log_file), 46);
    assert_eq!(file_len(&backup_path(&log_file, 1)), 51);
    assert_eq!(file_len(&backup_path(&log_file, 2)), 61);

    let newest_backup = fs::read_to_string(backup_path(&log_file, 1)).unwrap();
    assert_eq!(newest_backup, format!("{}\n", framed(48)));
}

#[tokio::test]
async fn test_rotation_evicts_beyond_max_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("bounded.log");
    let handler = RotatingFileHandler::new(
        &log_file,
        RotationPolicy::new().with_max_bytes(64).with_max_files(3),
        message_options(),
    );

    for n in [48, 53, 58, 43] {
        handler.handle(Record::new(Level::INFO, framed(n))).await.unwrap();
    }

    let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(files.len(), 3);
    assert!(log_file.exists());
    assert!(backup_path(&log_file, 1).exists());
    assert!(backup_path(&log_file, 2).exists());
    assert!(!backup_path(&log_file, 3).exists());
}

#[tokio::test]
async fn test_hung_handler_times_out_without_blocking_logger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("healthy.log");

    let logger = Logger::new("app");
    let hung = Handler::from_emitter(
        NeverCompletes,
        HandlerOptions::new().with_timeout(Duration::from_millis(25)),
    );
    let file = FileHandler::new(&log_file, message_options());
    logger.add_handler(Arc::new(hung.clone()));
    logger.add_handler(Arc::new(file));

    let started = Instant::now();
    let results = logger.info("first").await;
    assert!(started.elapsed() >= Duration::from_millis(25));
    assert!(results[0].as_ref().unwrap_err().is_timeout());
    assert!(results[1].is_ok());

    let results = logger.info("second").await;
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert_eq!(fs::read_to_string(&log_file).unwrap(), "first\nsecond\n");
    assert_eq!(hung.metrics().timed_out(), 2);
}

#[tokio::test]
async fn test_fire_and_forget_still_delivers() {
    let sink = Arc::new(MemorySink::with_delay(Duration::from_millis(5)));
    let handler = StreamHandler::new(Arc::clone(&sink), message_options());

    drop(handler.handle(Record::new(Level::INFO, "unobserved")));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(sink.contents(), "unobserved\n");
    assert_eq!(handler.metrics().delivered(), 1);
}

#[tokio::test]
async fn test_console_routes_and_colors() {
    let stdout = Arc::new(MemorySink::new());
    let stderr = Arc::new(MemorySink::new());
    let console = ConsoleHandler::with_sinks(stdout.clone(), stderr.clone(), message_options());

    console.handle(Record::new(Level::INFO, "up")).await.unwrap();
    console.handle(Record::new(Level::WARN, "hot")).await.unwrap();

    assert_eq!(stdout.contents(), "\x1b[32mup\x1b[0m\n");
    assert_eq!(stderr.contents(), "\x1b[33mhot\x1b[0m\n");
}

#[tokio::test]
async fn test_name_filter_on_logger_hierarchy() {
    let sink = Arc::new(MemorySink::new());
    let handler = StreamHandler::new(
        Arc::clone(&sink),
        message_options().with_filter(Arc::new(NameFilter::new("db"))),
    );

    for name in ["db", "db.pool", "dbx", "web"] {
        let logger = Logger::new(name);
        logger.add_handler(Arc::new(handler.clone()));
        logger.info(name).await;
    }

    assert_eq!(sink.contents(), "db\ndb.pool\n");
    assert_eq!(handler.metrics().filtered(), 2);
}

#[tokio::test]
async fn test_json_formatter_through_file_handler() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.json");
    let handler = FileHandler::new(
        &log_file,
        HandlerOptions::new().with_formatter(Arc::new(JsonFormatter::new())),
    );

    let record = Record::new(Level::ERROR, "payment failed")
        .with_name("billing")
        .with_attribute("order_id", 42);
    handler.handle(record).await.unwrap();

    let line = fs::read_to_string(&log_file).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(value["message"], "payment failed");
    assert_eq!(value["levelname"], "ERROR");
    assert_eq!(value["name"], "billing");
    assert_eq!(value["order_id"], 42);
}

#[tokio::test]
async fn test_sink_fault_fails_only_the_pending_write() {
    let sink = Arc::new(MemorySink::with_delay(Duration::from_millis(200)));
    let faults: FaultReporter = sink.faults();
    let handler = StreamHandler::new(Arc::clone(&sink), message_options());

    let pending = handler.handle(Record::new(Level::INFO, "doomed"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(faults.report(io::Error::new(io::ErrorKind::BrokenPipe, "EPIPE")));

    let err = pending.await.unwrap_err();
    assert!(err.is_sink_error());

    // No write in flight: the fault is dropped
    assert!(!faults.report(io::Error::new(io::ErrorKind::BrokenPipe, "EPIPE")));
    let fast = StreamHandler::new(MemorySink::new(), message_options());
    fast.handle(Record::new(Level::INFO, "fine")).await.unwrap();
    assert_eq!(fast.sink().contents(), "fine\n");
}

#[test]
fn test_color_layer_leaves_record_untouched() {
    let layer = ColorLayer::new(true);
    let record = Record::new(Level::DEBUG, "immutable");
    let wrapped = layer.wrap(&record, record.message.clone()).unwrap();

    assert_eq!(wrapped, "\x1b[34mimmutable\x1b[0m");
    assert_eq!(record.message, "immutable");
}
