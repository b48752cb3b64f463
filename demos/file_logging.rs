//! File logging example
//!
//! Demonstrates logging to the console and a size-rotated file at once.
//!
//! Run with: cargo run --example file_logging

use rufus::handlers::backup_path;
use rufus::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== rufus - File Logging Example ===\n");

    let logger = Logger::new("app");
    logger.add_handler(Arc::new(ConsoleHandler::new(
        HandlerOptions::new().with_level(Level::INFO),
    )));

    let rotating = RotatingFileHandler::new(
        "logs/application.log",
        RotationPolicy::new().with_max_bytes(512).with_max_files(3),
        HandlerOptions::new().with_formatter(Arc::new(JsonFormatter::new())),
    );
    logger.add_handler(Arc::new(rotating.clone()));

    println!("1. Logging to both console and file:");
    logger.info("Application started").await;
    logger.debug("Loading configuration...").await;
    logger.info("Configuration loaded successfully").await;
    logger.warn("Using default settings for some options").await;
    logger.error("Failed to load optional plugin").await;

    println!("\n2. Performing some operations:");
    for i in 1..=10 {
        let record = Record::new(Level::INFO, format!("Processing item {}/10", i))
            .with_name("app.worker")
            .with_attribute("item", i);
        for result in logger.handle(record).await {
            result?;
        }
    }

    println!("\n=== Example completed successfully! ===");
    println!(
        "Current file '{}' holds {} bytes",
        rotating.path().display(),
        rotating.current_size().await
    );
    for i in 1..=2 {
        let backup = backup_path(rotating.path(), i);
        if backup.exists() {
            println!("Backup '{}' present", backup.display());
        }
    }

    Ok(())
}
