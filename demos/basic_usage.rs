//! Basic handler usage example
//!
//! Demonstrates console logging with level gating, colors and a name filter.
//!
//! Run with: cargo run --example basic_usage

use rufus::prelude::*;
use rufus::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== rufus - Basic Usage Example ===\n");

    let console = Arc::new(ConsoleHandler::new(HandlerOptions::new()));
    let logger = Logger::new("demo");
    logger.add_handler(console.clone());

    println!("1. Logging at every level (WARN and up go to stderr):");
    logger.verbose("This is a verbose message").await;
    logger.debug("This is a debug message").await;
    logger.info("This is an info message").await;
    logger.warn("This is a warning message").await;
    logger.error("This is an error message").await;
    logger.critical("This is a critical message").await;

    println!("\n2. Raising the handler level to INFO:");
    console.set_level(Level::INFO);
    logger.debug("Debug message (hidden)").await;
    info!(logger, "Info message (visible), {} handler attached", logger.handler_count()).await;

    println!("\n3. Plain output with a message-only formatter:");
    console.set_colorize(false);
    console.set_formatter(Arc::new(MessageFormatter));
    warn!(logger, "Uncolored warning").await;

    println!("\n4. Filtering by logger name:");
    console.add_filter(Arc::new(NameFilter::new("demo.db")));
    let http = Logger::new("demo.http");
    http.add_handler(console.clone());
    http.info("filtered out: demo.http is not under demo.db").await;
    let db = Logger::new("demo.db.pool");
    db.add_handler(console.clone());
    for result in db.info("accepted: demo.db.pool descends from demo.db").await {
        result?;
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
