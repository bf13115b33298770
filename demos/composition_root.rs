//! Composition root example
//!
//! Builds a registry holding one synchronous and one asynchronous logger
//! that share a console sink and a file sink, logs from several threads,
//! then shuts everything down.
//!
//! Run with: cargo run --example composition_root

use rust_async_logger::prelude::*;
use rust_async_logger::{error, info, warn};
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Rust Async Logger - Composition Root Example ===\n");

    let console: SharedSink = Arc::new(ConsoleSink::stdout().route_errors_to_stderr(true));
    let file: SharedSink = Arc::new(FileSink::truncate("composition_root.log")?);

    let registry = LoggerRegistry::new();

    let sync_logger = Logger::builder()
        .name("sync")
        .min_level(LogLevel::Debug)
        .timestamp_format(TimestampFormat::Ctime)
        .shared_sink(Arc::clone(&console))
        .shared_sink(Arc::clone(&file))
        .build()?;
    registry.register_logger(Arc::new(sync_logger));

    let async_logger = Logger::builder()
        .name("async")
        .async_mode(1000)
        .workers(4)
        .overflow_policy(OverflowPolicy::Block)
        .include_thread_name(true)
        .shared_sink(Arc::clone(&console))
        .shared_sink(Arc::clone(&file))
        .on_overflow(Arc::new(|lost| {
            eprintln!("ALERT: {} records lost", lost);
        }))
        .build()?;
    registry.register_logger(Arc::new(async_logger));

    println!("1. Logging through the registry:");
    let sync_logger = registry.lookup("sync")?;
    info!(sync_logger, "Service starting with {} loggers", registry.len());
    sync_logger.debug("Debug detail from the sync logger");

    println!("\n2. Multi-threaded async logging:");
    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let logger = registry.get("async");
            thread::Builder::new()
                .name(format!("producer-{}", thread_id))
                .spawn(move || {
                    if let Some(logger) = logger {
                        for i in 0..5 {
                            info!(logger, "Producer {} - message {}", thread_id, i);
                        }
                    }
                })
        })
        .collect::<std::io::Result<_>>()?;

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("a producer thread panicked");
        }
    }

    let async_logger = registry.lookup("async")?;
    warn!(async_logger, "Queue depth before shutdown: {}", async_logger.pending());
    error!(sync_logger, "Simulated failure in request {}", 42);

    println!("\n3. Shutting down:");
    registry.shutdown_all();

    let metrics = async_logger.metrics();
    println!(
        "   async logger: {} queued, {} delivered, {} lost",
        metrics.submitted_count(),
        metrics.delivered_count(),
        metrics.lost_count()
    );
    println!("   Log written to composition_root.log");

    Ok(())
}
