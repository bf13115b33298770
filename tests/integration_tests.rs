//! Integration tests for the dispatch engine
//!
//! These tests verify:
//! - Overflow policies end to end through a logger
//! - Deferred level filtering for async delivery
//! - Lossless shutdown and post-shutdown rejection
//! - Shared sinks under concurrent writers
//! - Configuration and registry wiring

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use rust_async_logger::prelude::*;
use rust_async_logger::{info, LineFormatter};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Collects every message it receives, in delivery order
#[derive(Default)]
struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.messages.lock().push(record.message().to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Announces each record as it arrives, then waits for a release token.
/// Lets a test hold the single worker inside a write at a known point.
struct GateSink {
    entered: Sender<(String, chrono::DateTime<chrono::Utc>)>,
    release: Receiver<()>,
}

fn gate() -> (
    Arc<GateSink>,
    Receiver<(String, chrono::DateTime<chrono::Utc>)>,
    Sender<()>,
) {
    let (entered_tx, entered_rx) = unbounded();
    let (release_tx, release_rx) = unbounded();
    let sink = Arc::new(GateSink {
        entered: entered_tx,
        release: release_rx,
    });
    (sink, entered_rx, release_tx)
}

impl Sink for GateSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let _ = self
            .entered
            .send((record.message().to_string(), record.timestamp()));
        self.release
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| LoggerError::other("gate never released"))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "gate"
    }
}

fn recv_message(entered: &Receiver<(String, chrono::DateTime<chrono::Utc>)>) -> String {
    entered
        .recv_timeout(Duration::from_secs(5))
        .expect("worker never reached the sink")
        .0
}

fn release_all(release: &Sender<()>, count: usize) {
    for _ in 0..count {
        release.send(()).expect("gate dropped");
    }
}

fn gated_logger(
    capacity: usize,
    policy: OverflowPolicy,
) -> (
    Logger,
    Arc<MemorySink>,
    Receiver<(String, chrono::DateTime<chrono::Utc>)>,
    Sender<()>,
) {
    let (gate, entered, release) = gate();
    let memory = Arc::new(MemorySink::default());
    let logger = Logger::builder()
        .name("gated")
        .async_mode(capacity)
        .workers(1)
        .overflow_policy(policy)
        .shared_sink(gate)
        .shared_sink(memory.clone())
        .build()
        .expect("Failed to build logger");
    (logger, memory, entered, release)
}

#[test]
fn test_log_injection_prevention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.log");

    let logger = Logger::builder()
        .sink(FileSink::new(&log_file).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    let malicious_message = "User login\nERROR [2024-10-17] Fake error injected\nINFO Continuation";
    logger.info(malicious_message);
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("\\n"));
    assert_eq!(content.lines().count(), 1, "Log should be a single line");
}

#[test]
fn test_async_logging_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("async_test.log");

    let logger = Logger::with_async("async", 100).expect("Failed to build logger");
    logger.add_sink(Arc::new(FileSink::new(&log_file).expect("Failed to create sink")));

    for i in 0..50 {
        assert_eq!(logger.info(format!("Message {}", i)), LogOutcome::Queued);
    }
    logger.shutdown();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 50, "Should have 50 log entries");
    // One worker keeps FIFO order
    for (i, line) in lines.iter().enumerate() {
        assert!(line.ends_with(&format!("[INFO] Message {}", i)));
    }
}

#[test]
fn test_block_policy_backpressure_loses_nothing() {
    struct SlowSink(MemorySink);

    impl Sink for SlowSink {
        fn write(&self, record: &LogRecord) -> Result<()> {
            thread::sleep(Duration::from_millis(2));
            self.0.write(record)
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "slow"
        }
    }

    let sink = Arc::new(SlowSink(MemorySink::default()));
    let logger = Logger::builder()
        .async_mode(5)
        .overflow_policy(OverflowPolicy::Block)
        .shared_sink(sink.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..40 {
        assert_eq!(logger.info(format!("Message {}", i)), LogOutcome::Queued);
        assert!(logger.pending() <= 5);
    }
    logger.shutdown();

    let expected: Vec<String> = (0..40).map(|i| format!("Message {}", i)).collect();
    assert_eq!(sink.0.messages(), expected);
    assert_eq!(logger.metrics().lost_count(), 0);
    assert!(logger.metrics().block_events() > 0);
}

#[test]
fn test_discard_new_scenario() {
    let (logger, memory, entered, release) = gated_logger(2, OverflowPolicy::DiscardNew);

    // Park the only worker inside the sink
    assert_eq!(logger.info("X"), LogOutcome::Queued);
    assert_eq!(recv_message(&entered), "X");

    assert_eq!(logger.info("A"), LogOutcome::Queued);
    assert_eq!(logger.info("B"), LogOutcome::Queued);
    assert_eq!(logger.info("C"), LogOutcome::Dropped);
    assert_eq!(logger.pending(), 2);

    // Let the worker finish X and pick up A
    release_all(&release, 1);
    assert_eq!(recv_message(&entered), "A");

    assert_eq!(logger.info("D"), LogOutcome::Queued);
    assert_eq!(logger.pending(), 2);

    release_all(&release, 3);
    logger.shutdown();

    assert_eq!(memory.messages(), vec!["X", "A", "B", "D"]);
    assert_eq!(logger.metrics().dropped_count(), 1);
}

#[test]
fn test_overrun_oldest_keeps_most_recent() {
    let (logger, memory, entered, release) = gated_logger(3, OverflowPolicy::OverrunOldest);

    assert_eq!(logger.info("X"), LogOutcome::Queued);
    assert_eq!(recv_message(&entered), "X");

    for i in 0..10 {
        assert_eq!(logger.info(format!("{}", i)), LogOutcome::Queued);
        assert!(logger.pending() <= 3);
    }

    release_all(&release, 4);
    logger.shutdown();

    assert_eq!(memory.messages(), vec!["X", "7", "8", "9"]);
    assert_eq!(logger.metrics().evicted_count(), 7);
}

#[test]
fn test_async_filter_uses_threshold_at_execution() {
    let (logger, memory, entered, release) = gated_logger(8, OverflowPolicy::Block);

    assert_eq!(logger.error("X"), LogOutcome::Queued);
    assert_eq!(recv_message(&entered), "X");

    // Accepted at Info, but the threshold is raised before it executes
    assert_eq!(logger.info("raised before delivery"), LogOutcome::Queued);
    logger.set_level(LogLevel::Warning);

    // Submitted under a stricter threshold, relaxed again before it runs
    logger.set_level(LogLevel::Error);
    assert_eq!(logger.warn("lowered before delivery"), LogOutcome::Queued);
    logger.set_level(LogLevel::Warning);

    release_all(&release, 2);
    logger.shutdown();

    assert_eq!(memory.messages(), vec!["X", "lowered before delivery"]);
    assert_eq!(logger.metrics().filtered_count(), 1);
}

#[test]
fn test_level_filtering_warning_threshold() {
    let memory = Arc::new(MemorySink::default());
    let logger = Logger::builder()
        .min_level(LogLevel::Warning)
        .async_mode(32)
        .workers(2)
        .shared_sink(memory.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..10 {
        logger.info(format!("info {}", i));
        logger.error(format!("error {}", i));
    }
    logger.shutdown();

    let messages = memory.messages();
    assert_eq!(messages.len(), 10);
    assert!(messages.iter().all(|m| m.starts_with("error")));
}

#[test]
fn test_timestamp_reflects_call_time() {
    let (logger, _memory, entered, release) = gated_logger(4, OverflowPolicy::Block);

    logger.info("X");
    recv_message(&entered);

    let before_call = chrono::Utc::now();
    logger.info("stamped");
    let after_call = chrono::Utc::now();

    thread::sleep(Duration::from_millis(50));
    release_all(&release, 1);

    let (message, stamp) = entered
        .recv_timeout(Duration::from_secs(5))
        .expect("record never delivered");
    assert_eq!(message, "stamped");
    assert!(stamp >= before_call && stamp <= after_call);

    release_all(&release, 1);
    logger.shutdown();
}

#[test]
fn test_shutdown_drains_then_rejects() {
    let memory = Arc::new(MemorySink::default());
    let logger = Logger::builder()
        .async_mode(1000)
        .workers(4)
        .shared_sink(memory.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..500 {
        logger.info(format!("Message {}", i));
    }
    logger.shutdown();

    assert_eq!(memory.messages().len(), 500);
    assert_eq!(logger.info("too late"), LogOutcome::Rejected);
    assert_eq!(logger.pending(), 0);

    // Idempotent
    logger.shutdown();
    assert!(logger.shutdown_timeout(Duration::from_millis(10)));
}

#[test]
fn test_shared_file_sink_lines_never_interleave() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("shared.log");
    let file_sink: SharedSink = Arc::new(FileSink::new(&log_file).expect("Failed to create sink"));

    let sync_logger = Arc::new(
        Logger::builder()
            .name("sync")
            .shared_sink(Arc::clone(&file_sink))
            .build()
            .expect("Failed to build logger"),
    );
    let async_logger = Arc::new(
        Logger::builder()
            .name("async")
            .async_mode(64)
            .workers(3)
            .shared_sink(Arc::clone(&file_sink))
            .build()
            .expect("Failed to build logger"),
    );

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let logger = if t % 2 == 0 {
                Arc::clone(&sync_logger)
            } else {
                Arc::clone(&async_logger)
            };
            thread::spawn(move || {
                for i in 0..20 {
                    info!(logger, "thread {:02} line {:02} {}", t, i, "x".repeat(200));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }

    async_logger.shutdown();
    sync_logger.shutdown();
    drop(file_sink);

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 200);
    for line in lines {
        assert!(line.starts_with('['), "garbled line: {}", line);
        assert!(line.contains("] [INFO] thread "), "garbled line: {}", line);
        assert!(line.ends_with(&"x".repeat(200)), "garbled line: {}", line);
    }
}

#[test]
fn test_sink_added_mid_flight() {
    let logger = Arc::new(
        Logger::builder()
            .async_mode(128)
            .workers(2)
            .build()
            .expect("Failed to build logger"),
    );
    let late = Arc::new(MemorySink::default());

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..500 {
                logger.info(format!("{}", i));
            }
        })
    };

    thread::sleep(Duration::from_millis(1));
    logger.add_sink(late.clone());
    producer.join().expect("producer panicked");
    logger.shutdown();

    // Whatever the late sink saw is whole, in range and never duplicated
    let messages = late.messages();
    let mut seen = std::collections::HashSet::new();
    for message in &messages {
        let n: usize = message.parse().expect("partial record");
        assert!(n < 500);
        assert!(seen.insert(n), "duplicate delivery of {}", n);
    }
}

#[test]
fn test_async_sink_failure_is_isolated() {
    struct FailingSink;

    impl Sink for FailingSink {
        fn write(&self, _record: &LogRecord) -> Result<()> {
            Err(LoggerError::other("Simulated failure"))
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    let errors = Arc::new(AtomicUsize::new(0));
    let errors_clone = Arc::clone(&errors);
    let memory = Arc::new(MemorySink::default());

    let logger = Logger::builder()
        .async_mode(16)
        .sink(FailingSink)
        .shared_sink(memory.clone())
        .on_error(Arc::new(move |err: &LoggerError| {
            assert!(matches!(err, LoggerError::SinkWrite { .. }));
            errors_clone.fetch_add(1, Ordering::SeqCst);
        }))
        .build()
        .expect("Failed to build logger");

    for i in 0..5 {
        logger.info(format!("{}", i));
    }
    logger.shutdown();

    assert_eq!(memory.messages().len(), 5);
    assert_eq!(errors.load(Ordering::SeqCst), 5);
    assert_eq!(logger.metrics().sink_failures(), 5);
}

#[test]
fn test_overflow_callback_invoked() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let (gate, entered, release) = gate();

    let logger = Logger::builder()
        .async_mode(1)
        .overflow_policy(OverflowPolicy::DiscardNew)
        .shared_sink(gate)
        .on_overflow(Arc::new(move |_count| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }))
        .build()
        .expect("Failed to build logger");

    logger.info("X");
    recv_message(&entered);
    logger.info("queued");
    for _ in 0..10 {
        assert_eq!(logger.info("dropped"), LogOutcome::Dropped);
    }

    // First drop alerts; the next alert is at 1000
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    release_all(&release, 2);
    logger.shutdown();
}

#[test]
fn test_file_sink_open_failure() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let bad_path = temp_dir.path().join("no_such_dir").join("app.log");

    match FileSink::new(&bad_path) {
        Err(LoggerError::SinkOpen { path, .. }) => assert!(path.contains("no_such_dir")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("opening a file in a missing directory must fail"),
    }
}

#[test]
fn test_config_driven_logger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("configured.log");

    let config = LoggerConfig::from_json_str(
        r#"{
            "name": "configured",
            "level": "warn",
            "timestamp_format": "unix_millis",
            "include_thread_name": true,
            "async": { "capacity": 16, "workers": 2, "overflow_policy": "block" }
        }"#,
    )
    .expect("Failed to parse config");

    let logger = config
        .builder()
        .sink(FileSink::truncate(&log_file).expect("Failed to create sink"))
        .build()
        .expect("Failed to build logger");

    logger.info("filtered out");
    logger.warn("kept");
    logger.shutdown();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[WARNING]"));
    assert!(lines[0].ends_with("kept"));
    // Unix millis timestamp column
    let stamp = lines[0].trim_start_matches('[').split(']').next().unwrap();
    assert!(stamp.parse::<i64>().is_ok());
}

#[test]
fn test_registry_composition_root() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("registry.log");
    let file_sink: SharedSink = Arc::new(FileSink::new(&log_file).expect("Failed to create sink"));

    let registry = LoggerRegistry::new();
    registry.register(
        "sync",
        Arc::new(Logger::builder().name("sync").build().expect("build")),
    );
    registry.register(
        "async",
        Arc::new(Logger::with_async("async", 16).expect("build")),
    );

    for name in ["sync", "async"] {
        registry
            .lookup(name)
            .expect("registered")
            .add_sink(Arc::clone(&file_sink));
    }

    registry.lookup("sync").unwrap().warn("from sync");
    registry.lookup("async").unwrap().error("from async");
    assert!(registry.lookup("missing").is_err());

    registry.shutdown_all();
    drop(file_sink);

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("[WARNING] from sync"));
    assert!(content.contains("[ERROR] from async"));
}

#[test]
fn test_record_line_uses_formatter() {
    let formatter = LineFormatter::new(TimestampFormat::Custom("%Y".to_string()));
    let record = LogRecord::new(LogLevel::Info, "formatted", &formatter);
    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(record.line(), format!("[{}] [INFO] formatted", year));
}
