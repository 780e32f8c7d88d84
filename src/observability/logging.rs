//! Structured logging and retry-notice sinks.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries
//! - Provide injectable sinks for retry notices
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level from config, overridable with `RUST_LOG`
//! - Retry notices go to a `RetryLog` sink so callers can capture them;
//!   no sink means no notice lines

use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("nova_client={},tower_http={}", default_level, default_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Destination for formatted retry notices.
pub trait RetryLog: Send + Sync {
    fn retry_notice(&self, line: &str);
}

/// Forwards retry notices to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl RetryLog for TracingLog {
    fn retry_notice(&self, line: &str) {
        tracing::warn!(notice = %line, "Retrying request");
    }
}

/// Keeps retry notices in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("retry log mutex poisoned").clone()
    }

    /// Number of lines containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .expect("retry log mutex poisoned")
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl RetryLog for MemoryLog {
    fn retry_notice(&self, line: &str) {
        self.lines
            .lock()
            .expect("retry log mutex poisoned")
            .push(line.to_string());
    }
}
