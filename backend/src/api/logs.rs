//! Activity log for conversion runs, with real-time streaming via
//! Server-Sent Events (SSE).
//!
//! Every run owns an [`ActivityLog`]; the entries it collects are returned to
//! the caller. When echo is enabled each entry is also mirrored to the global
//! [`LOG_BROADCASTER`], which prints it to stderr and forwards it to SSE
//! subscribers. The broadcaster never feeds anything back into a run.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn with_level(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), indent: 0, timestamp: Utc::now() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// One human-readable line, e.g. `warning: Row 4: ...`.
    pub fn to_line(&self) -> String {
        let level = match self.level {
            LogLevel::Info => "info",
            LogLevel::Success => "ok",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        format!("{}{}: {}", "  ".repeat(self.indent as usize), level, self.message)
    }
}

/// Entries of one conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
    #[serde(skip)]
    echo: bool,
}

impl ActivityLog {
    /// A log that only collects.
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that also mirrors every entry to [`LOG_BROADCASTER`].
    pub fn echoing() -> Self {
        Self { entries: Vec::new(), echo: true }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.echo {
            LOG_BROADCASTER.log(entry.clone());
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::info(msg));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::success(msg));
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::warning(msg));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.push(LogEntry::error(msg));
    }

    pub fn info_indent(&mut self, msg: impl Into<String>, indent: u8) {
        self.push(LogEntry::info(msg).with_indent(indent));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Entries at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// All entries as display lines.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::to_line).collect()
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a log entry to all subscribers
    pub fn log(&self, entry: LogEntry) {
        // stdout may carry converted data
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        eprintln!("{}{} {}", indent, prefix, entry.message);

        // Broadcast to SSE clients (ignore if no receivers)
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_collects_in_order() {
        let mut log = ActivityLog::new();
        log.info("reading");
        log.warning("Row 3: skipped");
        log.error("Row 5: bad level");

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.count(LogLevel::Warning), 1);
        assert_eq!(log.count(LogLevel::Error), 1);
        assert_eq!(log.lines()[1], "warning: Row 3: skipped");
    }

    #[test]
    fn test_indented_line() {
        let entry = LogEntry::info("[ 1] TNpe").with_indent(1);
        assert_eq!(entry.to_line(), "  info: [ 1] TNpe");
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::warning("careful")).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "careful");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_echoing_log_reaches_subscribers() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let mut log = ActivityLog::echoing();
        log.success("broadcast me");

        let mut seen = false;
        while let Ok(entry) = rx.try_recv() {
            if entry.message == "broadcast me" {
                seen = true;
            }
        }
        assert!(seen);
    }
}
