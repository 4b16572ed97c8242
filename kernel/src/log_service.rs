//! Structured kernel log service
//!
//! Provides a fixed-size, heap-free circular buffer of structured log
//! entries. Each entry carries a timestamp, severity level, subsystem tag,
//! and a fixed-length message. The service is stored as global state behind
//! a [`spin::Mutex`] and accessed through a small public API.
//!
//! # Usage
//!
//! ```ignore
//! log_service::log_init();
//! log_service::klog(LogLevel::Info, "term", "terminal engine initialized");
//! let n = log_service::log_count();
//! ```
//!
//! The buffer holds up to [`LOG_BUFFER_CAPACITY`] entries. Once full it wraps
//! around and silently overwrites the oldest entries.

use spin::Mutex;

use crate::sync::once_lock::GlobalState;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Maximum number of log entries the circular buffer can hold.
const LOG_BUFFER_CAPACITY: usize = 256;

/// Maximum length (in bytes) of a log message stored in a [`LogEntry`].
const LOG_MESSAGE_MAX_LEN: usize = 128;

/// Maximum length (in bytes) of the subsystem tag in a [`LogEntry`].
const LOG_SUBSYSTEM_MAX_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Severity levels for kernel log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Unrecoverable or critical errors.
    Error = 0,
    /// Conditions that may indicate a problem.
    Warn = 1,
    /// Normal operational messages.
    Info = 2,
    /// Verbose diagnostic output.
    Debug = 3,
    /// Very detailed tracing information.
    Trace = 4,
}

/// A single structured log entry.
///
/// All fields are stored inline with fixed-size arrays so that the entry
/// can live in a static circular buffer without heap allocation.
#[derive(Clone)]
pub struct LogEntry {
    /// Milliseconds since boot (via `arch::timer::get_timestamp_ms`).
    pub timestamp_ms: u64,
    /// Severity of the message.
    pub level: LogLevel,
    subsystem_buf: [u8; LOG_SUBSYSTEM_MAX_LEN],
    subsystem_len: u8,
    message_buf: [u8; LOG_MESSAGE_MAX_LEN],
    message_len: u8,
}

impl LogEntry {
    const fn empty() -> Self {
        Self {
            timestamp_ms: 0,
            level: LogLevel::Trace,
            subsystem_buf: [0u8; LOG_SUBSYSTEM_MAX_LEN],
            subsystem_len: 0,
            message_buf: [0u8; LOG_MESSAGE_MAX_LEN],
            message_len: 0,
        }
    }

    /// Return the subsystem tag as a `&str`.
    pub fn subsystem(&self) -> &str {
        let len = self.subsystem_len as usize;
        core::str::from_utf8(&self.subsystem_buf[..len]).unwrap_or("")
    }

    /// Return the message text as a `&str`.
    pub fn message(&self) -> &str {
        let len = self.message_len as usize;
        core::str::from_utf8(&self.message_buf[..len]).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Circular buffer
// ---------------------------------------------------------------------------

/// Fixed-size circular buffer of [`LogEntry`] items.
///
/// Uses a head index with a count to distinguish empty from full.
struct LogBuffer {
    entries: [LogEntry; LOG_BUFFER_CAPACITY],
    head: usize,
    count: usize,
}

impl LogBuffer {
    fn new() -> Self {
        const EMPTY: LogEntry = LogEntry::empty();
        Self {
            entries: [EMPTY; LOG_BUFFER_CAPACITY],
            head: 0,
            count: 0,
        }
    }

    fn push(&mut self, entry: LogEntry) {
        self.entries[self.head] = entry;
        self.head = (self.head + 1) % LOG_BUFFER_CAPACITY;
        if self.count < LOG_BUFFER_CAPACITY {
            self.count += 1;
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    fn tail(&self) -> usize {
        if self.count < LOG_BUFFER_CAPACITY {
            0
        } else {
            self.head
        }
    }

    /// Get the entry at logical index `i` (0 = oldest).
    fn get(&self, i: usize) -> Option<&LogEntry> {
        if i >= self.count {
            return None;
        }
        let physical = (self.tail() + i) % LOG_BUFFER_CAPACITY;
        Some(&self.entries[physical])
    }
}

// ---------------------------------------------------------------------------
// LogService
// ---------------------------------------------------------------------------

struct LogService {
    buffer: LogBuffer,
}

impl LogService {
    fn new() -> Self {
        Self {
            buffer: LogBuffer::new(),
        }
    }

    fn log(&mut self, level: LogLevel, subsystem: &str, message: &str) {
        let timestamp_ms = crate::arch::timer::get_timestamp_ms();

        let mut subsystem_buf = [0u8; LOG_SUBSYSTEM_MAX_LEN];
        let sub_len = subsystem.len().min(LOG_SUBSYSTEM_MAX_LEN);
        subsystem_buf[..sub_len].copy_from_slice(&subsystem.as_bytes()[..sub_len]);

        let mut message_buf = [0u8; LOG_MESSAGE_MAX_LEN];
        let msg_len = message.len().min(LOG_MESSAGE_MAX_LEN);
        message_buf[..msg_len].copy_from_slice(&message.as_bytes()[..msg_len]);

        self.buffer.push(LogEntry {
            timestamp_ms,
            level,
            subsystem_buf,
            subsystem_len: sub_len as u8,
            message_buf,
            message_len: msg_len as u8,
        });
    }

    fn count(&self) -> usize {
        self.buffer.len()
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}

// ---------------------------------------------------------------------------
// Global state
// ---------------------------------------------------------------------------

static LOG_SERVICE: GlobalState<Mutex<LogService>> = GlobalState::new();

// ---------------------------------------------------------------------------
// `log` facade adapter
// ---------------------------------------------------------------------------

/// Formats a `log::Record`'s arguments into a fixed buffer, so the `log`
/// crate's facade can feed [`klog`] without a heap.
struct MessageBuf {
    buf: [u8; LOG_MESSAGE_MAX_LEN],
    len: usize,
}

impl MessageBuf {
    fn new() -> Self {
        Self {
            buf: [0u8; LOG_MESSAGE_MAX_LEN],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl core::fmt::Write for MessageBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let remaining = LOG_MESSAGE_MAX_LEN - self.len;
        let take = s.len().min(remaining);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Adapts the `log` crate's facade onto [`klog`], so ordinary `log::info!`/
/// `log::warn!` call sites elsewhere in the kernel land in the same
/// circular buffer as direct `klog` calls.
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let level = match record.level() {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Trace,
        };
        let mut message = MessageBuf::new();
        let _ = core::fmt::write(&mut message, *record.args());
        klog(level, record.target(), message.as_str());
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Initialize the kernel log service and install it as the `log` crate's
/// global logger. Subsequent calls are no-ops for the buffer; `log`'s
/// `set_logger` is idempotent-by-error, so a second call is also harmless.
pub fn log_init() {
    let _ = LOG_SERVICE.init(Mutex::new(LogService::new()));
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);
}

/// Record a structured log entry.
///
/// If the log service has not been initialized yet, the message is
/// silently dropped.
pub fn klog(level: LogLevel, subsystem: &str, message: &str) {
    LOG_SERVICE.with(|lock| {
        lock.lock().log(level, subsystem, message);
    });
}

/// Iterate over all buffered log entries from oldest to newest.
///
/// Returns the number of entries visited, or `None` if the service is not
/// initialized.
pub fn log_drain<F: FnMut(&LogEntry)>(mut f: F) -> Option<usize> {
    LOG_SERVICE.with(|lock| {
        let service = lock.lock();
        let n = service.buffer.len();
        for i in 0..n {
            if let Some(entry) = service.buffer.get(i) {
                f(entry);
            }
        }
        n
    })
}

/// Return the number of entries currently in the log buffer.
pub fn log_count() -> Option<usize> {
    LOG_SERVICE.with(|lock| lock.lock().count())
}

/// Clear all log entries.
pub fn log_clear() -> Option<()> {
    LOG_SERVICE.with(|lock| lock.lock().clear())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_push_and_drain() {
        log_init();
        log_clear();
        klog(LogLevel::Info, "term", "engine initialized");
        klog(LogLevel::Warn, "term", "ring nearly full");

        assert_eq!(log_count(), Some(2));

        let mut seen: [(LogLevel, [u8; LOG_MESSAGE_MAX_LEN], u8); 2] =
            [(LogLevel::Trace, [0; LOG_MESSAGE_MAX_LEN], 0); 2];
        let mut i = 0;
        log_drain(|e| {
            let msg = e.message().as_bytes();
            seen[i].0 = e.level;
            seen[i].1[..msg.len()].copy_from_slice(msg);
            seen[i].2 = msg.len() as u8;
            i += 1;
        });
        assert_eq!(i, 2);
        assert_eq!(seen[0].0, LogLevel::Info);
        let second_len = seen[1].2 as usize;
        assert_eq!(&seen[1].1[..second_len], b"ring nearly full");

        log_clear();
        assert_eq!(log_count(), Some(0));
    }
}
