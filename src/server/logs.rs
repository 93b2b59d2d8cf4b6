//! Bounded log storage for supervised processes.
//!
//! Every server record owns one [`LogBuffer`]: an ordered, capacity-bounded
//! store of tagged output lines. Appends evict the oldest entries once the
//! cap is reached, so the buffer always holds the most recent output.
//! Queries filter by origin stream and case-insensitive substring, then
//! return at most the last `limit` matches.
//!
//! # Examples
//!
//! ```
//! use script_supervisor::server::{LogBuffer, LogEntry, LogFilter, LogStream, StreamFilter};
//!
//! let mut buffer = LogBuffer::new(100);
//! buffer.append(LogEntry::new(LogStream::Stdout, "listening on :3000"));
//! buffer.append(LogEntry::new(LogStream::Stderr, "Error: bad request"));
//!
//! let filter = LogFilter {
//!     streams: StreamFilter::StderrOnly,
//!     contains: Some("error".to_string()),
//!     ..LogFilter::default()
//! };
//! let view = buffer.query(&filter);
//! assert_eq!(view.shown, 1);
//! assert_eq!(view.entries[0].to_string(), "stderr: Error: bad request");
//! ```
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Origin stream of one buffered output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStream::Stdout => write!(f, "stdout"),
            LogStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// One tagged output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stream the line was read from
    pub stream: LogStream,
    /// Line content, without the trailing newline
    pub content: String,
}

impl LogEntry {
    /// Creates an entry tagged with its origin stream.
    pub fn new(stream: LogStream, content: impl Into<String>) -> Self {
        Self {
            stream,
            content: content.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stream, self.content)
    }
}

/// Which origin streams a query accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFilter {
    /// Accept entries from both streams
    #[default]
    Both,
    /// Accept only standard output entries
    StdoutOnly,
    /// Accept only standard error entries
    StderrOnly,
}

impl StreamFilter {
    /// Whether an entry from `stream` passes this filter.
    pub fn matches(self, stream: LogStream) -> bool {
        match self {
            StreamFilter::Both => true,
            StreamFilter::StdoutOnly => stream == LogStream::Stdout,
            StreamFilter::StderrOnly => stream == LogStream::Stderr,
        }
    }
}

/// Selection criteria for a log query.
///
/// Filtering narrows the candidate set first; the most recent `limit`
/// entries of the filtered set are then returned.
#[derive(Debug, Clone)]
pub struct LogFilter {
    /// Maximum number of entries returned, applied after filtering
    pub limit: usize,
    /// Origin streams to accept
    pub streams: StreamFilter,
    /// Case-insensitive substring the entry content must contain
    pub contains: Option<String>,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            limit: 100,
            streams: StreamFilter::Both,
            contains: None,
        }
    }
}

/// Result of a log query: the matching entries plus counts for messaging.
#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    /// Matching entries, oldest first
    pub entries: Vec<LogEntry>,
    /// Number of entries returned
    pub shown: usize,
    /// Number of entries buffered before filtering
    pub total: usize,
}

impl LogView {
    /// Explains an empty result, if there is one to explain.
    pub fn reason(&self) -> Option<&'static str> {
        if self.total == 0 {
            Some("no log output has been recorded for this server")
        } else if self.shown == 0 {
            Some("no log entries match the requested filter")
        } else {
            None
        }
    }
}

impl fmt::Display for LogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        write!(f, "Showing {} of {} log entries", self.shown, self.total)
    }
}

/// Bounded FIFO store of tagged log lines.
///
/// Length never exceeds the cap given at construction; once full, each
/// append evicts the oldest entry.
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    cap: usize,
}

impl LogBuffer {
    /// Creates an empty buffer holding at most `cap` entries.
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    /// Appends one entry, evicting the oldest if the buffer is full.
    pub fn append(&mut self, entry: LogEntry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last `n` entries in original order, unfiltered.
    pub fn tail(&self, n: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Runs a filtered query over the buffer.
    ///
    /// Entries are filtered by stream and substring first; the most recent
    /// `filter.limit` survivors are returned in their original order. An
    /// empty result is not an error: [`LogView::reason`] explains it.
    pub fn query(&self, filter: &LogFilter) -> LogView {
        let total = self.entries.len();
        let needle = filter.contains.as_ref().map(|s| s.to_lowercase());

        let matched: Vec<LogEntry> = self
            .entries
            .iter()
            .filter(|entry| filter.streams.matches(entry.stream))
            .filter(|entry| match &needle {
                Some(needle) => entry.content.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();

        let start = matched.len().saturating_sub(filter.limit);
        let entries = matched[start..].to_vec();
        let shown = entries.len();

        LogView {
            entries,
            shown,
            total,
        }
    }
}
