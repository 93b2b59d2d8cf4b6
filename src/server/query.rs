use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::server::logs::{LogEntry, LogFilter, LogView};
use crate::server::process::{ServerId, ServerStatus};
use crate::server::registry::{Registry, ServerRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One server's row in a listing
#[derive(Debug, Clone, Serialize)]
pub struct ServerSummary {
    /// Identifier issued at start
    pub id: ServerId,
    /// Display label
    pub name: String,
    /// OS process id at spawn time
    pub pid: u32,
    /// Running or exited status
    pub status: ServerStatus,
    /// Elapsed run time, frozen at exit
    pub uptime: Duration,
    /// Wall-clock start timestamp
    pub started_at: DateTime<Utc>,
    /// Whether a forced kill went unanswered
    pub unresponsive: bool,
    /// Short tail of recent log entries, when requested
    pub log_tail: Option<Vec<LogEntry>>,
}

impl fmt::Display for ServerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id: {}, pid: {}): {}, up {}, started {}",
            self.name,
            self.id,
            self.pid,
            self.status,
            format_uptime(self.uptime),
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )?;
        if self.unresponsive {
            write!(f, " [unresponsive]")?;
        }
        if let Some(tail) = &self.log_tail {
            for entry in tail {
                write!(f, "\n  {}", entry)?;
            }
        }
        Ok(())
    }
}

/// Full view of a single server record
#[derive(Debug, Clone, Serialize)]
pub struct ServerDetail {
    /// Identifier issued at start
    pub id: ServerId,
    /// Display label
    pub name: String,
    /// OS process id at spawn time
    pub pid: u32,
    /// Running or exited status
    pub status: ServerStatus,
    /// Elapsed run time, frozen at exit
    pub uptime: Duration,
    /// Wall-clock start timestamp
    pub started_at: DateTime<Utc>,
    /// Whether a forced kill went unanswered
    pub unresponsive: bool,
    /// Resolved command line used at launch
    pub command: String,
    /// Working directory the process was launched in
    pub cwd: PathBuf,
    /// Recent log entries, when requested
    pub logs: Option<LogView>,
}

impl fmt::Display for ServerDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:    {}", self.name)?;
        writeln!(f, "ID:      {}", self.id)?;
        writeln!(f, "PID:     {}", self.pid)?;
        writeln!(f, "Status:  {}", self.status)?;
        if self.unresponsive {
            writeln!(f, "         (did not react to a forced kill)")?;
        }
        writeln!(f, "Uptime:  {}", format_uptime(self.uptime))?;
        writeln!(
            f,
            "Started: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Command: {}", self.command)?;
        write!(f, "Workdir: {}", self.cwd.display())?;
        if let Some(logs) = &self.logs {
            write!(f, "\nRecent logs:")?;
            match logs.reason() {
                Some(reason) => write!(f, " {}", reason)?,
                None => {
                    for entry in &logs.entries {
                        write!(f, "\n  {}", entry)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Listing of all current records, distinguishing the empty case
#[derive(Debug, Clone, Serialize)]
pub enum Listing {
    /// The registry holds no records at all
    NoServers,
    /// One summary per record, ordered by start time
    Servers(Vec<ServerSummary>),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::NoServers => write!(f, "No servers are currently running."),
            Listing::Servers(summaries) => {
                for (i, summary) in summaries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", summary)?;
                }
                Ok(())
            }
        }
    }
}

/// Read-only projections over the registry for human-facing output.
pub struct QueryService {
    /// Shared record store
    registry: Arc<Registry>,
    /// Log tail length used in listings
    list_tail: usize,
    /// Log tail length used in detail views
    detail_tail: usize,
}

impl QueryService {
    /// Creates a query service over the given registry
    pub fn new(registry: Arc<Registry>, config: &SupervisorConfig) -> Self {
        Self {
            registry,
            list_tail: config.list_tail,
            detail_tail: config.detail_tail,
        }
    }

    /// Summaries of all records, ordered by start time
    pub fn list_all(&self, include_logs: bool) -> Result<Listing> {
        let records = self.registry.list()?;
        if records.is_empty() {
            return Ok(Listing::NoServers);
        }

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            summaries.push(self.summarize(&record, include_logs)?);
        }
        summaries.sort_by_key(|summary| summary.started_at);

        Ok(Listing::Servers(summaries))
    }

    /// Detail view of one record
    pub fn get_one(&self, id: ServerId, include_logs: bool) -> Result<ServerDetail> {
        let record = self
            .registry
            .get(&id)?
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;

        let logs = if include_logs {
            let filter = LogFilter {
                limit: self.detail_tail,
                ..LogFilter::default()
            };
            Some(record.query_logs(&filter)?)
        } else {
            None
        };

        Ok(ServerDetail {
            id: record.id(),
            name: record.name().to_string(),
            pid: record.pid(),
            status: record.status()?,
            uptime: record.uptime()?,
            started_at: record.started_at(),
            unresponsive: record.is_unresponsive()?,
            command: record.command().to_string(),
            cwd: record.cwd().to_path_buf(),
            logs,
        })
    }

    /// Filtered log query against one record
    pub fn server_logs(&self, id: ServerId, filter: &LogFilter) -> Result<LogView> {
        let record = self
            .registry
            .get(&id)?
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;

        record.query_logs(filter)
    }

    fn summarize(&self, record: &Arc<ServerRecord>, include_logs: bool) -> Result<ServerSummary> {
        let log_tail = if include_logs {
            Some(record.log_tail(self.list_tail)?)
        } else {
            None
        };

        Ok(ServerSummary {
            id: record.id(),
            name: record.name().to_string(),
            pid: record.pid(),
            status: record.status()?,
            uptime: record.uptime()?,
            started_at: record.started_at(),
            unresponsive: record.is_unresponsive()?,
            log_tail,
        })
    }
}

fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
