use crate::error::{Error, Result};
use crate::server::logs::{LogBuffer, LogEntry, LogFilter, LogView};
use crate::server::process::{ServerId, ServerStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Exit details captured the moment an exit is observed
#[derive(Debug, Clone, Copy)]
pub struct ExitInfo {
    /// Exit code reported by the OS; `None` if no numeric code was available
    pub code: Option<i32>,
    /// Wall time from spawn to the observed exit
    pub ran_for: Duration,
}

/// Mutable per-record state, guarded by one lock per record
struct RecordState {
    /// Bounded output buffer
    logs: LogBuffer,
    /// Set exactly once, on the first observed exit
    exit: Option<ExitInfo>,
    /// Set when a forced kill failed to bring the process down in time
    unresponsive: bool,
    /// Pending retention-delay removal, if the record has exited
    removal_timer: Option<JoinHandle<()>>,
    /// Stream reader and exit observer tasks
    tasks: Vec<JoinHandle<()>>,
}

/// Supervisory state for one spawned process.
///
/// The record is created when the process spawns and lives in the
/// [`Registry`] until the retention window after exit elapses. Identity
/// fields are immutable; logs and exit state are guarded by a per-record
/// lock so stream callbacks, stop calls, and queries can interleave safely.
pub struct ServerRecord {
    /// Identifier issued at start
    id: ServerId,
    /// Display label
    name: String,
    /// Resolved command line, for display and audit
    command: String,
    /// Working directory the process was launched in
    cwd: PathBuf,
    /// OS process id at spawn time; kept after exit for display
    pid: u32,
    /// Wall-clock start timestamp
    started_at: DateTime<Utc>,
    /// Monotonic start reference for uptime computation
    start_instant: Instant,
    /// Per-record mutable state
    state: Mutex<RecordState>,
    /// Broadcasts the transition to exited; starts out `false`
    exit_tx: watch::Sender<bool>,
}

impl ServerRecord {
    pub(crate) fn new(
        id: ServerId,
        name: String,
        command: String,
        cwd: PathBuf,
        pid: u32,
        log_cap: usize,
    ) -> Self {
        let (exit_tx, _) = watch::channel(false);

        Self {
            id,
            name,
            command,
            cwd,
            pid,
            started_at: Utc::now(),
            start_instant: Instant::now(),
            state: Mutex::new(RecordState {
                logs: LogBuffer::new(log_cap),
                exit: None,
                unresponsive: false,
                removal_timer: None,
                tasks: Vec::new(),
            }),
            exit_tx,
        }
    }

    /// Identifier issued at start
    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Display label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved command line used to launch the process
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Working directory the process was launched in
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// OS process id at spawn time
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wall-clock start timestamp
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current status derived from the exit state
    pub fn status(&self) -> Result<ServerStatus> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(match state.exit {
            Some(exit) => ServerStatus::Exited { code: exit.code },
            None => ServerStatus::Running,
        })
    }

    /// Exit details, if the process has exited
    pub fn exit_info(&self) -> Result<Option<ExitInfo>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(state.exit)
    }

    /// Elapsed run time: still counting while running, frozen at exit
    pub fn uptime(&self) -> Result<Duration> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(match state.exit {
            Some(exit) => exit.ran_for,
            None => self.start_instant.elapsed(),
        })
    }

    /// Whether a forced kill failed to bring the process down in time
    pub fn is_unresponsive(&self) -> Result<bool> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(state.unresponsive)
    }

    /// Appends one output line to the record's log buffer
    pub(crate) fn append_log(&self, entry: LogEntry) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        state.logs.append(entry);

        Ok(())
    }

    /// Runs a filtered query over the record's logs
    pub fn query_logs(&self, filter: &LogFilter) -> Result<LogView> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(state.logs.query(filter))
    }

    /// Last `n` log entries in original order
    pub fn log_tail(&self, n: usize) -> Result<Vec<LogEntry>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        Ok(state.logs.tail(n))
    }

    /// Records the observed exit. Only the first call takes effect; the
    /// return value tells the caller whether it was that first call.
    pub(crate) fn mark_exited(&self, code: Option<i32>) -> Result<bool> {
        let newly_exited = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

            if state.exit.is_some() {
                false
            } else {
                state.exit = Some(ExitInfo {
                    code,
                    ran_for: self.start_instant.elapsed(),
                });
                true
            }
        };

        if newly_exited {
            self.exit_tx.send_replace(true);
        }

        Ok(newly_exited)
    }

    /// Flags the record after a forced kill went unanswered
    pub(crate) fn mark_unresponsive(&self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        state.unresponsive = true;

        Ok(())
    }

    /// Receiver that resolves to `true` once the process has exited
    pub(crate) fn subscribe_exit(&self) -> watch::Receiver<bool> {
        self.exit_tx.subscribe()
    }

    /// Stores the retention-delay removal timer, cancelling any previous one
    pub(crate) fn set_removal_timer(&self, handle: JoinHandle<()>) -> Result<()> {
        let replaced = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

            state.removal_timer.replace(handle)
        };

        if let Some(old) = replaced {
            old.abort();
        }

        Ok(())
    }

    /// Stores the stream reader and exit observer task handles
    pub(crate) fn register_tasks(&self, tasks: Vec<JoinHandle<()>>) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

        state.tasks.extend(tasks);

        Ok(())
    }

    /// Aborts all background tasks and any pending removal timer.
    /// Returns `true` if the record had not exited yet.
    pub(crate) fn abort_tasks(&self) -> Result<bool> {
        let (tasks, timer, still_running) = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::Other("Failed to lock server record state".to_string()))?;

            (
                std::mem::take(&mut state.tasks),
                state.removal_timer.take(),
                state.exit.is_none(),
            )
        };

        for task in tasks {
            task.abort();
        }
        if let Some(timer) = timer {
            timer.abort();
        }

        Ok(still_running)
    }
}

/// Concurrency-safe mapping from server identifiers to live records.
///
/// The registry is the single source of truth for which servers exist. It
/// is an explicitly constructed instance, so independent supervisors (and
/// tests) each own their own map.
pub struct Registry {
    entries: Mutex<HashMap<ServerId, Arc<ServerRecord>>>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts a record under its own id. The id must be unoccupied.
    pub(crate) fn insert(&self, record: Arc<ServerRecord>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))?;

        match entries.entry(record.id()) {
            Entry::Occupied(_) => Err(Error::Other(format!(
                "Server ID already registered: {}",
                record.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Looks up a record by id
    pub fn get(&self, id: &ServerId) -> Result<Option<Arc<ServerRecord>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))?;

        Ok(entries.get(id).cloned())
    }

    /// Removes a record by id, returning it if it was present
    pub(crate) fn remove(&self, id: &ServerId) -> Result<Option<Arc<ServerRecord>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))?;

        Ok(entries.remove(id))
    }

    /// All current records, in unspecified order
    pub fn list(&self) -> Result<Vec<Arc<ServerRecord>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))?;

        Ok(entries.values().cloned().collect())
    }

    /// Number of records currently held
    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))?;

        Ok(entries.len())
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Arc<ServerRecord> {
        Arc::new(ServerRecord::new(
            ServerId::new(),
            name.to_string(),
            format!("node {}.js", name),
            PathBuf::from("/tmp"),
            4242,
            100,
        ))
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(ServerId::new()));
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = Registry::new();
        let rec = record("alpha");
        let id = rec.id();

        registry.insert(Arc::clone(&rec)).unwrap();
        assert_eq!(registry.len().unwrap(), 1);

        let fetched = registry.get(&id).unwrap().unwrap();
        assert_eq!(fetched.name(), "alpha");

        let removed = registry.remove(&id).unwrap();
        assert!(removed.is_some());
        assert!(registry.get(&id).unwrap().is_none());
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let registry = Registry::new();
        let rec = record("beta");

        registry.insert(Arc::clone(&rec)).unwrap();
        assert!(registry.insert(rec).is_err());
    }

    #[test]
    fn test_mark_exited_takes_effect_once() {
        let rec = record("gamma");

        assert!(rec.mark_exited(Some(0)).unwrap());
        assert!(!rec.mark_exited(Some(137)).unwrap());

        match rec.status().unwrap() {
            ServerStatus::Exited { code } => assert_eq!(code, Some(0)),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_uptime_freezes_at_exit() {
        let rec = record("delta");

        rec.mark_exited(None).unwrap();
        let first = rec.uptime().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(rec.uptime().unwrap(), first);
    }
}
