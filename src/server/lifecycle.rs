use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::permission::PermissionGate;
use crate::resolver::InterpreterResolver;
use crate::server::logs::{LogEntry, LogStream};
use crate::server::process::{ProcessSignaler, ServerId, SpawnSpec, StopSignal};
use crate::server::registry::{Registry, ServerRecord};
use async_process::Child;
use futures_lite::StreamExt;
use futures_lite::io::{AsyncBufReadExt, AsyncRead, BufReader};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Caller-supplied description of a script to launch.
///
/// Only the script path and working directory are mandatory; everything
/// else has a neutral default.
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Script file to run
    pub script_path: PathBuf,
    /// Working directory for the process
    pub cwd: PathBuf,
    /// Display label; defaults to the script's base filename
    pub name: Option<String>,
    /// Arguments passed to the interpreter, before the script path
    pub interpreter_args: Vec<String>,
    /// Arguments passed to the script itself
    pub script_args: Vec<String>,
    /// Optional interpreter version selector, resolved by the
    /// [`InterpreterResolver`] collaborator
    pub interpreter_selector: Option<String>,
}

impl StartRequest {
    /// Creates a request with the mandatory fields and neutral defaults.
    pub fn new(script_path: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            cwd: cwd.into(),
            name: None,
            interpreter_args: Vec::new(),
            script_args: Vec::new(),
            interpreter_selector: None,
        }
    }

    fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .script_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.script_path.display().to_string()),
        }
    }
}

/// What a successful start reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct StartedServer {
    /// Identifier issued for the new record
    pub id: ServerId,
    /// Display label
    pub name: String,
    /// OS process id
    pub pid: u32,
    /// Resolved command line
    pub command: String,
    /// Working directory the process was launched in
    pub cwd: PathBuf,
}

impl fmt::Display for StartedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Started '{}' (id: {}, pid: {}) in {}: {}",
            self.name,
            self.id,
            self.pid,
            self.cwd.display(),
            self.command
        )
    }
}

/// Result of a stop request.
///
/// Every variant is a surfaced outcome, not an error: the caller always
/// learns what happened and what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process had exited before the stop request; no signal was sent
    AlreadyExited {
        /// Exit code recorded at the time of exit, if any
        code: Option<i32>,
    },
    /// The process exited within the stop timeout after being signalled
    Exited {
        /// Exit code reported by the OS, if any
        code: Option<i32>,
        /// Whether the signal sent was a forced kill
        forced: bool,
    },
    /// The graceful stop timed out and the caller approved escalation;
    /// a kill signal was sent without re-waiting
    ForceKillSent,
    /// The graceful stop timed out and escalation was declined;
    /// the record is unchanged and can be stopped again with force
    Timeout {
        /// How long the stop waited for the exit
        waited: Duration,
    },
    /// The process survived a forced kill for the whole stop timeout;
    /// the record stays in the registry, flagged as unresponsive
    Unresponsive {
        /// How long the stop waited for the exit
        waited: Duration,
    },
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::AlreadyExited { code: Some(code) } => {
                write!(f, "Server had already exited with code {}", code)
            }
            StopOutcome::AlreadyExited { code: None } => {
                write!(f, "Server had already exited")
            }
            StopOutcome::Exited {
                code,
                forced: false,
            } => match code {
                Some(code) => write!(f, "Server exited with code {}", code),
                None => write!(f, "Server exited"),
            },
            StopOutcome::Exited { forced: true, .. } => {
                write!(f, "Server was forcibly terminated")
            }
            StopOutcome::ForceKillSent => {
                write!(f, "Graceful stop timed out; forced kill sent")
            }
            StopOutcome::Timeout { waited } => {
                write!(
                    f,
                    "Server did not exit within {:?}; retry with force to kill it",
                    waited
                )
            }
            StopOutcome::Unresponsive { waited } => {
                write!(
                    f,
                    "Server did not exit within {:?} of a forced kill and remains tracked as running",
                    waited
                )
            }
        }
    }
}

/// Orchestrates starting, stopping, and expiring supervised processes.
///
/// One logical flow runs per request; stream output and process exit are
/// observed by background tasks that funnel all writes for a record
/// through a single consumer, so no update is lost regardless of how
/// requests and callbacks interleave.
pub struct LifecycleManager {
    /// Shared record store
    registry: Arc<Registry>,
    /// Supervisor settings
    config: SupervisorConfig,
    /// Approval collaborator
    gate: Arc<dyn PermissionGate>,
    /// Interpreter resolution collaborator
    resolver: Arc<dyn InterpreterResolver>,
    /// Signal delivery, routed through a trait so tests can observe it
    signaler: Arc<dyn ProcessSignaler>,
}

impl LifecycleManager {
    /// Creates a manager over the given registry and collaborators.
    pub fn new(
        registry: Arc<Registry>,
        config: SupervisorConfig,
        gate: Arc<dyn PermissionGate>,
        resolver: Arc<dyn InterpreterResolver>,
        signaler: Arc<dyn ProcessSignaler>,
    ) -> Self {
        Self {
            registry,
            config,
            gate,
            resolver,
            signaler,
        }
    }

    /// Launches a script and registers a record for it.
    ///
    /// The script must exist and the working directory must be a
    /// directory; approval is then requested before anything is spawned.
    /// On any failure the registry is left untouched, so a failed start
    /// never produces a partial record.
    pub async fn start_server(&self, request: StartRequest) -> Result<StartedServer> {
        let name = request.display_name();

        if !request.script_path.is_file() {
            return Err(Error::ScriptMissing(
                request.script_path.display().to_string(),
            ));
        }
        if !request.cwd.is_dir() {
            return Err(Error::SpawnFailure(format!(
                "Working directory does not exist: {}",
                request.cwd.display()
            )));
        }

        let description = format!(
            "Start script {} in {}",
            request.script_path.display(),
            request.cwd.display()
        );
        if !self.gate.request_approval(&description).await? {
            tracing::warn!(script = %request.script_path.display(), "Start was not approved");
            return Err(Error::PermissionDenied(format!(
                "Launch of '{}' was not approved",
                name
            )));
        }

        let interpreter = self
            .resolver
            .resolve(request.interpreter_selector.as_deref())
            .await?;

        let spec = SpawnSpec {
            interpreter,
            interpreter_args: request.interpreter_args,
            script_path: request.script_path,
            script_args: request.script_args,
            cwd: request.cwd,
        };
        let command = spec.command_line();
        let cwd = spec.cwd.clone();

        let mut child = spec.spawn()?;
        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::SpawnFailure("Failed to capture stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::SpawnFailure("Failed to capture stderr pipe".to_string()))?;

        let id = ServerId::new();
        let record = Arc::new(ServerRecord::new(
            id,
            name.clone(),
            command.clone(),
            cwd.clone(),
            pid,
            self.config.log_buffer_cap,
        ));

        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let stdout_task = spawn_stream_reader(id, LogStream::Stdout, stdout, line_tx.clone());
        let stderr_task = spawn_stream_reader(id, LogStream::Stderr, stderr, line_tx);
        let observer_task = self.spawn_exit_observer(child, Arc::clone(&record), line_rx);
        record.register_tasks(vec![stdout_task, stderr_task, observer_task])?;

        if let Err(e) = self.registry.insert(Arc::clone(&record)) {
            let _ = record.abort_tasks();
            let _ = self.signaler.signal(pid, StopSignal::Kill);
            return Err(e);
        }

        tracing::info!(server_id = %id, pid, %command, "Started script server");

        Ok(StartedServer {
            id,
            name,
            pid,
            command,
            cwd,
        })
    }

    /// Stops a supervised process, gracefully unless `force` is set.
    ///
    /// A record whose exit is already known is reported as such without
    /// any signal being sent. Otherwise the process is signalled and the
    /// call waits up to the configured stop timeout for the exit to be
    /// observed. A graceful stop that times out offers the caller an
    /// escalation to a forced kill; a forced stop that times out is
    /// surfaced as [`StopOutcome::Unresponsive`].
    pub async fn stop_server(&self, id: ServerId, force: bool) -> Result<StopOutcome> {
        let record = self
            .registry
            .get(&id)?
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;

        if let Some(exit) = record.exit_info()? {
            return Ok(StopOutcome::AlreadyExited { code: exit.code });
        }

        let signal = if force {
            StopSignal::Kill
        } else {
            StopSignal::Terminate
        };

        let description = format!(
            "Send {} to server '{}' (pid {})",
            signal,
            record.name(),
            record.pid()
        );
        if !self.gate.request_approval(&description).await? {
            tracing::warn!(server_id = %id, "Stop was not approved");
            return Err(Error::PermissionDenied(format!(
                "Stop of '{}' was not approved",
                record.name()
            )));
        }

        let mut exit_rx = record.subscribe_exit();
        self.signaler.signal(record.pid(), signal)?;
        tracing::info!(server_id = %id, %signal, "Signalled script server");

        let wait = self.config.stop_timeout();
        match timeout(wait, exit_rx.wait_for(|exited| *exited)).await {
            Ok(Ok(_)) => {
                let code = record.exit_info()?.and_then(|exit| exit.code);
                tracing::info!(server_id = %id, ?code, "Server stopped");
                Ok(StopOutcome::Exited {
                    code,
                    forced: force,
                })
            }
            Ok(Err(_)) | Err(_) => {
                if force {
                    record.mark_unresponsive()?;
                    tracing::warn!(server_id = %id, "Server survived a forced kill for the whole stop timeout");
                    return Ok(StopOutcome::Unresponsive { waited: wait });
                }

                let escalation = format!(
                    "Force kill server '{}' (pid {}) after graceful stop timed out",
                    record.name(),
                    record.pid()
                );
                if self.gate.request_approval(&escalation).await? {
                    self.signaler.signal(record.pid(), StopSignal::Kill)?;
                    tracing::info!(server_id = %id, "Escalated to forced kill");
                    Ok(StopOutcome::ForceKillSent)
                } else {
                    tracing::warn!(server_id = %id, "Graceful stop timed out and escalation was declined");
                    Ok(StopOutcome::Timeout { waited: wait })
                }
            }
        }
    }

    /// Tears down every record: observer tasks and pending removal timers
    /// are cancelled, still-running processes are killed, and the registry
    /// is drained.
    pub fn shutdown_all(&self) -> Result<()> {
        let records = self.registry.list()?;
        tracing::info!(count = records.len(), "Shutting down all supervised servers");

        for record in records {
            let still_running = record.abort_tasks()?;
            if still_running {
                if let Err(e) = self.signaler.signal(record.pid(), StopSignal::Kill) {
                    tracing::warn!(server_id = %record.id(), error = %e, "Failed to kill server during shutdown");
                }
            }
            self.registry.remove(&record.id())?;
        }

        Ok(())
    }

    /// Consumes buffered output lines and watches for the process exit.
    ///
    /// This task is the single writer for the record: both stream readers
    /// send into its channel, and the exit status resolves here. Lines
    /// that arrive after the exit are still appended until both readers
    /// reach end of stream.
    fn spawn_exit_observer(
        &self,
        mut child: Child,
        record: Arc<ServerRecord>,
        mut line_rx: mpsc::UnboundedReceiver<LogEntry>,
    ) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.registry);
        let retention = self.config.retention();

        tokio::spawn(async move {
            let status_fut = child.status();
            tokio::pin!(status_fut);

            let mut lines_open = true;
            let mut exited = false;

            while lines_open || !exited {
                tokio::select! {
                    line = line_rx.recv(), if lines_open => match line {
                        Some(entry) => {
                            if record.append_log(entry).is_err() {
                                line_rx.close();
                                lines_open = false;
                            }
                        }
                        None => lines_open = false,
                    },
                    status = &mut status_fut, if !exited => {
                        exited = true;
                        let code = match status {
                            Ok(status) => status.code(),
                            Err(e) => {
                                tracing::warn!(server_id = %record.id(), error = %e, "Failed to read exit status");
                                None
                            }
                        };
                        observe_exit(&record, code, &registry, retention);
                    }
                }
            }
        })
    }
}

/// Reads one output stream line by line and forwards tagged entries.
///
/// An I/O error ends this reader without disturbing the sibling stream or
/// the record itself.
fn spawn_stream_reader<R>(
    id: ServerId,
    stream: LogStream,
    reader: R,
    tx: mpsc::UnboundedSender<LogEntry>,
) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next().await {
                Some(Ok(line)) => {
                    if tx.send(LogEntry::new(stream, line)).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(server_id = %id, %stream, error = %e, "Stopped reading stream after I/O error");
                    break;
                }
                None => break,
            }
        }
    })
}

/// Marks the record exited and schedules its retention-delayed removal.
///
/// Marking takes effect exactly once, so a second observation cannot
/// schedule a second removal timer. The timer holds only a weak registry
/// reference and becomes a no-op if the supervisor is gone by the time it
/// fires.
fn observe_exit(
    record: &Arc<ServerRecord>,
    code: Option<i32>,
    registry: &Weak<Registry>,
    retention: Duration,
) {
    let newly_exited = match record.mark_exited(code) {
        Ok(newly_exited) => newly_exited,
        Err(e) => {
            tracing::error!(server_id = %record.id(), error = %e, "Failed to record process exit");
            return;
        }
    };
    if !newly_exited {
        return;
    }

    tracing::info!(server_id = %record.id(), ?code, "Script server exited");

    let id = record.id();
    let registry = registry.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        if let Some(registry) = registry.upgrade() {
            match registry.remove(&id) {
                Ok(_) => {
                    tracing::debug!(server_id = %id, "Purged exited server after retention window");
                }
                Err(e) => {
                    tracing::warn!(server_id = %id, error = %e, "Failed to purge exited server");
                }
            }
        }
    });

    if let Err(e) = record.set_removal_timer(timer) {
        tracing::warn!(server_id = %record.id(), error = %e, "Failed to track removal timer");
    }
}
