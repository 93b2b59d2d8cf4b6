// src/server/process.rs
use crate::error::{Error, Result};
use async_process::{Child, Command, Stdio};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a supervised server process
///
/// Identifiers are UUIDv7, so they carry a timestamp component followed by
/// random bits. Lexical order roughly tracks start order but callers must
/// not rely on it for anything beyond recency hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(Uuid);

impl ServerId {
    // Private constructor, only usable within our crate
    pub(crate) fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

// Implement Display trait
impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ServerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::ServerNotFound(format!("Invalid server ID '{}': {}", s, e)))
    }
}

/// Status of a supervised server process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    /// Process is running
    Running,
    /// Process has exited; `code` is `None` when the OS reported no
    /// numeric exit code (e.g. termination by signal)
    Exited {
        /// Exit code reported by the OS, if any
        code: Option<i32>,
    },
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStatus::Running => write!(f, "Running"),
            ServerStatus::Exited { code: Some(code) } => write!(f, "Exited with code {}", code),
            ServerStatus::Exited { code: None } => write!(f, "Exited (no exit code)"),
        }
    }
}

/// Termination signal sent to a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Graceful termination request
    Terminate,
    /// Immediate, non-ignorable kill
    Kill,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Terminate => write!(f, "SIGTERM"),
            StopSignal::Kill => write!(f, "SIGKILL"),
        }
    }
}

/// Sends termination signals to supervised processes.
///
/// The supervisor routes every signal through this trait so tests can
/// observe or suppress the side effect.
pub trait ProcessSignaler: Send + Sync {
    /// Sends `signal` to the process with the given OS pid.
    ///
    /// Signalling a process that has already exited is not an error: the
    /// exit is observed through the process handle, not through the signal
    /// path.
    fn signal(&self, pid: u32, signal: StopSignal) -> Result<()>;
}

/// Signaler backed by `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessSignaler;

impl ProcessSignaler for UnixProcessSignaler {
    fn signal(&self, pid: u32, signal: StopSignal) -> Result<()> {
        let sig = match signal {
            StopSignal::Terminate => Signal::SIGTERM,
            StopSignal::Kill => Signal::SIGKILL,
        };

        match kill(Pid::from_raw(pid as i32), sig) {
            Ok(()) => Ok(()),
            // The process is already gone; the exit observer reports that.
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::Process(format!(
                "Failed to send {} to pid {}: {}",
                signal, pid, e
            ))),
        }
    }
}

/// Fully resolved launch description for one script process.
pub struct SpawnSpec {
    /// Resolved interpreter executable
    pub interpreter: PathBuf,
    /// Arguments passed to the interpreter, before the script path
    pub interpreter_args: Vec<String>,
    /// Script file to run
    pub script_path: PathBuf,
    /// Arguments passed to the script itself
    pub script_args: Vec<String>,
    /// Working directory for the process
    pub cwd: PathBuf,
}

impl SpawnSpec {
    /// Renders the command line this spec launches, for display and audit.
    /// The result is not meant to be re-parsed.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.interpreter.display().to_string()];
        parts.extend(self.interpreter_args.iter().cloned());
        parts.push(self.script_path.display().to_string());
        parts.extend(self.script_args.iter().cloned());
        parts.join(" ")
    }

    /// Spawns the process described by this spec.
    ///
    /// Standard input is discarded; standard output and standard error are
    /// captured as pipes for the caller to stream.
    pub fn spawn(&self) -> Result<Child> {
        let mut command = Command::new(&self.interpreter);
        command.args(&self.interpreter_args);
        command.arg(&self.script_path);
        command.args(&self.script_args);
        command.current_dir(&self.cwd);

        // Configure stdio
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        command
            .spawn()
            .map_err(|e| Error::SpawnFailure(format!("Failed to start process: {}", e)))
    }
}
