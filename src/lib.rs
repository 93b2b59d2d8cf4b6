/*!
 # Script Supervisor

 A Rust library for launching, supervising and inspecting background script processes.

 ## Overview

 Script Supervisor provides functionality to:
 - Launch script processes through a resolved interpreter and register them under opaque IDs
 - Capture standard output and standard error into bounded per-server log buffers
 - List running and recently exited servers with status, uptime, and recent output
 - Query buffered logs filtered by stream and case-insensitive substring
 - Stop servers gracefully, with timeout escalation to a forced kill
 - Purge exited records after a configurable retention window

 ## Basic Usage

 ```no_run
 use script_supervisor::{Result, ScriptSupervisor, StartRequest, SupervisorConfig};

 #[tokio::main]
 async fn main() -> Result<()> {
     let supervisor = ScriptSupervisor::new(SupervisorConfig::default());

     // Launch a script
     let started = supervisor
         .start_server(StartRequest::new("server.js", "/srv/app"))
         .await?;
     println!("{}", started);

     // List everything the supervisor tracks, with a short log tail
     let listing = supervisor.list_servers(true)?;
     println!("{}", listing);

     // Stop gracefully; a stop that times out offers escalation
     let outcome = supervisor.stop_server(started.id, false).await?;
     println!("{}", outcome);

     supervisor.shutdown()?;
     Ok(())
 }
 ```

 ## Features

 - **Process Supervision**: Start, list, inspect, and stop script servers
 - **Bounded Logs**: Per-server output capture with FIFO eviction at a fixed cap
 - **Timeout Escalation**: Graceful termination first, forced kill on approval
 - **Retention**: Exited records stay queryable for a window, then purge themselves
 - **Pluggable Collaborators**: Permission gate, interpreter resolver, and signal delivery are traits
 - **Async Support**: Full async/await support

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod config;
pub mod error;
pub mod permission;
pub mod resolver;
pub mod server;

pub use config::SupervisorConfig;
pub use error::{Error, Result};
pub use server::{
    Listing, LogFilter, LogView, ServerDetail, ServerId, ServerStatus, ServerSummary,
    StartRequest, StartedServer, StopOutcome,
};

use config::validate_config;
use permission::{AllowAll, PermissionGate};
use resolver::{FixedInterpreter, InterpreterResolver};
use server::{
    LifecycleManager, ProcessSignaler, QueryService, Registry, UnixProcessSignaler,
};
use std::path::Path;
use std::sync::Arc;

/// Launch and supervise background script processes.
///
/// This struct is the main entry point: it owns the server registry and
/// wires the lifecycle manager and query service over it. Two supervisors
/// never share state, so tests and embedders can run several side by side.
/// All public methods are instrumented with `tracing` spans.
pub struct ScriptSupervisor {
    /// Supervisor settings
    config: SupervisorConfig,
    /// Lifecycle operations: start, stop, shutdown
    lifecycle: LifecycleManager,
    /// Read-only listing and log queries
    query: QueryService,
}

impl ScriptSupervisor {
    /// Create a new supervisor from a configuration file path
    ///
    /// The configuration is validated before use.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(path), fields(config_path = ?path.as_ref()))]
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = SupervisorConfig::from_file(path)?;
        validate_config(&config)?;
        Ok(Self::new(config))
    }

    /// Create a new supervisor from a configuration string
    ///
    /// The configuration is validated before use.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(config))]
    pub fn from_config_str(config: &str) -> Result<Self> {
        tracing::info!("Loading configuration from string");
        let config = SupervisorConfig::parse_from_str(config)?;
        validate_config(&config)?;
        Ok(Self::new(config))
    }

    /// Create a new supervisor with default collaborators
    ///
    /// Every action is approved, the configured interpreter is used for all
    /// scripts, and signals are delivered with `kill(2)`. Use
    /// [`ScriptSupervisor::with_collaborators`] to swap any of those.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(config))]
    pub fn new(config: SupervisorConfig) -> Self {
        let interpreter = config.interpreter.clone();
        Self::with_collaborators(
            config,
            Arc::new(AllowAll),
            Arc::new(FixedInterpreter::new(interpreter)),
            Arc::new(UnixProcessSignaler),
        )
    }

    /// Create a new supervisor with explicit collaborators
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip_all)]
    pub fn with_collaborators(
        config: SupervisorConfig,
        gate: Arc<dyn PermissionGate>,
        resolver: Arc<dyn InterpreterResolver>,
        signaler: Arc<dyn ProcessSignaler>,
    ) -> Self {
        tracing::info!("Creating new ScriptSupervisor");
        let registry = Arc::new(Registry::new());
        let lifecycle = LifecycleManager::new(
            Arc::clone(&registry),
            config.clone(),
            gate,
            resolver,
            signaler,
        );
        let query = QueryService::new(registry, &config);

        Self {
            config,
            lifecycle,
            query,
        }
    }

    /// The settings this supervisor was built with
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Launch a script and register a server record for it
    ///
    /// The script must exist and the working directory must be a directory;
    /// the permission gate is then asked to approve the launch. A failed or
    /// denied start never leaves a record behind.
    ///
    /// # Returns
    ///
    /// A [`StartedServer`] carrying the issued ID, display name, OS pid,
    /// resolved command line, and working directory.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self, request), fields(script = %request.script_path.display()))]
    pub async fn start_server(&self, request: StartRequest) -> Result<StartedServer> {
        self.lifecycle.start_server(request).await
    }

    /// Stop a supervised server, gracefully unless `force` is set
    ///
    /// Graceful stops send a termination signal and wait up to the
    /// configured stop timeout; if the process ignores it, the permission
    /// gate is offered an escalation to a forced kill. Forced stops send
    /// the kill signal directly. Every path reports a [`StopOutcome`]
    /// explaining what happened and what to try next.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn stop_server(&self, id: ServerId, force: bool) -> Result<StopOutcome> {
        self.lifecycle.stop_server(id, force).await
    }

    /// List all supervised servers, ordered by start time
    ///
    /// With `include_logs` set, each summary carries a short tail of recent
    /// output. An empty registry yields [`Listing::NoServers`] so callers
    /// can print a meaningful message instead of an empty table.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub fn list_servers(&self, include_logs: bool) -> Result<Listing> {
        tracing::debug!("Listing supervised servers");
        self.query.list_all(include_logs)
    }

    /// Detail view of one server
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub fn server_detail(&self, id: ServerId, include_logs: bool) -> Result<ServerDetail> {
        tracing::debug!("Fetching server detail");
        self.query.get_one(id, include_logs)
    }

    /// Filtered query over one server's buffered logs
    ///
    /// Entries are narrowed by origin stream and case-insensitive substring
    /// first; the most recent `filter.limit` matches are returned along
    /// with shown-versus-total counts.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self, filter), fields(server_id = %id))]
    pub fn server_logs(&self, id: ServerId, filter: &LogFilter) -> Result<LogView> {
        tracing::debug!("Querying server logs");
        self.query.server_logs(id, filter)
    }

    /// Tear down the supervisor
    ///
    /// Cancels stream observers and pending retention timers, kills any
    /// process that is still running, and drains the registry.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub fn shutdown(&self) -> Result<()> {
        self.lifecycle.shutdown_all()
    }
}

impl Default for ScriptSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}
