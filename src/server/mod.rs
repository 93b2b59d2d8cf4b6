//! Server supervision module.
//!
//! This module holds the core of the supervisor: the record registry, the
//! lifecycle manager that starts and stops script processes, the bounded
//! per-server log buffers, and the read-only query service used for
//! listings. All state lives in explicitly constructed instances, so two
//! supervisors in one process never share a registry.
//!
//! # Components
//!
//! * `lifecycle` - Starting, stopping, and expiring supervised processes
//! * `logs` - Bounded, queryable output buffers
//! * `process` - Identifiers, signals, and spawn plumbing
//! * `query` - Read-only listing and detail projections
//! * `registry` - Concurrency-safe id-to-record store
//!
//! # Examples
//!
//! Describing a script to launch:
//!
//! ```
//! use script_supervisor::server::StartRequest;
//!
//! let mut request = StartRequest::new("server.js", "/srv/app");
//! request.name = Some("api".to_string());
//! request.script_args = vec!["--port".to_string(), "3000".to_string()];
//! ```
//!
//! Querying buffered output:
//!
//! ```
//! use script_supervisor::server::{LogBuffer, LogEntry, LogFilter, LogStream, StreamFilter};
//!
//! let mut buffer = LogBuffer::new(1000);
//! buffer.append(LogEntry::new(LogStream::Stderr, "Error: connection refused"));
//!
//! let filter = LogFilter {
//!     streams: StreamFilter::StderrOnly,
//!     contains: Some("error".to_string()),
//!     ..LogFilter::default()
//! };
//! assert_eq!(buffer.query(&filter).shown, 1);
//! ```
pub mod lifecycle;
mod logs;
mod process;
mod query;
mod registry;

pub use lifecycle::{LifecycleManager, StartRequest, StartedServer, StopOutcome};
pub use logs::{LogBuffer, LogEntry, LogFilter, LogStream, LogView, StreamFilter};
pub use process::{ProcessSignaler, ServerId, ServerStatus, StopSignal, UnixProcessSignaler};
pub use query::{Listing, QueryService, ServerDetail, ServerSummary};
pub use registry::{ExitInfo, Registry, ServerRecord};
