/// Error handling module for the script supervisor.
///
/// This module defines the error types used throughout the library.
/// It provides a comprehensive set of errors that can occur when
/// launching and supervising script processes, along with helpful
/// context for debugging.
///
/// # Example
///
/// ```
/// use script_supervisor::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::ServerNotFound(id)) => println!("No server with ID '{}'", id),
///         Err(Error::ScriptMissing(path)) => println!("Script '{}' does not exist", path),
///         Err(Error::PermissionDenied(msg)) => println!("Denied: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the script-supervisor library.
///
/// This enum represents all possible error types that can be returned from
/// operations in the supervisor. Each variant includes context information
/// to help diagnose and handle the error appropriately.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The configuration JSON is malformed
    /// - Required fields are missing
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is valid JSON but contains invalid values.
    ///
    /// This error occurs when:
    /// - A buffer capacity or tail length is zero
    /// - A timeout or retention period is zero
    /// - The configured interpreter name is empty
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// No supervised server matches the given identifier.
    ///
    /// This error occurs when:
    /// - A server ID is passed that was never issued
    /// - The server's retention period elapsed and its record was removed
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// The script file to launch does not exist.
    ///
    /// This error occurs when:
    /// - The script path points to a file that is absent
    /// - The script path points to a directory
    #[error("Script not found: {0}")]
    ScriptMissing(String),

    /// The user declined to approve an operation.
    ///
    /// This error occurs when:
    /// - Approval to launch a script is denied
    /// - Approval to signal a running process is denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The operating system failed to launch the process.
    ///
    /// This error occurs when:
    /// - The interpreter binary is missing or not executable
    /// - The working directory does not exist
    /// - Process creation fails at the OS level
    #[error("Failed to spawn process: {0}")]
    SpawnFailure(String),

    /// The requested interpreter version could not be resolved.
    ///
    /// This error occurs when:
    /// - A version selector names an interpreter that is not installed
    /// - The resolver cannot determine a default interpreter
    #[error("Failed to resolve interpreter: {0}")]
    ResolutionFailure(String),

    /// Error in the bookkeeping for a supervised process.
    ///
    /// This error occurs when:
    /// - Signalling the process fails at the OS level
    /// - The process state cannot be recorded
    #[error("Server process error: {0}")]
    Process(String),

    /// Any other error not covered by the above categories.
    ///
    /// This is a catch-all error for cases not explicitly handled elsewhere.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for script-supervisor operations.
///
/// This is a convenience type alias for `std::result::Result` with the `Error` type
/// from this module. Use this throughout the library and in client code to handle
/// errors in a consistent way.
pub type Result<T> = std::result::Result<T, Error>;
