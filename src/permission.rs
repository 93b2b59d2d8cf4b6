//! Approval gate consulted before the supervisor acts on a process.
//!
//! Starting a script and signalling a running process are both gated on an
//! external approval decision. The supervisor describes the action in plain
//! text and the gate answers yes or no; a denial aborts the operation with
//! no partial effect.
//!
//! # Examples
//!
//! ```
//! use script_supervisor::permission::{AllowAll, PermissionGate};
//!
//! # async fn example() -> script_supervisor::error::Result<()> {
//! let gate = AllowAll;
//! assert!(gate.request_approval("Start server.js").await?);
//! # Ok(())
//! # }
//! ```
use crate::error::Result;
use async_trait::async_trait;

/// Decides whether a described supervisor action may proceed.
///
/// Implementations typically prompt a human or consult a policy. The
/// supervisor treats `Ok(false)` as a hard denial: the operation is
/// abandoned and nothing is spawned or signalled.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Requests approval for the action described by `description`.
    ///
    /// # Arguments
    ///
    /// * `description` - Human-readable summary of the action, e.g.
    ///   `"Start script server.js in /srv/app"`
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the action is approved, `Ok(false)` if it is denied,
    /// or an error if the decision itself could not be obtained.
    async fn request_approval(&self, description: &str) -> Result<bool>;
}

/// Gate that approves every request.
///
/// Useful for unattended operation and as the default when no interactive
/// gate is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl PermissionGate for AllowAll {
    async fn request_approval(&self, _description: &str) -> Result<bool> {
        Ok(true)
    }
}
