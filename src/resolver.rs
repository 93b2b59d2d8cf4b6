//! Interpreter resolution for launched scripts.
//!
//! A script is always run through an interpreter binary. Which binary that
//! is may depend on an optional version selector supplied by the caller
//! (for example a version-manager alias). Resolution is delegated to an
//! external collaborator so the supervisor itself never shells out to
//! version managers.
//!
//! # Examples
//!
//! ```
//! use script_supervisor::resolver::{FixedInterpreter, InterpreterResolver};
//!
//! # async fn example() -> script_supervisor::error::Result<()> {
//! let resolver = FixedInterpreter::new("/usr/bin/node");
//! let path = resolver.resolve(None).await?;
//! assert_eq!(path.to_str(), Some("/usr/bin/node"));
//! # Ok(())
//! # }
//! ```
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Maps an optional version selector to a concrete interpreter executable.
///
/// Implementations may consult version managers or search the PATH, and may
/// suspend while doing so. A selector that cannot be satisfied fails with
/// [`Error::ResolutionFailure`].
#[async_trait]
pub trait InterpreterResolver: Send + Sync {
    /// Resolves `selector` to an executable path.
    ///
    /// # Arguments
    ///
    /// * `selector` - Optional version selector; `None` asks for the
    ///   resolver's default interpreter
    async fn resolve(&self, selector: Option<&str>) -> Result<PathBuf>;
}

/// Resolver that always answers with one fixed interpreter path.
///
/// This is the default resolver. It satisfies requests without a selector
/// and rejects any selector, since it has no version registry to consult.
#[derive(Debug, Clone)]
pub struct FixedInterpreter {
    path: PathBuf,
}

impl FixedInterpreter {
    /// Creates a resolver that always returns `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InterpreterResolver for FixedInterpreter {
    async fn resolve(&self, selector: Option<&str>) -> Result<PathBuf> {
        match selector {
            None => Ok(self.path.clone()),
            Some(sel) => Err(Error::ResolutionFailure(format!(
                "No interpreter registered for selector '{}'",
                sel
            ))),
        }
    }
}
