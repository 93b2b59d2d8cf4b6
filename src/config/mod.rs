//! Configuration module for the script supervisor.
//!
//! This module handles parsing, validation, and access to the supervisor's
//! settings: the default interpreter, log buffer capacity, retention window
//! for exited servers, and stop-timeout behavior. Settings can be loaded
//! from JSON files or strings, and every field has a sensible default.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use script_supervisor::config::SupervisorConfig;
//!
//! let config = SupervisorConfig::from_file("supervisor.json").unwrap();
//! println!("Stop timeout: {:?}", config.stop_timeout());
//! ```
//!
//! Creating a configuration programmatically:
//! ```
//! use script_supervisor::{ScriptSupervisor, config::SupervisorConfig};
//!
//! let config = SupervisorConfig {
//!     interpreter: "python3".to_string(),
//!     log_buffer_cap: 200,
//!     ..SupervisorConfig::default()
//! };
//! let supervisor = ScriptSupervisor::new(config);
//! ```
mod parser;
pub mod validator;

pub use parser::SupervisorConfig;
pub use validator::validate_config;
