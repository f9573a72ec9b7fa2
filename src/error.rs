//! Error types used by the pipevisor runtime.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`]: a malformed argument vector, rejected at construction.
//! - [`SupervisorError`]: faults raised by the supervisor handle (spawn failures,
//!   writes to a process that is not running, a shut-down actor).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! A process that launched and later exited is **not** an error here: those exits
//! are classified by the watchdog and delivered as [`LifecycleEvent`](crate::LifecycleEvent)s.

use thiserror::Error;

/// # Errors produced while building a supervisor.
///
/// Fatal and surfaced synchronously: no process is ever spawned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The argument vector is too short to describe a transcoding job.
    #[error("invalid argument vector: expected at least {min} parameters, got {len}")]
    InvalidParams {
        /// Number of parameters supplied.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pipevisor::ConfigError;
    ///
    /// let err = ConfigError::InvalidParams { len: 1, min: 3 };
    /// assert_eq!(err.as_label(), "config_invalid_params");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidParams { .. } => "config_invalid_params",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::InvalidParams { len, min } => {
                format!("params: {len} given, {min} required")
            }
        }
    }
}

/// # Errors produced by the supervisor handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Construction-time configuration fault.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The external program could not be launched at all (missing, not executable).
    ///
    /// Never retried by the watchdog.
    #[error("unable to start `{program}`: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// No process is currently live.
    #[error("process is not running")]
    NotRunning,

    /// The input channel of the live process no longer accepts writes.
    #[error("input channel closed")]
    InputClosed,

    /// The supervisor actor has terminated (all handles dropped or runtime shut down).
    #[error("supervisor actor stopped")]
    Stopped,
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pipevisor::SupervisorError;
    ///
    /// assert_eq!(SupervisorError::NotRunning.as_label(), "supervisor_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::Config(e) => e.as_label(),
            SupervisorError::Spawn { .. } => "supervisor_spawn_failed",
            SupervisorError::NotRunning => "supervisor_not_running",
            SupervisorError::InputClosed => "supervisor_input_closed",
            SupervisorError::Stopped => "supervisor_stopped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SupervisorError::Config(e) => e.as_message(),
            SupervisorError::Spawn { program, source } => {
                format!("spawn {program}: {source}")
            }
            SupervisorError::NotRunning => "not running".to_string(),
            SupervisorError::InputClosed => "input closed".to_string(),
            SupervisorError::Stopped => "actor stopped".to_string(),
        }
    }

    /// Indicates whether the fault ends supervision for good.
    ///
    /// Configuration and spawn faults are launch-time problems the watchdog
    /// never retries.
    ///
    /// # Example
    /// ```
    /// use pipevisor::{ConfigError, SupervisorError};
    ///
    /// let fatal = SupervisorError::from(ConfigError::InvalidParams { len: 0, min: 3 });
    /// assert!(fatal.is_fatal());
    /// assert!(!SupervisorError::NotRunning.is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SupervisorError::Config(_) | SupervisorError::Spawn { .. }
        )
    }
}
