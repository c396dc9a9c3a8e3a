/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::{Pid, Priority};
use crate::process::types::ProcessState;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Priority {priority} out of range (max {max})")]
    #[diagnostic(
        code(scheduler::invalid_priority),
        help("Query max_priority() for the range supported by the installed priority pattern.")
    )]
    InvalidPriority { priority: Priority, max: Priority },

    #[error("Ready queue for priority {priority} is full")]
    #[diagnostic(
        code(scheduler::queue_full),
        help("The system is overloaded at this priority. Retry later or raise queue_capacity.")
    )]
    QueueFull { priority: Priority },

    #[error("Scheduler has not been initialized")]
    #[diagnostic(
        code(scheduler::not_initialized),
        help("Call set_initialized() before start().")
    )]
    NotInitialized,

    #[error("Scheduler has not been started")]
    #[diagnostic(
        code(scheduler::not_started),
        help("Dispatching operations are only valid after start().")
    )]
    NotStarted,

    #[error("Scheduler already started")]
    #[diagnostic(code(scheduler::already_started))]
    AlreadyStarted,

    #[error("Process {pid} is in state {state:?}")]
    #[diagnostic(
        code(scheduler::invalid_state),
        help("Operation cannot be performed in the current process state.")
    )]
    InvalidState { pid: Pid, state: ProcessState },

    #[error("Operation not permitted on the idle process")]
    #[diagnostic(
        code(scheduler::idle_process),
        help("The idle process is never queued and never terminated.")
    )]
    IdleProcess,

    #[error("A global scheduler instance is already installed")]
    #[diagnostic(code(scheduler::already_installed))]
    AlreadyInstalled,
}

/// Scheduler operation result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Invalid configuration. Review configuration parameters.")
    )]
    Configuration(String),

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(kernel::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(String),
}

impl From<String> for KernelError {
    fn from(msg: String) -> Self {
        KernelError::Internal(msg)
    }
}

impl From<&str> for KernelError {
    fn from(msg: &str) -> Self {
        KernelError::Internal(msg.to_string())
    }
}
