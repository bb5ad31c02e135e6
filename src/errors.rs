//! Error types for the toolgate broker
//!
//! Every request-level failure is represented here so the orchestrator
//! can map it onto a structured `ToolResult` instead of letting it
//! escape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the broker
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Target is outside the authorized private ranges / lab domain
    #[error("Unauthorized target: {target}")]
    UnauthorizedTarget { target: String },

    /// An argument token failed the sanitizer
    #[error("Disallowed argument {token:?}: {reason}")]
    DisallowedArgument { token: String, reason: String },

    /// A flag token did not match the descriptor's allowed prefixes
    #[error("Disallowed flag: {flag}")]
    DisallowedFlag { flag: String },

    /// No descriptor registered under this logical name
    #[error("Tool not registered: {name}")]
    NotRegistered { name: String },

    /// Executable lookup failed on PATH
    #[error("Executable not found: {executable}")]
    NotFound { executable: String },

    /// Wall-clock deadline expired; the process was force-killed
    #[error("Execution timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    /// OS-level spawn or wait failure
    #[error("Execution error: {0}")]
    Execution(String),

    /// Malformed descriptor or configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (audit sink, config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Machine-readable outcome tag carried on `ToolResult.error_kind`.
///
/// Present if and only if the return code is a framework sentinel
/// rather than the wrapped tool's own exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnauthorizedTarget,
    DisallowedArgument,
    DisallowedFlag,
    NotRegistered,
    NotFound,
    TimedOut,
    ExecutionError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnauthorizedTarget => "unauthorized_target",
            Self::DisallowedArgument => "disallowed_argument",
            Self::DisallowedFlag => "disallowed_flag",
            Self::NotRegistered => "not_registered",
            Self::NotFound => "not_found",
            Self::TimedOut => "timed_out",
            Self::ExecutionError => "execution_error",
        }
    }
}

impl BrokerError {
    /// Map the error onto its result-level tag.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnauthorizedTarget { .. } => ErrorKind::UnauthorizedTarget,
            Self::DisallowedArgument { .. } => ErrorKind::DisallowedArgument,
            Self::DisallowedFlag { .. } => ErrorKind::DisallowedFlag,
            Self::NotRegistered { .. } => ErrorKind::NotRegistered,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::Execution(_) | Self::Config(_) | Self::Io(_) => ErrorKind::ExecutionError,
        }
    }
}
