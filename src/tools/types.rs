//! Core value types for tool invocation
//!
//! `ToolRequest` is what the calling agent hands us, `SanitizedCommand`
//! is what validation produces, and `ToolResult` is what every dispatch
//! returns — success, rejection, or framework failure alike.

use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reserved exit code: rejected by validation or unknown tool
pub const EXIT_REJECTED: i32 = 64;
/// Reserved exit code: execution timed out, process killed
pub const EXIT_TIMED_OUT: i32 = 124;
/// Reserved exit code: canceled by broker shutdown
pub const EXIT_CANCELED: i32 = 125;
/// Reserved exit code: OS-level spawn failure
pub const EXIT_SPAWN_FAILED: i32 = 126;
/// Reserved exit code: executable not found on PATH
pub const EXIT_NOT_FOUND: i32 = 127;

/// A single invocation request from the calling agent.
///
/// Immutable after construction: the validator builds a new
/// `SanitizedCommand` rather than editing fields in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Scan target: IPv4 address, IPv4 CIDR, hostname, or URL
    pub target: String,

    /// Raw, unparsed extra arguments (shell-word syntax, never a shell)
    #[serde(default)]
    pub extra_arguments: String,

    /// Per-request timeout override
    #[serde(default)]
    pub timeout_override: Option<Duration>,

    /// Validate and resolve only; do not spawn
    #[serde(default)]
    pub dry_run: bool,
}

impl ToolRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            extra_arguments: String::new(),
            timeout_override: None,
            dry_run: false,
        }
    }

    pub fn with_arguments(mut self, args: impl Into<String>) -> Self {
        self.extra_arguments = args.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// The validated, fully assembled argument vector.
///
/// This is the only thing the executor will spawn; `argv` elements are
/// passed discretely and never joined into a shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedCommand {
    /// Executable name (resolved to a path just before spawn)
    pub program: String,

    /// mandatory prefix args, then sanitized extra tokens, then target
    pub argv: Vec<String>,
}

impl SanitizedCommand {
    /// Human-readable rendering for dry runs and audit lines.
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.argv.len() + 1);
        parts.push(self.program.clone());
        parts.extend(self.argv.iter().cloned());
        parts.join(" ")
    }
}

/// Result of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Captured stdout, possibly truncated at the byte ceiling
    pub stdout: String,

    /// Captured stderr, possibly truncated at the byte ceiling
    pub stderr: String,

    /// Tool exit code, or a reserved framework sentinel
    pub return_code: i32,

    /// stdout hit its byte ceiling
    pub truncated_stdout: bool,

    /// stderr hit its byte ceiling
    pub truncated_stderr: bool,

    /// Deadline expired and the process was force-killed
    pub timed_out: bool,

    /// Set iff `return_code` is a framework sentinel
    pub error_kind: Option<ErrorKind>,

    /// Identifier of the audit record written for this invocation
    pub audit_id: String,

    /// Wall-clock duration of the dispatch in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Rejection before any process was spawned.
    pub fn rejected(kind: ErrorKind, message: String) -> Self {
        Self {
            stdout: String::new(),
            stderr: message,
            return_code: EXIT_REJECTED,
            truncated_stdout: false,
            truncated_stderr: false,
            timed_out: false,
            error_kind: Some(kind),
            audit_id: String::new(),
            duration_ms: 0,
        }
    }

    /// Resolver failure: the executable is not on PATH.
    pub fn not_found(message: String) -> Self {
        Self {
            return_code: EXIT_NOT_FOUND,
            error_kind: Some(ErrorKind::NotFound),
            ..Self::rejected(ErrorKind::NotFound, message)
        }
    }

    /// Dry-run short circuit: the command that would have run.
    pub fn dry_run(command_line: String) -> Self {
        Self {
            stdout: command_line,
            stderr: String::new(),
            return_code: 0,
            truncated_stdout: false,
            truncated_stderr: false,
            timed_out: false,
            error_kind: None,
            audit_id: String::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.return_code == 0 && self.error_kind.is_none()
    }
}
