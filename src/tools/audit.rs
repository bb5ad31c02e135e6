//! Audit logging
//!
//! Every invocation attempt — completed, rejected, timed out, failed —
//! produces exactly one append-only JSON line with secrets masked.
//! Denied attempts are recorded with the same machinery as successes:
//! this is a security log, not just an operations log.

use crate::tools::types::ToolRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

/// Argument keys whose values are masked before serialization
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "token",
    "secret",
    "hash",
    "key",
    "credential",
    "auth",
];

/// Terminal state of a dispatch, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Rejected,
    NotFound,
    TimedOut,
    Canceled,
    Failed,
    DryRun,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
            Self::TimedOut => "timed_out",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
            Self::DryRun => "dry_run",
        }
    }
}

/// One write-once audit line.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    pub logical_name: String,
    pub target: String,
    pub arguments: String,
    pub outcome: &'static str,
    pub return_code: Option<i32>,
    pub timed_out: bool,
}

/// Append-only audit sink.
pub struct AuditLogger {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl AuditLogger {
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(writer),
        }
    }

    /// Append to a log file, creating it if absent.
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn to_stderr() -> Self {
        Self::from_writer(Box::new(std::io::stderr()))
    }

    /// Record one invocation attempt and return its audit id.
    pub fn record(
        &self,
        logical_name: &str,
        request: &ToolRequest,
        outcome: Outcome,
        return_code: Option<i32>,
        timed_out: bool,
    ) -> String {
        let record = AuditRecord {
            audit_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            logical_name: logical_name.to_string(),
            target: request.target.clone(),
            arguments: mask_arguments(&request.extra_arguments),
            outcome: outcome.as_str(),
            return_code,
            timed_out,
        };

        info!(
            audit_id = %record.audit_id,
            tool = %record.logical_name,
            outcome = record.outcome,
            "audit"
        );

        match serde_json::to_string(&record) {
            Ok(line) => {
                let mut sink = self.sink.lock().expect("audit sink poisoned");
                if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
                    error!(error = %e, "failed to append audit record");
                }
            }
            Err(e) => error!(error = %e, "failed to serialize audit record"),
        }

        record.audit_id
    }
}

fn is_sensitive(token: &str) -> bool {
    let lowered = token.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lowered.contains(p))
}

/// Mask secret-bearing values in a raw argument string.
///
/// Handles both `--password=hunter2` tokens and `--password hunter2`
/// pairs. Unparsable input is masked wholesale rather than leaked.
pub fn mask_arguments(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let tokens = match shlex::split(raw) {
        Some(tokens) => tokens,
        None => return "***".to_string(),
    };

    let mut masked = Vec::with_capacity(tokens.len());
    let mut mask_next = false;
    for token in tokens {
        if mask_next {
            masked.push("***".to_string());
            mask_next = false;
            continue;
        }
        if let Some((key, _value)) = token.split_once('=') {
            if is_sensitive(key) {
                masked.push(format!("{}=***", key));
                continue;
            }
        } else if token.starts_with('-') && is_sensitive(&token) {
            mask_next = true;
        }
        masked.push(token);
    }
    masked.join(" ")
}
