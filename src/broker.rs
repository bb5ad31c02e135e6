//! Request orchestration
//!
//! `Broker::dispatch` drives one request through lookup, validation,
//! admission, execution, and audit, and always returns a well-formed
//! `ToolResult` — a single request can never crash or wedge the broker.
//! The broker also owns lifecycle: shutdown stops admission, gives
//! in-flight executions a grace period, then force-cancels the rest.

use crate::config::BrokerConfig;
use crate::errors::ErrorKind;
use crate::tools::audit::{AuditLogger, Outcome};
use crate::tools::executor::{ExecOutcome, ProcessExecutor};
use crate::tools::limiter::ConcurrencyLimiter;
use crate::tools::registry::ToolRegistry;
use crate::tools::resolver;
use crate::tools::types::{ToolRequest, ToolResult, EXIT_CANCELED};
use crate::tools::validate::{self, TargetPolicy};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

/// The outward-facing dispatch loop over the tool pipeline.
pub struct Broker {
    registry: ToolRegistry,
    limiter: ConcurrencyLimiter,
    executor: ProcessExecutor,
    audit: AuditLogger,
    policy: TargetPolicy,
    default_timeout: Duration,
    accepting: AtomicBool,
    in_flight: AtomicUsize,
    cancel: watch::Sender<bool>,
}

impl Broker {
    pub fn new(registry: ToolRegistry, config: &BrokerConfig, audit: AuditLogger) -> Self {
        let limiter = ConcurrencyLimiter::for_registry(&registry, config.default_concurrency);
        let executor =
            ProcessExecutor::new(config.stdout_limit_bytes, config.stderr_limit_bytes);
        let (cancel, _) = watch::channel(false);
        Self {
            registry,
            limiter,
            executor,
            audit,
            policy: config.target_policy(),
            default_timeout: config.default_timeout(),
            accepting: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
            cancel,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Drive one request to a terminal, audited result.
    pub async fn dispatch(&self, tool_name: &str, request: &ToolRequest) -> ToolResult {
        let start = Instant::now();

        if !self.accepting.load(Ordering::SeqCst) {
            return self.reject(
                tool_name,
                request,
                ErrorKind::ExecutionError,
                "broker is shutting down".to_string(),
                start,
            );
        }

        let descriptor = match self.registry.lookup(tool_name) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                return self.reject(tool_name, request, e.kind(), e.to_string(), start);
            }
        };

        let command = match validate::validate(&descriptor, request, &self.policy) {
            Ok(command) => command,
            Err(e) => {
                return self.reject(tool_name, request, e.kind(), e.to_string(), start);
            }
        };

        let program = match resolver::resolve(&command.program) {
            Ok(program) => program,
            Err(e) => {
                let audit_id =
                    self.audit
                        .record(tool_name, request, Outcome::NotFound, Some(127), false);
                let mut result = ToolResult::not_found(e.to_string());
                result.audit_id = audit_id;
                result.duration_ms = start.elapsed().as_millis() as u64;
                return result;
            }
        };

        if request.dry_run {
            let audit_id = self
                .audit
                .record(tool_name, request, Outcome::DryRun, Some(0), false);
            let mut resolved = command.clone();
            resolved.program = program.display().to_string();
            let mut result = ToolResult::dry_run(resolved.display_line());
            result.audit_id = audit_id;
            result.duration_ms = start.elapsed().as_millis() as u64;
            return result;
        }

        let timeout = request.timeout_override.unwrap_or(descriptor.default_timeout);

        let _guard = InFlightGuard::enter(&self.in_flight);
        let outcome = {
            // Slot held for the whole execution, released on every path
            let _permit = self.limiter.acquire(&descriptor.logical_name).await;
            info!(tool = %descriptor.logical_name, target = %request.target, "executing");
            self.executor
                .execute(&program, &command, timeout, self.cancel.subscribe())
                .await
        };

        let tag = outcome_tag(&outcome);
        let audit_id =
            self.audit
                .record(tool_name, request, tag, Some(outcome.return_code), outcome.timed_out);

        ToolResult {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            return_code: outcome.return_code,
            truncated_stdout: outcome.truncated_stdout,
            truncated_stderr: outcome.truncated_stderr,
            timed_out: outcome.timed_out,
            error_kind: outcome.error_kind,
            audit_id,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Stop admission, wait up to `grace` for in-flight executions,
    /// then force-cancel whatever remains.
    pub async fn shutdown(&self, grace: Duration) {
        info!("shutdown requested, draining in-flight executions");
        self.accepting.store(false, Ordering::SeqCst);

        if tokio::time::timeout(grace, self.wait_idle()).await.is_err() {
            warn!("grace period expired, force-canceling remaining executions");
            let _ = self.cancel.send(true);
            // Killed process groups unwind promptly; bound the tail wait
            let _ = tokio::time::timeout(Duration::from_secs(5), self.wait_idle()).await;
        }
        info!("shutdown complete");
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    fn reject(
        &self,
        tool_name: &str,
        request: &ToolRequest,
        kind: ErrorKind,
        message: String,
        start: Instant,
    ) -> ToolResult {
        let mut result = ToolResult::rejected(kind, message);
        result.audit_id = self.audit.record(
            tool_name,
            request,
            Outcome::Rejected,
            Some(result.return_code),
            false,
        );
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }
}

fn outcome_tag(outcome: &ExecOutcome) -> Outcome {
    if outcome.timed_out {
        Outcome::TimedOut
    } else if outcome.return_code == EXIT_CANCELED {
        Outcome::Canceled
    } else if outcome.error_kind.is_some() {
        Outcome::Failed
    } else {
        Outcome::Completed
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
