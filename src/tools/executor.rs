//! Bounded subprocess execution
//!
//! The executor only ever spawns an argument vector — there is no code
//! path that joins strings into a shell command line, so even a
//! validator bug cannot become shell injection. Output capture is
//! capped per stream, the environment is scrubbed, and a deadline or a
//! broker shutdown kills the whole process group.

use crate::errors::ErrorKind;
use crate::tools::types::{SanitizedCommand, EXIT_CANCELED, EXIT_SPAWN_FAILED, EXIT_TIMED_OUT};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// PATH handed to spawned tools in place of the ambient environment
pub const SAFE_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Raw outcome of one process execution, before audit enrichment.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub truncated_stdout: bool,
    pub truncated_stderr: bool,
    pub timed_out: bool,
    pub error_kind: Option<ErrorKind>,
}

/// Process executor with per-stream byte ceilings.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// stdout ceiling; larger, since scanners are stdout-verbose
    stdout_limit: usize,

    /// stderr ceiling
    stderr_limit: usize,
}

impl ProcessExecutor {
    pub fn new(stdout_limit: usize, stderr_limit: usize) -> Self {
        Self {
            stdout_limit,
            stderr_limit,
        }
    }

    /// Run a resolved command to completion, deadline, or cancellation.
    ///
    /// `program` is the resolved executable path; `command.argv` is
    /// passed element-by-element. The spawned process gets a minimal
    /// environment and its own process group so a kill reaps any
    /// descendants it forked.
    pub async fn execute(
        &self,
        program: &Path,
        command: &SanitizedCommand,
        timeout: Duration,
        mut cancel: watch::Receiver<bool>,
    ) -> ExecOutcome {
        let mut cmd = Command::new(program);
        cmd.args(&command.argv)
            .env_clear()
            .env("PATH", SAFE_PATH)
            .env("LANG", "C")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program.display(), error = %e, "spawn failed");
                return ExecOutcome {
                    return_code: EXIT_SPAWN_FAILED,
                    stdout: String::new(),
                    stderr: format!("spawn failed: {}", e),
                    truncated_stdout: false,
                    truncated_stderr: false,
                    timed_out: false,
                    error_kind: Some(ErrorKind::ExecutionError),
                };
            }
        };

        // Readers drain the pipes for the lifetime of the process even
        // past the ceiling, so a verbose tool never blocks on a full
        // pipe buffer.
        let stdout_task = spawn_reader(child.stdout.take(), self.stdout_limit);
        let stderr_task = spawn_reader(child.stderr.take(), self.stderr_limit);

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(timeout) => None,
            _ = cancel_requested(&mut cancel) => {
                kill_process_group(&mut child).await;
                let (stdout, truncated_stdout) = join_reader(stdout_task).await;
                let (stderr, truncated_stderr) = join_reader(stderr_task).await;
                return ExecOutcome {
                    return_code: EXIT_CANCELED,
                    stdout,
                    stderr,
                    truncated_stdout,
                    truncated_stderr,
                    timed_out: false,
                    error_kind: Some(ErrorKind::ExecutionError),
                };
            }
        };

        match waited {
            Some(Ok(status)) => {
                let (stdout, truncated_stdout) = join_reader(stdout_task).await;
                let (stderr, truncated_stderr) = join_reader(stderr_task).await;
                let return_code = status.code().unwrap_or(-1);
                debug!(return_code, "tool exited");
                ExecOutcome {
                    return_code,
                    stdout,
                    stderr,
                    truncated_stdout,
                    truncated_stderr,
                    timed_out: false,
                    error_kind: None,
                }
            }
            Some(Err(e)) => {
                kill_process_group(&mut child).await;
                let (stdout, truncated_stdout) = join_reader(stdout_task).await;
                let (stderr, truncated_stderr) = join_reader(stderr_task).await;
                ExecOutcome {
                    return_code: EXIT_SPAWN_FAILED,
                    stdout,
                    stderr: format!("wait failed: {} ({})", e, stderr),
                    truncated_stdout,
                    truncated_stderr,
                    timed_out: false,
                    error_kind: Some(ErrorKind::ExecutionError),
                }
            }
            None => {
                warn!(timeout_secs = timeout.as_secs(), "deadline expired, killing process group");
                kill_process_group(&mut child).await;
                let (stdout, truncated_stdout) = join_reader(stdout_task).await;
                let (stderr, truncated_stderr) = join_reader(stderr_task).await;
                // Partial output is returned but flagged via timed_out
                ExecOutcome {
                    return_code: EXIT_TIMED_OUT,
                    stdout,
                    stderr,
                    truncated_stdout,
                    truncated_stderr,
                    timed_out: true,
                    error_kind: Some(ErrorKind::TimedOut),
                }
            }
        }
    }
}

/// Resolves once the cancel flag flips to true; pends forever if the
/// sender is dropped without canceling.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// SIGKILL the child's whole process group, then reap it.
async fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    let _ = child.kill().await;
    let _ = child.wait().await;
}

/// Read a pipe incrementally, accumulating at most `limit` bytes while
/// continuing to drain.
fn spawn_reader<R>(pipe: Option<R>, limit: usize) -> Option<JoinHandle<(Vec<u8>, bool)>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let mut reader = pipe?;
    Some(tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if buf.len() < limit {
                        let take = n.min(limit - buf.len());
                        buf.extend_from_slice(&chunk[..take]);
                        if take < n {
                            truncated = true;
                        }
                    } else {
                        truncated = true;
                    }
                }
            }
        }
        (buf, truncated)
    }))
}

async fn join_reader(task: Option<JoinHandle<(Vec<u8>, bool)>>) -> (String, bool) {
    match task {
        Some(handle) => match handle.await {
            Ok((mut bytes, truncated)) => {
                if truncated {
                    trim_incomplete_tail(&mut bytes);
                }
                (String::from_utf8_lossy(&bytes).into_owned(), truncated)
            }
            Err(_) => (String::new(), false),
        },
        None => (String::new(), false),
    }
}

/// A truncation cut can split a multibyte character; drop the partial
/// tail so the lossy decode does not turn it into a replacement char
/// and inflate the captured length past the ceiling.
fn trim_incomplete_tail(bytes: &mut Vec<u8>) {
    if let Err(e) = std::str::from_utf8(bytes) {
        // error_len() is None only for an unfinished sequence at the end
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
}
