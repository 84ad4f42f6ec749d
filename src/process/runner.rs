//! Bounded execution of external programs
//!
//! A run is a single `tokio::select!` between three futures: the combined
//! "drain stdout + drain stderr + wait" future, the deadline, and the
//! runner's shutdown token. Whichever resolves first decides the one
//! [`CommandResult`] of the call. On the deadline and shutdown paths the
//! child's process group is killed and the child is reaped before
//! returning.

use super::types::{CommandResult, Termination, CANCELLED_MARKER, TIMEOUT_MARKER};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// Read chunk size for output pipes
const READ_CHUNK: usize = 8 * 1024;

/// Spawns external programs under a deadline
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Cancelled on server shutdown; kills every in-flight child
    shutdown: CancellationToken,
}

impl ProcessRunner {
    /// Create a runner with its own shutdown token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner that stops its children when `shutdown` is cancelled
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    /// Run `program` with `args` in `working_dir`, bounded by `timeout`.
    ///
    /// Never fails: spawn errors, non-zero exits, timeouts and shutdown
    /// are all encoded in the returned [`CommandResult`].
    pub async fn execute(
        &self,
        program: &Path,
        args: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> CommandResult {
        let started = Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    program = %program.display(),
                    error = %e,
                    "Failed to spawn process"
                );
                return CommandResult::spawn_failed(e.to_string(), elapsed_ms(started));
            }
        };

        tracing::debug!(
            program = %program.display(),
            pid = ?child.id(),
            timeout_ms = timeout.as_millis() as u64,
            "Spawned process"
        );

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let outcome = {
            let completion = async {
                let (_, _, status) = tokio::join!(
                    drain(stdout_pipe.as_mut(), &mut stdout),
                    drain(stderr_pipe.as_mut(), &mut stderr),
                    child.wait(),
                );
                status
            };

            tokio::select! {
                status = completion => Ok(status),
                () = tokio::time::sleep(timeout) => Err(Termination::TimedOut),
                () = self.shutdown.cancelled() => Err(Termination::Cancelled),
            }
        };

        match outcome {
            Ok(Ok(status)) => {
                let result =
                    CommandResult::exited(status.code(), &stdout, &stderr, elapsed_ms(started));
                tracing::debug!(
                    program = %program.display(),
                    exit_code = result.exit_code,
                    elapsed_ms = result.elapsed_ms,
                    "Process exited"
                );
                result
            }
            Ok(Err(e)) => {
                // wait() itself failed; make sure nothing is left behind
                terminate(&mut child).await;
                CommandResult::killed(
                    Termination::Exited,
                    &format!("failed to wait for process: {e}"),
                    &stdout,
                    &stderr,
                    elapsed_ms(started),
                )
            }
            Err(termination) => {
                terminate(&mut child).await;
                let marker = match termination {
                    Termination::TimedOut => {
                        format!("{} after {}ms", TIMEOUT_MARKER, timeout.as_millis())
                    }
                    _ => CANCELLED_MARKER.to_string(),
                };
                tracing::warn!(
                    program = %program.display(),
                    termination = ?termination,
                    "Process terminated"
                );
                CommandResult::killed(termination, &marker, &stdout, &stderr, elapsed_ms(started))
            }
        }
    }
}

/// Append everything readable from `pipe` into `buf`.
///
/// Chunks are appended as they arrive, so a caller that drops this future
/// keeps whatever was read so far.
async fn drain<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>)
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                tracing::debug!(error = %e, "Output pipe read failed");
                break;
            }
        }
    }
}

/// Kill the child (and its process group on Unix) and reap it
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child leads its own group (process_group(0)), so pgid == pid.
        // SAFETY: killpg has no memory-safety preconditions.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            tracing::debug!(
                pid = pid,
                error = %std::io::Error::last_os_error(),
                "killpg failed"
            );
        }
    }

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Child kill/reap failed");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
