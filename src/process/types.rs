//! Process execution result types

use serde::{Deserialize, Serialize};

/// Marker appended to stderr when a run exceeds its deadline
pub const TIMEOUT_MARKER: &str = "command timed out";

/// Marker appended to stderr when a run is cancelled by shutdown
pub const CANCELLED_MARKER: &str = "command cancelled";

/// Exit code reported when no real exit status exists
pub const NO_EXIT_CODE: i32 = -1;

/// How a process invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The process exited on its own (any exit status)
    Exited,
    /// The process could not be started
    SpawnFailed,
    /// The process was killed after its deadline
    TimedOut,
    /// The process was killed because the runner shut down
    Cancelled,
}

/// Outcome of a single process invocation
///
/// Produced exactly once per call to
/// [`ProcessRunner::execute`](super::ProcessRunner::execute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// `true` iff the process exited with status 0
    pub succeeded: bool,
    /// Trimmed standard output
    pub stdout: String,
    /// Trimmed standard error (plus a marker on forced termination)
    pub stderr: String,
    /// Real exit status, or `-1` for spawn failure / forced kill
    pub exit_code: i32,
    /// Milliseconds from spawn to exit
    pub elapsed_ms: u64,
    /// How the run ended
    pub termination: Termination,
}

impl CommandResult {
    /// Result for a process that could not be spawned
    pub(crate) fn spawn_failed(reason: String, elapsed_ms: u64) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: reason,
            exit_code: NO_EXIT_CODE,
            elapsed_ms,
            termination: Termination::SpawnFailed,
        }
    }

    /// Result for a process that exited by itself
    pub(crate) fn exited(code: Option<i32>, stdout: &[u8], stderr: &[u8], elapsed_ms: u64) -> Self {
        let exit_code = code.unwrap_or(NO_EXIT_CODE);
        Self {
            succeeded: exit_code == 0,
            stdout: decode(stdout),
            stderr: decode(stderr),
            exit_code,
            elapsed_ms,
            termination: Termination::Exited,
        }
    }

    /// Result for a process the runner had to kill
    pub(crate) fn killed(
        termination: Termination,
        marker: &str,
        stdout: &[u8],
        stderr: &[u8],
        elapsed_ms: u64,
    ) -> Self {
        let mut stderr = decode(stderr);
        if !stderr.is_empty() {
            stderr.push('\n');
        }
        stderr.push_str(marker);
        Self {
            succeeded: false,
            stdout: decode(stdout),
            stderr,
            exit_code: NO_EXIT_CODE,
            elapsed_ms,
            termination,
        }
    }

    /// Whether the run hit its deadline
    pub fn timed_out(&self) -> bool {
        self.termination == Termination::TimedOut
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
