//! External process execution
//!
//! [`ProcessRunner`] launches one child per call, captures its output,
//! enforces a wall-clock deadline and always reports a [`CommandResult`].

mod runner;
mod types;

pub use runner::ProcessRunner;
pub use types::{CommandResult, Termination, CANCELLED_MARKER, NO_EXIT_CODE, TIMEOUT_MARKER};
