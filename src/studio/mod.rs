//! Studio module: the QQL image-generation API
//!
//! Wraps `qql-cli` behind REST endpoints: probe the CLI, render a seed,
//! save a render, stream and list artifacts.

pub mod handler;
pub mod service;
pub mod types;

pub use handler::{internal_error, studio_router, StudioState, INTERNAL_ERROR};
pub use service::Studio;
