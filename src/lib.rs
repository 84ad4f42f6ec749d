//! QQL Studio - HTTP front end for the qql-cli renderer
//!
//! Clients submit a seed, the server runs the external `qql-cli`
//! executable to render it into a PNG, and the result can then be
//! streamed, listed or saved under a new name.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      HTTP (axum)                          │
//! │   /api/status  /api/generate  /api/save  /api/image ...   │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼─────────────────────────────┐
//! │                     Studio service                        │
//! │  - Validate seeds and widths                              │
//! │  - Build CLI arguments and output paths                   │
//! │  - Map process outcomes onto API responses                │
//! └──────────────┬──────────────────────────────┬────────────┘
//!                │                              │
//! ┌──────────────▼─────────────┐  ┌─────────────▼────────────┐
//! │       ProcessRunner         │  │      ArtifactIndex        │
//! │  - spawn qql-cli            │  │  - scan output directory  │
//! │  - capture stdout/stderr    │  │  - latest file per seed   │
//! │  - kill on timeout/shutdown │  │  - saved copies, listing  │
//! └─────────────────────────────┘  └───────────────────────────┘
//! ```
//!
//! The output directory is the only record of what was rendered: files
//! are correlated with seeds purely by name (`qql_<short seed>_<ms>.png`).
//!
//! ## Modules
//!
//! - [`process`]: bounded execution of external programs
//! - [`artifacts`]: seeds, naming convention and the filesystem store
//! - [`studio`]: request-level service and HTTP handlers
//! - [`api`]: router assembly and middleware
//! - [`server`]: server lifecycle
//! - [`config`]: configuration management

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod process;
pub mod server;
pub mod studio;

pub use config::QqlConfig;
pub use error::{Error, Result};
