//! Artifact records and the file naming convention
//!
//! ```text
//! generated:  qql_<short seed>_<unix ms>.png
//! saved:      saved_<short seed>_<unix ms>.png
//! ```

use super::seed::Seed;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension of every artifact file
pub const ARTIFACT_EXTENSION: &str = "png";

/// File name prefix of renders produced by the CLI
pub const GENERATED_PREFIX: &str = "qql";

/// File name prefix of saved copies
pub const SAVED_PREFIX: &str = "saved";

/// Separator between the name components
pub const NAME_DELIMITER: char = '_';

/// An artifact as currently found on disk.
///
/// Never persisted; always recomputed from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Bare file name
    #[serde(rename = "name")]
    pub file_name: String,
    /// Absolute path on disk
    #[serde(rename = "path")]
    pub absolute_path: PathBuf,
    /// Size in bytes
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Creation (birth) time in unix milliseconds
    #[serde(rename = "created")]
    pub created_at_millis: u64,
}

/// Result of copying an artifact under a saved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    /// The newly written copy
    pub record: ArtifactRecord,
    /// File name of the artifact that was copied
    pub original_file: String,
}

/// File name for a fresh render of `seed`
pub fn generated_file_name(seed: &Seed, timestamp_ms: u64) -> String {
    compose(GENERATED_PREFIX, seed, timestamp_ms)
}

/// File name for a saved copy of a render of `seed`
pub fn saved_file_name(seed: &Seed, timestamp_ms: u64) -> String {
    compose(SAVED_PREFIX, seed, timestamp_ms)
}

/// Output path the CLI is told to render `seed` into
pub fn generation_path(seed: &Seed, timestamp_ms: u64, output_dir: &Path) -> PathBuf {
    output_dir.join(generated_file_name(seed, timestamp_ms))
}

/// Whether `file_name` carries the artifact extension
pub fn has_artifact_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == ARTIFACT_EXTENSION)
}

/// Whether `file_name` correlates with `seed` (short-seed substring match)
pub fn matches_seed(file_name: &str, seed: &Seed) -> bool {
    has_artifact_extension(file_name) && file_name.contains(seed.short())
}

/// Current time in milliseconds since UNIX epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn compose(prefix: &str, seed: &Seed, timestamp_ms: u64) -> String {
    format!(
        "{prefix}{d}{short}{d}{timestamp_ms}.{ARTIFACT_EXTENSION}",
        d = NAME_DELIMITER,
        short = seed.short(),
    )
}
