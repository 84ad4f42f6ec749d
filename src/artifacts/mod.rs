//! Rendered artifacts on disk
//!
//! Seeds, the file naming convention that ties files back to seeds, and
//! the filesystem store that scans the output directory.

mod seed;
mod store;
mod types;

pub use seed::{validate_seed, Seed, SEED_LEN, SEED_PREFIX, SHORT_SEED_LEN};
pub use store::{ArtifactIndex, FsArtifactStore};
pub use types::{
    generated_file_name, generation_path, has_artifact_extension, matches_seed, now_millis,
    saved_file_name, ArtifactRecord, SavedArtifact, ARTIFACT_EXTENSION, GENERATED_PREFIX,
    NAME_DELIMITER, SAVED_PREFIX,
};
