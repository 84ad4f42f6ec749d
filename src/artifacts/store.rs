//! Filesystem-backed artifact store
//!
//! The output directory is the only source of truth: there is no index,
//! every lookup rescans the directory and correlates files with seeds
//! through the naming convention in [`super::types`].

use super::seed::Seed;
use super::types::{
    generation_path, has_artifact_extension, matches_seed, now_millis, saved_file_name,
    ArtifactRecord, SavedArtifact,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

const NO_ARTWORK: &str = "No generated artwork found for this seed";

/// Correlates seeds with artifacts.
///
/// Callers depend on this trait only, so the directory scan can later be
/// swapped for an index without touching the service layer.
#[async_trait]
pub trait ArtifactIndex: Send + Sync {
    /// Directory artifacts live in
    fn output_dir(&self) -> &Path;

    /// Create the output directory tree if needed (idempotent)
    async fn ensure_directory(&self) -> Result<()>;

    /// Path a new render of `seed` at `timestamp_ms` should be written to
    fn generation_path(&self, seed: &Seed, timestamp_ms: u64) -> PathBuf {
        generation_path(seed, timestamp_ms, self.output_dir())
    }

    /// Lexicographically greatest artifact whose name contains the short seed
    async fn find_latest_for_seed(&self, seed: &Seed) -> Result<ArtifactRecord>;

    /// Copy the latest artifact of `seed` under a fresh saved name
    async fn save_copy(&self, seed: &Seed) -> Result<SavedArtifact>;

    /// All artifacts, most recently created first
    async fn list(&self) -> Result<Vec<ArtifactRecord>>;

    /// Look up a single artifact by bare file name
    async fn resolve(&self, file_name: &str) -> Result<ArtifactRecord>;
}

/// [`ArtifactIndex`] that scans a directory on every call
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    output_dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Names of regular files in the output directory
    async fn file_names(&self) -> std::io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => names.push(name),
                Ok(_) => {}
                Err(e) => tracing::debug!(file = %name, error = %e, "Skipping unreadable entry"),
            }
        }
        Ok(names)
    }

    async fn record_for(&self, file_name: &str) -> std::io::Result<ArtifactRecord> {
        let absolute_path = self.output_dir.join(file_name);
        let metadata = tokio::fs::metadata(&absolute_path).await?;
        let created = metadata.created().or_else(|_| metadata.modified())?;
        let created_at_millis = created
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Ok(ArtifactRecord {
            file_name: file_name.to_string(),
            absolute_path,
            size_bytes: metadata.len(),
            created_at_millis,
        })
    }
}

#[async_trait]
impl ArtifactIndex for FsArtifactStore {
    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn ensure_directory(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    async fn find_latest_for_seed(&self, seed: &Seed) -> Result<ArtifactRecord> {
        let names = self.file_names().await?;

        // Lexicographic, not chronological: only equivalent while all
        // timestamps have the same number of digits.
        let latest = names
            .into_iter()
            .filter(|name| matches_seed(name, seed))
            .max()
            .ok_or_else(|| Error::NotFound(NO_ARTWORK.to_string()))?;

        match self.record_for(&latest).await {
            Ok(record) => Ok(record),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound(NO_ARTWORK.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_copy(&self, seed: &Seed) -> Result<SavedArtifact> {
        let original = self.find_latest_for_seed(seed).await?;
        let saved_name = saved_file_name(seed, now_millis());

        // A save landing in the same millisecond as the saved copy it would
        // duplicate must not copy the file onto itself.
        if saved_name != original.file_name {
            let target = self.output_dir.join(&saved_name);
            tokio::fs::copy(&original.absolute_path, &target).await?;
        }

        let record = self.record_for(&saved_name).await?;
        tracing::info!(
            seed = %seed.short(),
            original = %original.file_name,
            saved = %record.file_name,
            "Saved artifact copy"
        );

        Ok(SavedArtifact {
            record,
            original_file: original.file_name,
        })
    }

    async fn list(&self) -> Result<Vec<ArtifactRecord>> {
        let names = match self.file_names().await {
            Ok(names) => names,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::with_capacity(names.len());
        for name in names.iter().filter(|n| has_artifact_extension(n)) {
            match self.record_for(name).await {
                Ok(record) => records.push(record),
                // Removed between scan and stat
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        records.sort_by(|a, b| {
            b.created_at_millis
                .cmp(&a.created_at_millis)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(records)
    }

    async fn resolve(&self, file_name: &str) -> Result<ArtifactRecord> {
        let not_found = || Error::NotFound("Image not found".to_string());

        let mut components = Path::new(file_name).components();
        let is_bare_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_bare_name || file_name.contains(['/', '\\']) {
            return Err(not_found());
        }

        // Symlinks are not followed; they could point outside the directory
        match tokio::fs::symlink_metadata(self.output_dir.join(file_name)).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }
        Ok(self.record_for(file_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::types::generated_file_name;
    use std::time::Duration;
    use tempfile::TempDir;

    fn seed(c: char) -> Seed {
        Seed::parse(&format!("0x{}", c.to_string().repeat(64))).unwrap()
    }

    fn store(dir: &TempDir) -> FsArtifactStore {
        FsArtifactStore::new(dir.path())
    }

    fn touch(dir: &TempDir, name: &str, contents: &[u8]) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("a").join("b"));

        store.ensure_directory().await.unwrap();
        store.ensure_directory().await.unwrap();
        assert!(store.output_dir().is_dir());
    }

    #[tokio::test]
    async fn test_ensure_directory_reports_failure() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "blocker", b"");
        let store = FsArtifactStore::new(dir.path().join("blocker").join("out"));

        let err = store.ensure_directory().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_generation_path_uses_output_dir() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.generation_path(&seed('a'), 1_718_000_000_000);
        assert_eq!(path, dir.path().join("qql_aaaaaaaa_1718000000000.png"));
    }

    #[tokio::test]
    async fn test_find_latest_picks_greatest_timestamp() {
        let dir = TempDir::new().unwrap();
        let s = seed('a');
        touch(&dir, &generated_file_name(&s, 1_718_000_000_100), b"old");
        touch(&dir, &generated_file_name(&s, 1_718_000_000_200), b"new");
        touch(&dir, &generated_file_name(&seed('b'), 1_718_000_000_300), b"other");
        touch(&dir, "qql_aaaaaaaa_1718000000400.txt", b"not an image");

        let latest = store(&dir).find_latest_for_seed(&s).await.unwrap();
        assert_eq!(latest.file_name, "qql_aaaaaaaa_1718000000200.png");
        assert_eq!(latest.size_bytes, 3);
        assert_eq!(latest.absolute_path, dir.path().join(&latest.file_name));
    }

    #[tokio::test]
    async fn test_find_latest_is_lexicographic() {
        // Digit-count transition: lexicographic order picks the shorter
        // (chronologically older) timestamp.
        let dir = TempDir::new().unwrap();
        let s = seed('a');
        touch(&dir, &generated_file_name(&s, 999), b"");
        touch(&dir, &generated_file_name(&s, 1000), b"");

        let latest = store(&dir).find_latest_for_seed(&s).await.unwrap();
        assert_eq!(latest.file_name, "qql_aaaaaaaa_999.png");
    }

    #[tokio::test]
    async fn test_find_latest_not_found() {
        let dir = TempDir::new().unwrap();
        touch(&dir, &generated_file_name(&seed('b'), 1), b"");

        let err = store(&dir).find_latest_for_seed(&seed('a')).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_latest_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("missing"));
        let err = store.find_latest_for_seed(&seed('a')).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        let err = store.save_copy(&seed('a')).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!store.output_dir().exists());
    }

    #[tokio::test]
    async fn test_save_copy() {
        let dir = TempDir::new().unwrap();
        let s = seed('a');
        touch(&dir, &generated_file_name(&s, 1_718_000_000_100), b"pixels");

        let saved = store(&dir).save_copy(&s).await.unwrap();
        assert_eq!(saved.original_file, "qql_aaaaaaaa_1718000000100.png");
        assert!(saved.record.file_name.starts_with("saved_aaaaaaaa_"));
        assert_eq!(std::fs::read(&saved.record.absolute_path).unwrap(), b"pixels");
        // Original is untouched
        assert!(dir.path().join(&saved.original_file).exists());
    }

    #[tokio::test]
    async fn test_save_copy_not_found_creates_nothing() {
        let dir = TempDir::new().unwrap();
        touch(&dir, &generated_file_name(&seed('b'), 1), b"");

        let err = store(&dir).save_copy(&seed('a')).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_creation_desc() {
        let dir = TempDir::new().unwrap();
        for name in ["t1.png", "t2.png", "t3.png"] {
            touch(&dir, name, b"x");
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        touch(&dir, "notes.txt", b"ignored");
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let records = store(&dir).list().await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["t3.png", "t2.png", "t1.png"]);
    }

    #[tokio::test]
    async fn test_list_is_stable() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            touch(&dir, &format!("qql_aaaaaaaa_{i}.png"), b"x");
        }
        let store = store(&dir);
        let first = store.list().await.unwrap();
        let second = store.list().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path().join("missing"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_unreadable_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "not-a-dir", b"");
        let store = FsArtifactStore::new(dir.path().join("not-a-dir"));

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_resolve() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "qql_aaaaaaaa_1.png", b"png");
        let store = store(&dir);

        let record = store.resolve("qql_aaaaaaaa_1.png").await.unwrap();
        assert_eq!(record.size_bytes, 3);

        for bad in ["missing.png", "", "..", ".", "../etc/passwd", "a/b.png", "a\\b.png"] {
            let err = store.resolve(bad).await.unwrap_err();
            assert!(matches!(err, Error::NotFound(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();
        let err = store(&dir).resolve("sub.png").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_ignores_symlinks() {
        let outside = TempDir::new().unwrap();
        touch(&outside, "secret.png", b"secret");
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.png"), dir.path().join("link.png"))
            .unwrap();

        let err = store(&dir).resolve("link.png").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
