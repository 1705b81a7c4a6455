//! Avatar file storage.
//!
//! Files land under a single configured directory with generated names; the
//! stored name is what goes into the user's avatar column.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use ulid::Ulid;

/// Extensions longer than this come from hostile filenames, not real files.
const MAX_EXTENSION_LENGTH: usize = 8;

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create file store at {}", root.display()))?;
        Ok(Self { root })
    }

    /// Persist `bytes` under a generated name, keeping a sanitized extension
    /// from the client-supplied filename. Returns the stored name.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        let name = match sanitized_extension(original_name) {
            Some(ext) => format!("{}.{ext}", Ulid::new()),
            None => Ulid::new().to_string(),
        };
        let path = self.root.join(&name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(name)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keep only short, alphanumeric, lowercased extensions; anything else is
/// dropped rather than trusted.
fn sanitized_extension(name: Option<&str>) -> Option<String> {
    let ext = Path::new(name?).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("tribuna-files-{}", Ulid::new()))
    }

    #[tokio::test]
    async fn stores_bytes_under_generated_name() -> Result<()> {
        let root = temp_root();
        let store = FileStore::new(&root).await?;

        let name = store.store(Some("me.PNG"), b"not-really-a-png").await?;
        assert!(name.ends_with(".png"));

        let written = fs::read(root.join(&name)).await?;
        assert_eq!(written, b"not-really-a-png");

        fs::remove_dir_all(&root).await?;
        Ok(())
    }

    #[tokio::test]
    async fn names_are_unique_per_store() -> Result<()> {
        let root = temp_root();
        let store = FileStore::new(&root).await?;

        let first = store.store(Some("a.jpg"), b"one").await?;
        let second = store.store(Some("b.jpg"), b"two").await?;
        assert_ne!(first, second);

        fs::remove_dir_all(&root).await?;
        Ok(())
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension(Some("photo.JPG")), Some("jpg".to_string()));
        assert_eq!(sanitized_extension(Some("photo")), None);
        assert_eq!(sanitized_extension(Some("photo.j pg")), None);
        assert_eq!(sanitized_extension(Some("photo.waytoolongext")), None);
        assert_eq!(sanitized_extension(None), None);
    }
}
