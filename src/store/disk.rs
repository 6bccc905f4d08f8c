use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use crate::{common, store::{ArtifactKey, ArtifactStore}};

/// Artifacts as files under a root directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        common::ensure_dir_exists(&root)?;
        Ok(Self { root })
    }

    /// Absolute path of an artifact.
    pub fn full(&self, key: &ArtifactKey) -> PathBuf { self.root.join(key.path()) }
}

impl ArtifactStore for DiskStore {
    fn exists(&self, key: &ArtifactKey) -> bool { self.full(key).is_file() }

    fn load(&self, key: &ArtifactKey) -> Result<Arc<[u8]>> {
        let path = self.full(key);
        Ok(Arc::from(std::fs::read(&path).with_context(|| format!("read {}", path.display()))?))
    }

    fn store(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        common::write_atomic(&self.full(key), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path().join("out")).unwrap();
        let key = ArtifactKey::regions("AAA", 1);

        assert!(!store.exists(&key));
        store.store(&key, b"{}").unwrap();
        assert!(store.exists(&key));
        assert_eq!(&*store.load(&key).unwrap(), b"{}");
        assert!(dir.path().join("out/AAA/regions/regions_1_AAA.geojson").is_file());
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert!(store.load(&ArtifactKey::DecileSummary).is_err());
    }
}
