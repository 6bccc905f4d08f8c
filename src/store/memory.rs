use std::{collections::HashMap, sync::{Arc, RwLock}};

use anyhow::{Result, anyhow};

use crate::store::{ArtifactKey, ArtifactStore};

/// Simple in-memory store.
#[derive(Debug, Default)]
pub struct MemStore {
    files: RwLock<HashMap<ArtifactKey, Arc<[u8]>>>,
}

impl MemStore {
    pub fn new() -> Self { Self::default() }

    /// Keys currently stored, in path order.
    pub fn keys(&self) -> Vec<ArtifactKey> {
        let mut keys: Vec<_> = self.files.read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_by_key(|key| key.path());
        keys
    }
}

impl ArtifactStore for MemStore {
    fn exists(&self, key: &ArtifactKey) -> bool {
        self.files.read().is_ok_and(|files| files.contains_key(key))
    }

    fn load(&self, key: &ArtifactKey) -> Result<Arc<[u8]>> {
        self.files.read()
            .map_err(|_| anyhow!("artifact store lock poisoned"))?
            .get(key).cloned()
            .ok_or_else(|| anyhow!("missing artifact: {key}"))
    }

    fn store(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.files.write()
            .map_err(|_| anyhow!("artifact store lock poisoned"))?
            .insert(key.clone(), Arc::from(bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_overwrites() {
        let store = MemStore::new();
        let key = ArtifactKey::DecileSummary;
        store.store(&key, b"a").unwrap();
        store.store(&key, b"b").unwrap();
        assert_eq!(&*store.load(&key).unwrap(), b"b");
        assert_eq!(store.keys(), vec![key]);
        assert!(store.load(&ArtifactKey::PopEstimates).is_err());
    }
}
