mod disk;
mod key;
mod memory;

use std::sync::Arc;

use anyhow::Result;

pub use disk::DiskStore;
pub use key::{ArtifactKey, Metric};
pub use memory::MemStore;

/// Keyed storage for pipeline artifacts. The presence of a key is the signal
/// that the step producing it has already completed.
pub trait ArtifactStore: Send + Sync {
    fn exists(&self, key: &ArtifactKey) -> bool;

    fn load(&self, key: &ArtifactKey) -> Result<Arc<[u8]>>;

    /// Replace the artifact stored under `key`. Readers never observe a partial write.
    fn store(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;
}
