use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Disk-backed map from (model, text) to a previously computed embedding.
///
/// The whole store lives in memory and `flush` rewrites the backing JSON
/// file wholesale. That is a monotonic rewrite, not a write-ahead log: a
/// crash mid-write can lose prior-session entries. Entries are never
/// evicted. Single process, single writer.
#[derive(Debug)]
pub struct EmbeddingCache {
    path: PathBuf,
    entries: HashMap<String, Vec<f32>>,
}

impl EmbeddingCache {
    /// Loads prior persisted state. A missing, unreadable, or corrupt file
    /// means an empty cache, never an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Self { path, entries }
    }

    pub fn get(&self, text: &str, model: &str) -> Option<&Vec<f32>> {
        self.entries.get(&cache_key(text, model))
    }

    pub fn put(&mut self, text: &str, model: &str, vector: Vec<f32>) {
        self.entries.insert(cache_key(text, model), vector);
    }

    /// Rewrites the entire store to disk.
    pub fn flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, serialized)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Deterministic, collision-resistant key over the (model, text) pair.
fn cache_key(text: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(b"||");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
