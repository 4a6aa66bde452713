//! Persistence collaborator for serialized documents.
//!
//! Persistence is fire-and-forget: writes never block or fail the
//! mutation that triggered them. Implementations log failures and move
//! on; last-write-wins is acceptable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Key-value transport for serialized documents.
///
/// `set` is infallible by signature: durability problems are the
/// implementation's to log, never the caller's to handle.
pub trait DocumentStore: Send + Sync {
    /// Load the bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `bytes` under `key`.
    fn set(&self, key: &str, bytes: &[u8]);
}

/// In-memory store, mainly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, bytes: &[u8]) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), bytes.to_vec());
    }
}

/// File-backed store: one file per document key under a data directory.
///
/// Writes are offloaded to the blocking pool when a tokio runtime is
/// available, so autosaves never stall the mutating call. Offloaded
/// writes carry a sequence number per key; a write that was overtaken
/// by a newer one for the same key is skipped, so the file always ends
/// up holding the latest bytes.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    writes: Arc<WriteOrder>,
}

/// Per-key last-write-wins bookkeeping for offloaded writes.
#[derive(Debug, Default)]
struct WriteOrder {
    next_seq: AtomicU64,
    applied: Mutex<HashMap<String, u64>>,
}

impl FileStore {
    /// Create a store rooted at `data_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            writes: Arc::new(WriteOrder::default()),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(key)))
    }
}

impl WriteOrder {
    /// Write `bytes` to `path` unless a newer write for `key` has
    /// already been applied.
    fn apply(&self, seq: u64, key: &str, path: &Path, bytes: &[u8]) {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        let last = applied.entry(key.to_string()).or_insert(0);
        if seq < *last {
            tracing::debug!("Skipping overtaken write for document {key}");
            return;
        }
        *last = seq;
        if let Err(e) = std::fs::write(path, bytes) {
            tracing::warn!("Failed to persist document {key} to {}: {e}", path.display());
        }
    }
}

impl DocumentStore for FileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, bytes: &[u8]) {
        let path = self.path_for(key);
        let seq = self.writes.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let writes = Arc::clone(&self.writes);
                let key = key.to_string();
                let bytes = bytes.to_vec();
                drop(handle.spawn_blocking(move || writes.apply(seq, &key, &path, &bytes)));
            }
            Err(_) => self.writes.apply(seq, key, &path, bytes),
        }
    }
}

/// Sanitize a document key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
