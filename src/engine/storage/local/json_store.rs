//! JSON-backed persistence store.
//!
//! `JsonFileStore` keeps **all keys** in a single JSON object on disk. Every
//! write reads the document, applies the change and rewrites the whole file, so
//! it suits the handful of small keys the sync core stores.
//!
//! ### Concurrency
//! - Read-modify-write cycles are serialized by an async mutex, so concurrent
//!   `set`/`remove` calls on the same instance do not lose updates.
//! - Two instances pointing at the same file are **not** coordinated.
//!
//! ### I/O characteristics & caveats
//! - A missing file reads as an empty document.
//! - A corrupt file is reported as an error on read and replaced on the next write.
//! - File writes are not atomic.
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::engine::storage::area::PersistenceStore;

type Document = HashMap<String, Value>;

pub struct JsonFileStore {
    /// Path to the JSON file where all keys are stored.
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };

        serde_json::from_slice(&contents)
            .with_context(|| format!("decoding {}", self.path.display()))
    }

    async fn read_document_lenient(&self) -> Document {
        match self.read_document().await {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("JsonFileStore: starting from an empty document: {:#}", e);
                Document::new()
            }
        }
    }

    async fn write_document(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let mut payload = serde_json::to_vec_pretty(doc)?;
        payload.push(b'\n');
        tokio::fs::write(&self.path, payload)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl PersistenceStore for JsonFileStore {
    fn get(&self, keys: Vec<String>) -> BoxFuture<'_, Result<HashMap<String, Value>>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut doc = self.read_document().await?;
            Ok(keys
                .into_iter()
                .filter_map(|k| doc.remove(&k).map(|v| (k, v)))
                .collect())
        })
    }

    fn set(&self, items: HashMap<String, Value>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut doc = self.read_document_lenient().await;
            doc.extend(items);
            self.write_document(&doc).await
        })
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut doc = self.read_document_lenient().await;
            let before = doc.len();
            for k in &keys {
                doc.remove(k);
            }
            if doc.len() == before {
                return Ok(());
            }
            self.write_document(&doc).await
        })
    }
}
