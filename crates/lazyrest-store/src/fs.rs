//! Filesystem-backed document store.
//!
//! On-disk layout, rooted at the data directory:
//!
//! ```text
//! <root>/items/42.json      document at key `items/42`
//! <root>/items/             branch holding the `items` collection
//! <root>/items/42/x.json    document at key `items/42/x`
//! ```
//!
//! Segments are percent-encoded on disk with everything but ASCII letters,
//! digits, `-` and `_` escaped (`a b` becomes `a%20b`, `a.json` becomes
//! `a%2Ejson`). An escaped name never contains a `.`, so the `.json` suffix
//! alone tells documents from branches and a key can be a document and a
//! branch at the same time, exactly as in the in-memory store.
//! Writes go through a temporary file in the target directory followed by a
//! rename, so readers never observe a partially written document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::traits::DocumentStore;
use crate::Document;

/// File suffix of stored documents.
const DOCUMENT_SUFFIX: &str = ".json";

/// Bytes escaped in on-disk names.
const NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// One file per document, one directory per branch.
pub struct FsDocumentStore {
    root: PathBuf,
    /// Serializes mutations against readers. Guards no data of its own.
    lock: RwLock<()>,
}

impl FsDocumentStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(root.display(), e))?;
        debug!(root = %root.display(), "opened filesystem document store");
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    /// The data directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn branch_path(&self, key: &Key) -> PathBuf {
        key.segments()
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(disk_name(segment)))
    }

    /// Path of the document file for a non-root key.
    fn document_path(&self, key: &Key) -> Option<PathBuf> {
        let name = key.last()?;
        let parent = key.parent()?;
        Some(
            self.branch_path(&parent)
                .join(format!("{}{DOCUMENT_SUFFIX}", disk_name(name))),
        )
    }

    fn read_document(key: impl std::fmt::Display, path: &Path) -> StoreResult<Option<Document>> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            // Deleted between the metadata check and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::serialization(key, e))
    }

    fn write_document(&self, key: &Key, document: &Document) -> StoreResult<()> {
        let (Some(parent), Some(path)) = (key.parent(), self.document_path(key)) else {
            return Err(StoreError::RootKey);
        };
        let dir = self.branch_path(&parent);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(key, e))?;

        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(key, e))?;
        serde_json::to_writer_pretty(&mut file, document)
            .map_err(|e| StoreError::serialization(key, e))?;
        file.flush().map_err(|e| StoreError::io(key, e))?;
        file.persist(&path).map_err(|e| StoreError::io(key, e.error))?;

        debug!(%key, path = %path.display(), "document written");
        Ok(())
    }

    /// Remove empty directories from `dir` upwards, stopping at the root or
    /// the first directory that still has entries.
    fn prune_empty_branches(&self, key: &Key, mut dir: PathBuf) -> StoreResult<()> {
        while dir != self.root && dir.starts_with(&self.root) {
            let mut entries = fs::read_dir(&dir).map_err(|e| StoreError::io(key, e))?;
            if entries.next().is_some() {
                break;
            }
            fs::remove_dir(&dir).map_err(|e| StoreError::io(key, e))?;
            if !dir.pop() {
                break;
            }
        }
        Ok(())
    }
}

impl DocumentStore for FsDocumentStore {
    fn get(&self, key: &Key) -> StoreResult<Option<Document>> {
        let Some(path) = self.document_path(key) else {
            return Ok(None);
        };
        let _guard = self.lock.read()?;
        Self::read_document(key, &path)
    }

    fn is_container(&self, key: &Key) -> StoreResult<bool> {
        let dir = self.branch_path(key);
        let _guard = self.lock.read()?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io(key, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(key, e))?;
            let file_type = entry.file_type().map_err(|e| StoreError::io(key, e))?;
            let is_document = file_type.is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| document_name(name).is_some());
            if file_type.is_dir() || is_document {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn list_children(&self, key: &Key) -> StoreResult<Vec<(String, Document)>> {
        let dir = self.branch_path(key);
        let _guard = self.lock.read()?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(key, e)),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(key, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(document_name) else {
                continue;
            };
            let child = key.child(&name);
            if let Some(document) = Self::read_document(&child, &entry.path())? {
                children.push((name, document));
            }
        }
        Ok(children)
    }

    fn put(&self, key: &Key, document: &Document) -> StoreResult<()> {
        let _guard = self.lock.write()?;
        self.write_document(key, document)
    }

    fn delete(&self, key: &Key) -> StoreResult<bool> {
        let Some(path) = self.document_path(key) else {
            return Ok(false);
        };
        let _guard = self.lock.write()?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io(key, e)),
        }
        if let Some(dir) = path.parent() {
            self.prune_empty_branches(key, dir.to_path_buf())?;
        }
        debug!(%key, "document removed");
        Ok(true)
    }

    fn put_batch(&self, entries: &[(Key, Document)]) -> StoreResult<()> {
        if entries.iter().any(|(key, _)| key.is_root()) {
            return Err(StoreError::RootKey);
        }
        let _guard = self.lock.write()?;
        entries
            .iter()
            .try_for_each(|(key, document)| self.write_document(key, document))
    }
}

impl std::fmt::Debug for FsDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsDocumentStore")
            .field("root", &self.root)
            .finish()
    }
}

/// On-disk form of one key segment.
fn disk_name(segment: &str) -> String {
    utf8_percent_encode(segment, NAME_ESCAPES).to_string()
}

/// Segment of a document file, if `file_name` names one written by this store.
fn document_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(DOCUMENT_SUFFIX)?;
    if stem.is_empty() || stem.contains('.') {
        return None;
    }
    percent_decode_str(stem)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}
