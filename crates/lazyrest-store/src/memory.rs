use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::traits::DocumentStore;
use crate::Document;

/// One level of the prefix tree.
#[derive(Debug, Default)]
struct Node {
    document: Option<Document>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.document.is_none() && self.children.is_empty()
    }

    fn find(&self, key: &Key) -> Option<&Node> {
        key.segments()
            .iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    fn find_or_create(&mut self, key: &Key) -> &mut Node {
        key.segments().iter().fold(self, |node, segment| {
            node.children.entry(segment.clone()).or_default()
        })
    }

    /// Remove the document at `segments`, pruning branches left empty.
    fn remove(&mut self, segments: &[String]) -> Option<Document> {
        let Some((head, rest)) = segments.split_first() else {
            return self.document.take();
        };
        let child = self.children.get_mut(head)?;
        let removed = child.remove(rest);
        if child.is_empty() {
            self.children.remove(head);
        }
        removed
    }

    fn count(&self) -> usize {
        usize::from(self.document.is_some())
            + self.children.values().map(Node::count).sum::<usize>()
    }
}

/// In-memory document store backed by a prefix tree keyed by segment.
///
/// Child enumeration walks `depth` nodes instead of scanning every key.
/// The tree lives behind a `RwLock`; documents are cloned on read and write.
pub struct InMemoryDocumentStore {
    root: RwLock<Node>,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::default()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.root.read()?.count())
    }

    /// Returns `true` if no documents are stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.root.read()?.is_empty())
    }

    /// Remove every document.
    pub fn clear(&self) -> StoreResult<()> {
        *self.root.write()? = Node::default();
        Ok(())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, key: &Key) -> StoreResult<Option<Document>> {
        let root = self.root.read()?;
        Ok(root.find(key).and_then(|node| node.document.clone()))
    }

    fn is_container(&self, key: &Key) -> StoreResult<bool> {
        let root = self.root.read()?;
        Ok(root.find(key).is_some_and(|node| !node.children.is_empty()))
    }

    fn list_children(&self, key: &Key) -> StoreResult<Vec<(String, Document)>> {
        let root = self.root.read()?;
        let Some(node) = root.find(key) else {
            return Ok(Vec::new());
        };
        Ok(node
            .children
            .iter()
            .filter_map(|(name, child)| Some((name.clone(), child.document.clone()?)))
            .collect())
    }

    fn put(&self, key: &Key, document: &Document) -> StoreResult<()> {
        if key.is_root() {
            return Err(StoreError::RootKey);
        }
        let mut root = self.root.write()?;
        root.find_or_create(key).document = Some(document.clone());
        Ok(())
    }

    fn delete(&self, key: &Key) -> StoreResult<bool> {
        if key.is_root() {
            return Ok(false);
        }
        let mut root = self.root.write()?;
        Ok(root.remove(key.segments()).is_some())
    }

    fn put_batch(&self, entries: &[(Key, Document)]) -> StoreResult<()> {
        if entries.iter().any(|(key, _)| key.is_root()) {
            return Err(StoreError::RootKey);
        }
        let mut root = self.root.write()?;
        for (key, document) in entries {
            root.find_or_create(key).document = Some(document.clone());
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().ok();
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &count)
            .finish()
    }
}
