use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::vfs::entry::{EntryId, EntryKind, EntryMetadata, VfsEntry, entry_name};

/// Arena-backed file tree owned by a device.
///
/// All entries live in one arena and are dropped together with the tree;
/// parent links are ids, so there are no ownership cycles. Children are
/// keyed by name in insertion order.
#[derive(Debug)]
pub struct VfsTree {
    entries: Vec<VfsEntry>,
    root: EntryId,
}

impl VfsTree {
    /// Create a tree containing only its root directory.
    pub fn new(root_path: &str, metadata: EntryMetadata) -> Self {
        let root = VfsEntry {
            path: root_path.to_string(),
            kind: EntryKind::Directory,
            metadata,
            size: 0,
            parent: None,
            children: IndexMap::new(),
        };

        Self {
            entries: vec![root],
            root: EntryId(0),
        }
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    /// Total number of entries, root included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, id: EntryId) -> Result<&VfsEntry> {
        self.entries.get(id.0).ok_or(Error::EntryNotFound(id.0))
    }

    /// Add a directory under `parent`.
    ///
    /// Returns `Ok(None)` when `parent` already has a child with the same
    /// name; the insert is a no-op, not an error.
    pub fn add_directory(
        &mut self,
        parent: EntryId,
        path: &str,
        metadata: EntryMetadata,
    ) -> Result<Option<EntryId>> {
        self.insert(parent, path, EntryKind::Directory, 0, metadata)
    }

    /// Add a file of `size` bytes under `parent`. Duplicate-name handling
    /// matches [`VfsTree::add_directory`].
    pub fn add_file(
        &mut self,
        parent: EntryId,
        path: &str,
        size: u64,
        metadata: EntryMetadata,
    ) -> Result<Option<EntryId>> {
        self.insert(parent, path, EntryKind::File, size, metadata)
    }

    fn insert(
        &mut self,
        parent: EntryId,
        path: &str,
        kind: EntryKind,
        size: u64,
        metadata: EntryMetadata,
    ) -> Result<Option<EntryId>> {
        let name = entry_name(path).to_string();

        let parent_entry = self.entry(parent)?;
        if !parent_entry.is_directory() {
            return Err(Error::NotADirectory(parent_entry.path.clone()));
        }
        if parent_entry.children.contains_key(&name) {
            return Ok(None);
        }

        let id = EntryId(self.entries.len());
        self.entries.push(VfsEntry {
            path: path.to_string(),
            kind,
            metadata,
            size,
            parent: Some(parent),
            children: IndexMap::new(),
        });
        self.entries[parent.0].children.insert(name, id);

        Ok(Some(id))
    }

    /// Direct children of `id` in insertion order.
    pub fn children(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        self.entries
            .get(id.0)
            .into_iter()
            .flat_map(VfsEntry::child_ids)
    }

    /// Direct child directories of `id`.
    pub fn directories(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        self.children(id)
            .filter(|child| self.entries[child.0].is_directory())
    }

    /// Direct child files of `id`.
    pub fn files(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        self.children(id)
            .filter(|child| self.entries[child.0].is_file())
    }

    /// Every entry below `id`, depth-first.
    pub fn descendants(&self, id: EntryId) -> Vec<EntryId> {
        let mut result = Vec::new();
        let mut stack: Vec<EntryId> = self.children(id).collect();
        stack.reverse();

        while let Some(current) = stack.pop() {
            result.push(current);
            let mut children: Vec<EntryId> = self.children(current).collect();
            children.reverse();
            stack.extend(children);
        }

        result
    }

    /// Resolve a `/`-separated path of entry names relative to the root.
    pub fn lookup(&self, path: &str) -> Option<EntryId> {
        let mut current = self.root;

        for segment in path.split(['/', '\\']).filter(|s| !s.is_empty()) {
            let entry = self.entries.get(current.0)?;
            current = *entry.children.get(segment)?;
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> VfsTree {
        VfsTree::new("/", EntryMetadata::default())
    }

    #[test]
    fn test_duplicate_child_name_is_a_noop() {
        let mut tree = tree();
        let root = tree.root();

        let first = tree
            .add_file(root, "/readme.txt", 10, EntryMetadata::default())
            .unwrap();
        assert!(first.is_some());

        let second = tree
            .add_file(root, "/readme.txt", 99, EntryMetadata::default())
            .unwrap();
        assert!(second.is_none());

        assert_eq!(tree.children(root).count(), 1);
        let kept = tree.entry(first.unwrap()).unwrap();
        assert_eq!(kept.size_in_bytes(), 10);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = tree();
        let root = tree.root();

        for name in ["zeta", "alpha", "mid"] {
            tree.add_directory(root, &format!("/{name}"), EntryMetadata::default())
                .unwrap();
        }

        let names: Vec<&str> = tree
            .children(root)
            .map(|id| tree.entry(id).unwrap().name())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parent_links_and_name_derivation() {
        let mut tree = tree();
        let root = tree.root();

        let dir = tree
            .add_directory(root, "/games", EntryMetadata::default())
            .unwrap()
            .unwrap();
        let file = tree
            .add_file(dir, "/games/disc.iso", 1024, EntryMetadata::default())
            .unwrap()
            .unwrap();

        let entry = tree.entry(file).unwrap();
        assert_eq!(entry.name(), "disc.iso");
        assert_eq!(entry.path(), "/games/disc.iso");
        assert_eq!(entry.parent(), Some(dir));
        assert_eq!(tree.entry(root).unwrap().parent(), None);
    }

    #[test]
    fn test_file_cannot_have_children() {
        let mut tree = tree();
        let root = tree.root();

        let file = tree
            .add_file(root, "/data.bin", 1, EntryMetadata::default())
            .unwrap()
            .unwrap();

        let err = tree
            .add_file(file, "/data.bin/nested", 1, EntryMetadata::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[test]
    fn test_enumeration_splits_directories_and_files() {
        let mut tree = tree();
        let root = tree.root();

        tree.add_directory(root, "/sub", EntryMetadata::default())
            .unwrap();
        tree.add_file(root, "/a.bin", 1, EntryMetadata::default())
            .unwrap();
        tree.add_file(root, "/b.bin", 2, EntryMetadata::default())
            .unwrap();

        assert_eq!(tree.directories(root).count(), 1);
        assert_eq!(tree.files(root).count(), 2);
        assert_eq!(tree.children(root).count(), 3);
    }

    #[test]
    fn test_descendants_depth_first() {
        let mut tree = tree();
        let root = tree.root();

        let sub = tree
            .add_directory(root, "/sub", EntryMetadata::default())
            .unwrap()
            .unwrap();
        tree.add_file(sub, "/sub/inner.txt", 1, EntryMetadata::default())
            .unwrap();
        tree.add_file(root, "/top.txt", 1, EntryMetadata::default())
            .unwrap();

        let paths: Vec<&str> = tree
            .descendants(root)
            .into_iter()
            .map(|id| tree.entry(id).unwrap().path())
            .collect();
        assert_eq!(paths, vec!["/sub", "/sub/inner.txt", "/top.txt"]);
    }

    #[test]
    fn test_lookup_by_path() {
        let mut tree = tree();
        let root = tree.root();

        let sub = tree
            .add_directory(root, "/sub", EntryMetadata::default())
            .unwrap()
            .unwrap();
        let inner = tree
            .add_file(sub, "/sub/inner.txt", 1, EntryMetadata::default())
            .unwrap()
            .unwrap();

        assert_eq!(tree.lookup("sub/inner.txt"), Some(inner));
        assert_eq!(tree.lookup("/sub/"), Some(sub));
        assert_eq!(tree.lookup(""), Some(root));
        assert_eq!(tree.lookup("missing"), None);
    }
}
