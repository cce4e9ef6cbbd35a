use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Handle to an entry in a [`VfsTree`](crate::vfs::VfsTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryAttributes {
    pub read_only: bool,
    pub hidden: bool,
}

/// Non-structural entry properties supplied by the device at build time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryMetadata {
    pub attributes: EntryAttributes,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// A single directory or file in a device's file tree.
///
/// Entries are created during tree build and immutable afterwards, except
/// for child insertion during that same phase. The parent link is a plain
/// id into the arena, never a second owner.
#[derive(Debug, Clone)]
pub struct VfsEntry {
    pub(crate) path: String,
    pub(crate) kind: EntryKind,
    pub(crate) metadata: EntryMetadata,
    pub(crate) size: u64,
    pub(crate) parent: Option<EntryId>,
    pub(crate) children: IndexMap<String, EntryId>,
}

impl VfsEntry {
    /// Full logical path of the entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        entry_name(&self.path)
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn attributes(&self) -> EntryAttributes {
        self.metadata.attributes
    }

    pub fn accessed(&self) -> Option<DateTime<Utc>> {
        self.metadata.accessed
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.metadata.created
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.metadata.modified
    }

    /// File size in bytes; zero for directories.
    pub fn size_in_bytes(&self) -> u64 {
        self.size
    }

    /// Parent entry, `None` for the root.
    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub(crate) fn child_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.children.values().copied()
    }
}

/// Last segment of a logical path, tolerating both separator styles.
pub(crate) fn entry_name(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
}
