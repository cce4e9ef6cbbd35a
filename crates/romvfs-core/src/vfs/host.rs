use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{Error, Result};
use crate::vfs::device::VfsDevice;
use crate::vfs::entry::{EntryAttributes, EntryId, EntryMetadata, VfsEntry};
use crate::vfs::tree::VfsTree;

/// Passthrough device exposing a host directory as a VFS tree.
///
/// Mostly useful as the reference device implementation and for treating
/// already-extracted content uniformly with mounted images.
pub struct HostFsDevice {
    root: PathBuf,
}

impl HostFsDevice {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl VfsDevice for HostFsDevice {
    fn name(&self) -> &str {
        "host-fs"
    }

    fn setup(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::DeviceSetup(format!(
                "Directory does not exist: {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn build_tree(&mut self) -> Result<VfsTree> {
        let mut tree = VfsTree::new(&self.root.to_string_lossy(), read_metadata(&self.root));
        let root_id = tree.root();
        add_children_recursive(&mut tree, root_id, &self.root)?;
        Ok(tree)
    }

    fn open_file(&self, entry: &VfsEntry) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(entry.path())?;
        Ok(Box::new(file))
    }
}

/// Walk one level: directories are added and recursed first, then files
/// are attached. Names are sorted so the tree is deterministic.
fn add_children_recursive(tree: &mut VfsTree, parent: EntryId, dir: &Path) -> Result<()> {
    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            directories.push(path);
        } else {
            files.push(path);
        }
    }

    directories.sort();
    files.sort();

    for path in directories {
        let id = tree.add_directory(parent, &path.to_string_lossy(), read_metadata(&path))?;
        if let Some(id) = id {
            add_children_recursive(tree, id, &path)?;
        }
    }

    for path in files {
        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Skipping unreadable file {}: {}", path.display(), e);
                continue;
            }
        };
        tree.add_file(parent, &path.to_string_lossy(), size, read_metadata(&path))?;
    }

    Ok(())
}

fn read_metadata(path: &Path) -> EntryMetadata {
    let Ok(metadata) = fs::metadata(path) else {
        return EntryMetadata::default();
    };

    let hidden = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false);

    EntryMetadata {
        attributes: EntryAttributes {
            read_only: metadata.permissions().readonly(),
            hidden,
        },
        accessed: metadata.accessed().ok().map(DateTime::<Utc>::from),
        created: metadata.created().ok().map(DateTime::<Utc>::from),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::device::{DeviceState, Mount};
    use std::fs::File;
    use std::io::Write;

    fn populate(dir: &Path) {
        fs::create_dir(dir.join("sub")).unwrap();
        let mut inner = File::create(dir.join("sub/inner.txt")).unwrap();
        inner.write_all(b"inner content").unwrap();

        let mut top = File::create(dir.join("top.bin")).unwrap();
        top.write_all(&[0xAB; 32]).unwrap();
    }

    #[test]
    fn test_mounts_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let mut mount = Mount::new(Box::new(HostFsDevice::new(dir.path())));
        mount.initialize().unwrap();

        let tree = mount.tree().unwrap();
        let root = tree.root();

        // Directories come before files at each level.
        let names: Vec<&str> = tree
            .children(root)
            .map(|id| tree.entry(id).unwrap().name())
            .collect();
        assert_eq!(names, vec!["sub", "top.bin"]);

        let file = tree.lookup("sub/inner.txt").unwrap();
        let entry = tree.entry(file).unwrap();
        assert_eq!(entry.size_in_bytes(), 13);
        assert!(entry.modified().is_some());
    }

    #[test]
    fn test_open_file_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let mut mount = Mount::new(Box::new(HostFsDevice::new(dir.path())));
        mount.initialize().unwrap();

        let file = mount.tree().unwrap().lookup("sub/inner.txt").unwrap();

        // Each open returns a fresh independent reader.
        for _ in 0..2 {
            let mut content = String::new();
            mount
                .open_file(file)
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, "inner content");
        }
    }

    #[test]
    fn test_missing_directory_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let mut mount = Mount::new(Box::new(HostFsDevice::new(&missing)));
        let err = mount.initialize().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(mount.state(), DeviceState::Failed);
    }
}
