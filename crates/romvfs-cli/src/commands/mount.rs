use std::path::Path;

use anyhow::Result;
use romvfs_core::{EntryId, HostFsDevice, Mount, VfsTree};

pub fn run(path: &Path) -> Result<()> {
    let mut mount = Mount::new(Box::new(HostFsDevice::new(path)));
    mount.initialize()?;

    let tree = mount.tree()?;
    let root = tree.root();

    println!("{}", tree.entry(root)?.path());
    print_children(tree, root, 1)?;

    let entries = tree.descendants(root);
    let files = entries
        .iter()
        .filter(|id| tree.entry(**id).map(|e| e.is_file()).unwrap_or(false))
        .count();
    println!("{} entries ({} files)", entries.len(), files);

    Ok(())
}

fn print_children(tree: &VfsTree, parent: EntryId, depth: usize) -> Result<()> {
    for id in tree.children(parent) {
        let entry = tree.entry(id)?;
        let indent = "  ".repeat(depth);

        if entry.is_directory() {
            println!("{indent}{}/", entry.name());
            print_children(tree, id, depth + 1)?;
        } else {
            println!("{indent}{}  ({} bytes)", entry.name(), entry.size_in_bytes());
        }
    }
    Ok(())
}
