use std::io::Read;

use tracing::debug;

use crate::error::{Error, Result};
use crate::vfs::entry::{EntryId, VfsEntry};
use crate::vfs::tree::VfsTree;

/// Lifecycle of a mounted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DeviceState {
    Uninitialized,
    Initializing,
    Initialized,
    Failed,
    Disposed,
}

/// A device implementation: given its backing resource, it builds a file
/// tree and serves file reads.
///
/// Implementations provide the format-specific steps; [`Mount`] drives
/// the lifecycle around them. `setup` opens or validates the backing
/// resource, `build_tree` produces the root directory and its children,
/// `release` drops whatever `setup` acquired.
pub trait VfsDevice: Send {
    fn name(&self) -> &str;

    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn build_tree(&mut self) -> Result<VfsTree>;

    fn release(&mut self) {}

    /// Open an independent reader for a file entry. Must not consume or
    /// invalidate the device's own stream state.
    fn open_file(&self, entry: &VfsEntry) -> Result<Box<dyn Read + Send>>;
}

/// A device plus its lifecycle state and the tree it built.
///
/// State machine: `Uninitialized → Initializing → Initialized`, or
/// `→ Failed` on error (the mount stays disposable and may retry);
/// `→ Disposed` is terminal and idempotent.
pub struct Mount {
    device: Box<dyn VfsDevice>,
    state: DeviceState,
    tree: Option<VfsTree>,
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("device", &self.device.name())
            .field("state", &self.state)
            .field("tree", &self.tree)
            .finish()
    }
}

impl Mount {
    pub fn new(device: Box<dyn VfsDevice>) -> Self {
        Self {
            device,
            state: DeviceState::Uninitialized,
            tree: None,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Run device setup and tree build, short-circuiting on failure.
    ///
    /// Calling this on an already-initialized mount is a no-op success.
    /// Failures surface as [`Error::DeviceInit`] carrying the cause and
    /// leave the mount in `Failed`.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            DeviceState::Initialized => return Ok(()),
            DeviceState::Disposed => return Err(Error::Disposed),
            _ => {}
        }

        self.state = DeviceState::Initializing;

        let built = self
            .device
            .setup()
            .and_then(|_| self.device.build_tree());

        match built {
            Ok(tree) => {
                debug!(
                    "Device '{}' initialized: {} entries",
                    self.device.name(),
                    tree.entry_count()
                );
                self.tree = Some(tree);
                self.state = DeviceState::Initialized;
                Ok(())
            }
            Err(e) => {
                self.state = DeviceState::Failed;
                Err(Error::DeviceInit {
                    device: self.device.name().to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Release the backing resource and drop the tree. Idempotent, and
    /// valid on a never-initialized or failed mount.
    pub fn dispose(&mut self) {
        if self.state == DeviceState::Disposed {
            return;
        }

        self.device.release();
        self.tree = None;
        self.state = DeviceState::Disposed;
        debug!("Device '{}' disposed", self.device.name());
    }

    pub fn tree(&self) -> Result<&VfsTree> {
        match self.state {
            DeviceState::Disposed => Err(Error::Disposed),
            DeviceState::Initialized => self.tree.as_ref().ok_or(Error::NotInitialized),
            _ => Err(Error::NotInitialized),
        }
    }

    pub fn root(&self) -> Result<EntryId> {
        Ok(self.tree()?.root())
    }

    /// Open a fresh reader over a file entry.
    pub fn open_file(&self, id: EntryId) -> Result<Box<dyn Read + Send>> {
        let tree = self.tree()?;
        let entry = tree.entry(id)?;

        if !entry.is_file() {
            return Err(Error::NotAFile(entry.path().to_string()));
        }

        self.device.open_file(entry)
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.dispose();
    }
}
