//! # romvfs-core
//!
//! Container/image format detection and virtual-filesystem mounting.
//!
//! This crate provides:
//! - Masked byte signatures with nibble-level wildcards
//! - A streaming pattern scanner over arbitrary byte sources
//! - An abstract device/file-tree model for mounted containers
//! - A signature-keyed registry that picks and initializes the right
//!   device implementation for a given stream
//!
//! Format adapters live outside this crate; they register their
//! signatures and a device factory with a [`DeviceRegistry`], which then
//! drives detection and mounting:
//!
//! ```no_run
//! use romvfs_core::{DeviceRegistry, Media};
//!
//! # fn main() -> romvfs_core::Result<()> {
//! let registry = DeviceRegistry::new();
//! let media = Media::open("image.bin")?;
//! for m in registry.scan(&media)? {
//!     println!("{} at offset {}", m.signature, m.offset);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod media;
pub mod registry;
pub mod scanner;
pub mod signature;
pub mod vfs;

pub use error::{Error, Result};
pub use media::{Media, MediaSlice, ReadSeek};
pub use registry::{DeviceFactory, DeviceRegistry};
pub use scanner::{PatternMatch, PatternScanner, SCAN_CHUNK_SIZE};
pub use signature::{
    Nibble, PatternByte, Signature, SignatureEntry, SignatureKind, SignatureSet,
    builtin_signatures, load_signatures, save_signatures,
};
pub use vfs::{
    DeviceState, EntryAttributes, EntryId, EntryKind, EntryMetadata, HostFsDevice, Mount,
    VfsDevice, VfsEntry, VfsTree,
};
