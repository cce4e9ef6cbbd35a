mod device;
mod entry;
mod host;
mod tree;

pub use device::*;
pub use entry::*;
pub use host::*;
pub use tree::*;
