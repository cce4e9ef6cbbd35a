pub mod mount;
pub mod scan;
pub mod signatures;
