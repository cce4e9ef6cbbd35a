mod pattern;
mod set;

pub use pattern::*;
pub use set::*;
