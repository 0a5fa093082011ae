// This is a metapackage for cross-crate tests
// Re-export crates as modules

pub use bank;
pub use common;
pub use market;
