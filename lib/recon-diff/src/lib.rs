mod comparators;
mod diff;
mod error;

pub use comparators::{compare_by_content_hash, compare_by_ctag, compare_by_mtime};
pub use diff::diff;
pub use error::DiffError;
