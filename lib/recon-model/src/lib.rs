mod error;
mod id;
mod node;
mod operation;
pub mod ops;
mod tree;

pub use error::ModelError;
pub use id::{Id, PlaceholderCounter};
pub use node::{compatible_size, CloudFile, Digests, Directory, File, LocalFile};
pub use operation::{CloudFileMeta, Operation};
pub use tree::Tree;
