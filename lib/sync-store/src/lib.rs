mod config;
mod error;
mod schema;
mod tree;

pub use config::{delete_config, get_config, require_config, set_config};
pub use error::StoreError;
pub use schema::{open, open_in_memory, TreeKind};
pub use tree::{load_tree, save_tree};
