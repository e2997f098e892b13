mod condition;
mod conflict;
mod error;
mod optimize;
mod schedule;
mod validate;

pub use condition::{effect_of, prerequisites_of, Condition};
pub use conflict::check_same_node_operations;
pub use error::{AmbiguityKind, SchedError};
pub use optimize::optimize_cloud_deletion;
pub use schedule::schedule;
pub use validate::field_test;
