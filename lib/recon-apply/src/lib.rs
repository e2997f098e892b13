mod error;
mod orchestrator;
mod traits;

pub use error::ApplyError;
pub use orchestrator::{apply_cloud_script, apply_local_script};
pub use traits::{CloudCollaborator, DeltaItem, LocalCollaborator, WalkEntry};
