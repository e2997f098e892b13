mod collaborator;
mod error;
mod json;

pub use collaborator::GraphClient;
pub use error::CloudError;
