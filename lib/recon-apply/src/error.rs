use thiserror::Error;

use recon_model::{Id, ModelError, Operation};

#[derive(Error, Debug)]
pub enum ApplyError {
    /// `check` rejected an operation immediately before it was issued —
    /// either the script was scheduled against a tree that has since
    /// diverged, or placeholder resolution produced a stale reference.
    #[error("Apply Error: operation is illegal against current tree state: {op}")]
    IllegalOperation { op: Operation },

    /// The orchestrator's path index has no entry for `id`. Every id a
    /// script references should have been seeded by the initial walk or
    /// inserted by a prior `Add*`/`RenameMove*` in the same run.
    #[error("Apply Error: no known local path for id {id}")]
    UnknownPath { id: Id },

    #[error("Apply Error: local collaborator failed")]
    Local {
        #[source]
        err: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Apply Error: cloud collaborator failed")]
    Cloud {
        #[source]
        err: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Apply Error: tree invariant violated while applying a checked operation")]
    Model(#[from] ModelError),
}

impl ApplyError {
    pub fn local(err: impl std::error::Error + Send + Sync + 'static) -> ApplyError {
        ApplyError::Local { err: Box::new(err) }
    }
    pub fn cloud(err: impl std::error::Error + Send + Sync + 'static) -> ApplyError {
        ApplyError::Cloud { err: Box::new(err) }
    }
}
