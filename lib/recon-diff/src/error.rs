use thiserror::Error;

use recon_model::Id;

#[derive(Error, Debug, PartialEq)]
pub enum DiffError {
    /// The same identifier names a file on one side and a directory on the
    /// other. The two trees being diffed are assumed to describe the same
    /// logical namespace, so this can only mean the caller fed in two
    /// unrelated snapshots.
    #[error("Reconciliation Diff Error: id {id} is a file on one side and a directory on the other")]
    IdKindMismatch { id: Id },
}
