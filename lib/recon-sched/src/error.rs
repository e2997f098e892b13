use thiserror::Error;

use recon_model::{Id, Operation};

/// Which of the four ambiguous concurrent-edit shapes a conflicting pair
/// falls into. Carried on [`SchedError::AmbiguousEdit`] so the caller can
/// render a precise message without re-deriving it from the two operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityKind {
    ModifyOfDeleted,
    DoubleModify,
    DoubleRename,
    DoubleMove,
}

impl std::fmt::Display for AmbiguityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AmbiguityKind::ModifyOfDeleted => "modify of deleted",
            AmbiguityKind::DoubleModify => "double modify",
            AmbiguityKind::DoubleRename => "double rename",
            AmbiguityKind::DoubleMove => "double move",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SchedError {
    /// Operator intervention required: the same node was changed
    /// incompatibly on both sides since the last sync. Nothing has been
    /// applied yet.
    #[error("Reconciliation Scheduler Error: ambiguous concurrent edit ({kind}) on {id}\ncloud: {cloud_op}\nlocal: {local_op}")]
    AmbiguousEdit {
        id: Id,
        kind: AmbiguityKind,
        cloud_op: String,
        local_op: String,
    },

    /// The same identifier is a file on one side and a directory on the
    /// other. Indicates a bug upstream (the diff or the input trees), not
    /// an operator-correctable condition.
    #[error("Reconciliation Scheduler Error: id {id} is a file in one change set and a directory in the other")]
    IdKindMismatch { id: Id },

    /// Kahn peeling terminated with non-deferred operations still
    /// unscheduled: the dependency graph has a cycle. This can only happen
    /// if `check_same_node_operations` missed a conflict or the diff
    /// produced an inconsistent script.
    #[error("Reconciliation Scheduler Error: cyclic dependency, {remaining} operations could not be scheduled")]
    CyclicDependency { remaining: usize },

    /// `field_test` found an operation that `check` rejects against the
    /// tree it should apply cleanly to. Signifies a bug in the engine.
    #[error("Reconciliation Scheduler Error: field test failed, operation is illegal: {op}")]
    FieldTestFailed { op: Operation },
}
