use super::Id;

/// Metadata carried only by operations that originate from, or are
/// acknowledged by, the cloud side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloudFileMeta {
    pub e_tag: String,
    pub c_tag: String,
}

/// An immutable, structurally-comparable change to a single node. Scripts
/// are plain `Vec<Operation>`; change sets are `HashSet<Operation>` (adds
/// are deduplicated by their full field set, since a freshly-minted child
/// id makes every genuine add distinct).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    AddFile {
        parent_id: Id,
        child_id: Id,
        name: String,
        size: u64,
        cloud_meta: Option<CloudFileMeta>,
    },
    DelFile {
        id: Id,
    },
    ModifyFile {
        id: Id,
        size: u64,
        cloud_meta: Option<CloudFileMeta>,
    },
    RenameMoveFile {
        id: Id,
        name: Option<String>,
        destination_id: Option<Id>,
    },
    AddDir {
        parent_id: Id,
        child_id: Id,
        name: String,
    },
    DelDir {
        id: Id,
    },
    RenameMoveDir {
        id: Id,
        name: Option<String>,
        destination_id: Option<Id>,
    },
}

impl Operation {
    /// The id of the node this operation principally concerns. For adds
    /// this is the freshly-minted child, which is why adds never collide
    /// in the conflict detector (§4.C excludes them by construction there
    /// too, but this makes the "same identifier" grouping key explicit).
    pub fn subject_id(&self) -> &Id {
        match self {
            Operation::AddFile { child_id, .. } => child_id,
            Operation::DelFile { id } => id,
            Operation::ModifyFile { id, .. } => id,
            Operation::RenameMoveFile { id, .. } => id,
            Operation::AddDir { child_id, .. } => child_id,
            Operation::DelDir { id } => id,
            Operation::RenameMoveDir { id, .. } => id,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Operation::AddFile { .. } | Operation::AddDir { .. })
    }

    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            Operation::AddFile { .. } | Operation::ModifyFile { .. }
        )
    }

    pub fn is_file_kind(&self) -> bool {
        matches!(
            self,
            Operation::AddFile { .. }
                | Operation::DelFile { .. }
                | Operation::ModifyFile { .. }
                | Operation::RenameMoveFile { .. }
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::AddFile {
                parent_id,
                child_id,
                name,
                ..
            } => write!(
                f,
                "create file {name} with id {child_id} under directory {parent_id}"
            ),
            Operation::DelFile { id } => write!(f, "remove file {id}"),
            Operation::ModifyFile { id, .. } => write!(f, "overwrite content of file {id}"),
            Operation::RenameMoveFile {
                id,
                name,
                destination_id,
            } => fmt_rename_move(f, "file", id, name, destination_id),
            Operation::AddDir {
                parent_id,
                child_id,
                name,
            } => write!(
                f,
                "create directory {name} with id {child_id} under directory {parent_id}"
            ),
            Operation::DelDir { id } => write!(f, "remove directory {id}"),
            Operation::RenameMoveDir {
                id,
                name,
                destination_id,
            } => fmt_rename_move(f, "directory", id, name, destination_id),
        }
    }
}

fn fmt_rename_move(
    f: &mut std::fmt::Formatter<'_>,
    kind: &str,
    id: &Id,
    name: &Option<String>,
    destination_id: &Option<Id>,
) -> std::fmt::Result {
    match (name, destination_id) {
        (Some(name), None) => write!(f, "rename {kind} {id} to {name}"),
        (None, Some(dest)) => write!(f, "move {kind} {id} to directory {dest}"),
        (Some(name), Some(dest)) => {
            write!(f, "move {kind} {id} to directory {dest} and rename to {name}")
        }
        (None, None) => write!(f, "no-op rename/move on {kind} {id}"),
    }
}
