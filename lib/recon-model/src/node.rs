use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::Id;

/// `algorithm -> digest` (digest stored uppercase hex, matching the cloud's
/// own casing so comparisons can be done case-insensitively at the edges
/// only, per §4.B scenario 3).
pub type Digests = BTreeMap<String, String>;

/// Workaround for an upstream bug where the reported size of certain cloud
/// items is wrong: every size comparison in the engine must go through
/// [`compatible_size`] rather than comparing the fields directly, so the
/// workaround can be lifted in one place if the bug is ever fixed upstream.
pub fn compatible_size(_before: u64, _after: u64) -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFile {
    pub id: Id,
    pub name: String,
    pub parent: Id,
    pub size: u64,
    pub e_tag: String,
    pub c_tag: String,
    pub hashes: Digests,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFile {
    pub id: Id,
    pub name: String,
    pub parent: Id,
    pub size: u64,
    pub mtime_ns: i128,
}

/// A file node, specialized by which side of the sync produced it. The
/// engine only ever needs the common fields (`id`/`name`/`parent`/`size`)
/// for tree invariants and diffing; the specialization matters only to the
/// comparator a particular diff is parameterized with.
///
/// `Bare` is what a generic `AddFile`/`ModifyFile` (one with no
/// `cloud_meta`) produces when applied to a tree the engine isn't
/// otherwise populating with side-specific metadata — mirrors the plain
/// base file representation the diff/schedule/field-test stages operate
/// on before a collaborator specializes a node with real metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum File {
    Cloud(CloudFile),
    Local(LocalFile),
    Bare {
        id: Id,
        name: String,
        parent: Id,
        size: u64,
    },
}

impl File {
    pub fn id(&self) -> &Id {
        match self {
            File::Cloud(f) => &f.id,
            File::Local(f) => &f.id,
            File::Bare { id, .. } => id,
        }
    }
    pub fn name(&self) -> &str {
        match self {
            File::Cloud(f) => &f.name,
            File::Local(f) => &f.name,
            File::Bare { name, .. } => name,
        }
    }
    pub fn parent(&self) -> &Id {
        match self {
            File::Cloud(f) => &f.parent,
            File::Local(f) => &f.parent,
            File::Bare { parent, .. } => parent,
        }
    }
    pub fn size(&self) -> u64 {
        match self {
            File::Cloud(f) => f.size,
            File::Local(f) => f.size,
            File::Bare { size, .. } => *size,
        }
    }
    pub fn as_cloud(&self) -> Option<&CloudFile> {
        match self {
            File::Cloud(f) => Some(f),
            _ => None,
        }
    }
    pub fn as_local(&self) -> Option<&LocalFile> {
        match self {
            File::Local(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub id: Id,
    /// `None` only for the root directory.
    pub name: Option<String>,
    /// `None` only for the root directory.
    pub parent: Option<Id>,
    pub dirs: HashSet<Id>,
    pub files: HashSet<Id>,
}

impl Directory {
    pub fn root(id: Id) -> Directory {
        Directory {
            id,
            name: None,
            parent: None,
            dirs: HashSet::new(),
            files: HashSet::new(),
        }
    }
    pub fn new(id: Id, name: impl ToString, parent: Id) -> Directory {
        Directory {
            id,
            name: Some(name.to_string()),
            parent: Some(parent),
            dirs: HashSet::new(),
            files: HashSet::new(),
        }
    }
}
