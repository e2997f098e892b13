use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use recon_model::{CloudFile, Digests, Id};

/// One entry discovered by [`LocalCollaborator::walk`]. `id_candidate` is
/// whatever was found in the path's extended attribute, if anything —
/// callers are responsible for normalizing duplicates (§6) before minting
/// placeholders for entries that end up with none.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub id_candidate: Option<Id>,
    pub size: u64,
    pub mtime_ns: i128,
}

/// The local filesystem side of a sync run. Implementations own no state
/// beyond what is necessary to talk to the OS; the engine threads its own
/// id-to-path bookkeeping through the apply orchestrator instead of asking
/// collaborators to remember it.
#[async_trait]
pub trait LocalCollaborator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>, Self::Error>;

    async fn save_id(&self, path: &Path, id: &Id) -> Result<(), Self::Error>;
    async fn load_id(&self, path: &Path) -> Result<Option<Id>, Self::Error>;

    async fn rename(&self, src: &Path, dst: &Path) -> Result<(), Self::Error>;
    async fn mkdir(&self, path: &Path) -> Result<(), Self::Error>;
    async fn rmdir(&self, path: &Path) -> Result<(), Self::Error>;
    async fn unlink(&self, path: &Path) -> Result<(), Self::Error>;

    async fn open_read(&self, path: &Path) -> Result<Box<dyn AsyncRead + Unpin + Send>, Self::Error>;
    async fn open_write(&self, path: &Path) -> Result<Box<dyn AsyncWrite + Unpin + Send>, Self::Error>;
}

/// One change event from the cloud's delta feed.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaItem {
    Deleted {
        id: Id,
    },
    Folder {
        id: Id,
        parent_id: Id,
        name: String,
    },
    File {
        id: Id,
        parent_id: Id,
        name: String,
        size: u64,
        e_tag: String,
        c_tag: String,
        hashes: Digests,
    },
}

/// The cloud side of a sync run.
#[async_trait]
pub trait CloudCollaborator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn delta(
        &self,
        root_id: &Id,
        delta_token: Option<&str>,
    ) -> Result<(Vec<DeltaItem>, String), Self::Error>;

    async fn create_dir(&self, parent: &Id, name: &str) -> Result<Id, Self::Error>;

    async fn create_file(
        &self,
        parent: &Id,
        name: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
    ) -> Result<CloudFile, Self::Error>;

    async fn upload(
        &self,
        id: &Id,
        content: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
    ) -> Result<CloudFile, Self::Error>;

    async fn delete(&self, id: &Id) -> Result<(), Self::Error>;

    async fn rename_move(
        &self,
        id: &Id,
        name: Option<&str>,
        destination: Option<&Id>,
    ) -> Result<(), Self::Error>;

    async fn download(
        &self,
        id: &Id,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        size: u64,
        digests: &Digests,
    ) -> Result<(), Self::Error>;
}
