use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use recon_apply::{LocalCollaborator, WalkEntry};
use recon_model::Id;

use crate::error::{inerr, LocalFsError};
use crate::walk::{load_id_sync, save_id_sync, walk};

pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> LocalFs {
        LocalFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl LocalCollaborator for LocalFs {
    type Error = LocalFsError;

    async fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>, Self::Error> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk(&root))
            .await
            .map_err(|err| inerr("walk")(std::io::Error::other(err)))?
    }

    async fn save_id(&self, path: &Path, id: &Id) -> Result<(), Self::Error> {
        let path = path.to_path_buf();
        let id = id.clone();
        tokio::task::spawn_blocking(move || save_id_sync(&path, &id))
            .await
            .map_err(|err| inerr("save_id")(std::io::Error::other(err)))?
    }

    async fn load_id(&self, path: &Path) -> Result<Option<Id>, Self::Error> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || load_id_sync(&path))
            .await
            .map_err(|err| inerr("load_id")(std::io::Error::other(err)))?
    }

    async fn rename(&self, src: &Path, dst: &Path) -> Result<(), Self::Error> {
        let errctx = format!("could not rename {} to {}", src.display(), dst.display());
        tokio::fs::rename(src, dst).await.map_err(inerr(errctx))
    }

    async fn mkdir(&self, path: &Path) -> Result<(), Self::Error> {
        let errctx = format!("could not create directory at {}", path.display());
        tokio::fs::create_dir(path).await.map_err(inerr(errctx))
    }

    async fn rmdir(&self, path: &Path) -> Result<(), Self::Error> {
        let errctx = format!("could not remove directory at {}", path.display());
        tokio::fs::remove_dir(path).await.map_err(inerr(errctx))
    }

    async fn unlink(&self, path: &Path) -> Result<(), Self::Error> {
        let errctx = format!("could not remove file at {}", path.display());
        tokio::fs::remove_file(path).await.map_err(inerr(errctx))
    }

    async fn open_read(&self, path: &Path) -> Result<Box<dyn AsyncRead + Unpin + Send>, Self::Error> {
        let errctx = format!("could not open {} for reading", path.display());
        let file = tokio::fs::File::open(path).await.map_err(inerr(errctx))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, path: &Path) -> Result<Box<dyn AsyncWrite + Unpin + Send>, Self::Error> {
        let errctx = format!("could not open {} for writing", path.display());
        let file = tokio::fs::File::create(path).await.map_err(inerr(errctx))?;
        Ok(Box::new(file))
    }
}
