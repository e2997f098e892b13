use std::path::{Path, PathBuf};

use recon_apply::WalkEntry;

use crate::error::{inerr, LocalFsError};
use crate::ID_XATTR_KEY;

/// Depth-first enumeration of `root`, reading each entry's id candidate
/// from its extended attribute (absent for anything the engine has never
/// seen, duplicated when a file manager copied an already-tracked entry).
/// Manual recursion over `std::fs::read_dir` rather than pulling in a
/// directory-walking crate.
pub fn walk(root: &Path) -> Result<Vec<WalkEntry>, LocalFsError> {
    let mut entries = Vec::new();
    walk_into(root, &mut entries)?;
    Ok(entries)
}

fn walk_into(dir: &Path, out: &mut Vec<WalkEntry>) -> Result<(), LocalFsError> {
    let errctx = format!("could not walk directory at {}", dir.display());
    let read_dir = std::fs::read_dir(dir).map_err(inerr(errctx.clone()))?;

    for entry in read_dir {
        let entry = entry.map_err(inerr(errctx.clone()))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(inerr(errctx.clone()))?;
        let id_candidate = load_id_sync(&path)?;

        if metadata.is_dir() {
            out.push(WalkEntry {
                path: path.clone(),
                is_dir: true,
                id_candidate,
                size: 0,
                mtime_ns: 0,
            });
            walk_into(&path, out)?;
        } else {
            let mtime_ns = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_nanos() as i128)
                .unwrap_or(0);
            out.push(WalkEntry {
                path,
                is_dir: false,
                id_candidate,
                size: metadata.len(),
                mtime_ns,
            });
        }
    }
    Ok(())
}

pub fn load_id_sync(path: &Path) -> Result<Option<recon_model::Id>, LocalFsError> {
    let errctx = format!("could not read id attribute of {}", path.display());
    match xattr::get(path, ID_XATTR_KEY).map_err(inerr(errctx))? {
        Some(bytes) => {
            let s = String::from_utf8(bytes).map_err(|_| LocalFsError::NonUtf8Path {
                path: PathBuf::from(path),
            })?;
            Ok(Some(recon_model::Id::real(s)))
        }
        None => Ok(None),
    }
}

pub fn save_id_sync(path: &Path, id: &recon_model::Id) -> Result<(), LocalFsError> {
    let errctx = format!("could not write id attribute of {}", path.display());
    xattr::set(path, ID_XATTR_KEY, id.as_str().as_bytes()).map_err(inerr(errctx))
}
