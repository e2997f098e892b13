use std::collections::HashMap;
use std::path::{Path, PathBuf};

use recon_model::{ops, CloudFileMeta, Digests, Id, Operation, Tree};

use crate::error::ApplyError;
use crate::traits::{CloudCollaborator, LocalCollaborator};

fn parent_path(paths: &HashMap<Id, PathBuf>, parent_id: &Id) -> Result<PathBuf, ApplyError> {
    paths
        .get(parent_id)
        .cloned()
        .ok_or_else(|| ApplyError::UnknownPath {
            id: parent_id.clone(),
        })
}

fn current_path(paths: &HashMap<Id, PathBuf>, id: &Id) -> Result<PathBuf, ApplyError> {
    paths
        .get(id)
        .cloned()
        .ok_or_else(|| ApplyError::UnknownPath { id: id.clone() })
}

/// Applies `script` (a diff against the cloud snapshot, per §4.B scenario
/// 1) to the local filesystem through `local`, downloading new/changed
/// content through `cloud`. `paths` is the live id-to-path index seeded by
/// the initial walk; it is updated in place as directories are created,
/// renamed, or removed so later operations in the same script see a
/// consistent view.
pub async fn apply_local_script<L, C>(
    local: &L,
    cloud: &C,
    tree: &mut Tree,
    paths: &mut HashMap<Id, PathBuf>,
    script: &[Operation],
) -> Result<(), ApplyError>
where
    L: LocalCollaborator,
    C: CloudCollaborator,
{
    for op in script {
        if !ops::check(op, tree) {
            return Err(ApplyError::IllegalOperation { op: op.clone() });
        }

        match op {
            Operation::AddDir {
                parent_id,
                child_id,
                name,
            } => {
                let path = parent_path(paths, parent_id)?.join(name);
                local.mkdir(&path).await.map_err(ApplyError::local)?;
                local
                    .save_id(&path, child_id)
                    .await
                    .map_err(ApplyError::local)?;
                paths.insert(child_id.clone(), path);
            }

            Operation::AddFile {
                parent_id,
                child_id,
                name,
                size,
                ..
            } => {
                let path = parent_path(paths, parent_id)?.join(name);
                let mut writer = local.open_write(&path).await.map_err(ApplyError::local)?;
                cloud
                    .download(child_id, writer.as_mut(), *size, &Digests::new())
                    .await
                    .map_err(ApplyError::cloud)?;
                local
                    .save_id(&path, child_id)
                    .await
                    .map_err(ApplyError::local)?;
                paths.insert(child_id.clone(), path);
            }

            Operation::ModifyFile { id, size, .. } => {
                let path = current_path(paths, id)?;
                let mut writer = local.open_write(&path).await.map_err(ApplyError::local)?;
                cloud
                    .download(id, writer.as_mut(), *size, &Digests::new())
                    .await
                    .map_err(ApplyError::cloud)?;
            }

            Operation::DelFile { id } => {
                let path = current_path(paths, id)?;
                local.unlink(&path).await.map_err(ApplyError::local)?;
                paths.remove(id);
            }

            Operation::DelDir { id } => {
                let path = current_path(paths, id)?;
                local.rmdir(&path).await.map_err(ApplyError::local)?;
                paths.remove(id);
            }

            Operation::RenameMoveFile {
                id,
                name,
                destination_id,
            }
            | Operation::RenameMoveDir {
                id,
                name,
                destination_id,
            } => {
                let dest_path = rename_move_destination(paths, id, name, destination_id)?;
                let current = current_path(paths, id)?;
                local
                    .rename(&current, &dest_path)
                    .await
                    .map_err(ApplyError::local)?;
                paths.insert(id.clone(), dest_path);
            }
        }

        ops::apply(op, tree)?;
    }
    Ok(())
}

fn rename_move_destination(
    paths: &HashMap<Id, PathBuf>,
    id: &Id,
    name: &Option<String>,
    destination_id: &Option<Id>,
) -> Result<PathBuf, ApplyError> {
    let current = current_path(paths, id)?;
    let parent_dir = match destination_id {
        Some(dest) => parent_path(paths, dest)?,
        None => current
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let file_name = match name {
        Some(n) => n.clone(),
        None => current
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Ok(parent_dir.join(file_name))
}

fn resolve_placeholders(op: &Operation, map: &HashMap<Id, Id>) -> Operation {
    let resolve = |id: &Id| map.get(id).cloned().unwrap_or_else(|| id.clone());
    match op.clone() {
        Operation::AddFile {
            parent_id,
            child_id,
            name,
            size,
            cloud_meta,
        } => Operation::AddFile {
            parent_id: resolve(&parent_id),
            child_id,
            name,
            size,
            cloud_meta,
        },
        Operation::AddDir {
            parent_id,
            child_id,
            name,
        } => Operation::AddDir {
            parent_id: resolve(&parent_id),
            child_id,
            name,
        },
        Operation::DelFile { id } => Operation::DelFile { id: resolve(&id) },
        Operation::DelDir { id } => Operation::DelDir { id: resolve(&id) },
        Operation::ModifyFile {
            id,
            size,
            cloud_meta,
        } => Operation::ModifyFile {
            id: resolve(&id),
            size,
            cloud_meta,
        },
        Operation::RenameMoveFile {
            id,
            name,
            destination_id,
        } => Operation::RenameMoveFile {
            id: resolve(&id),
            name,
            destination_id: destination_id.map(|d| resolve(&d)),
        },
        Operation::RenameMoveDir {
            id,
            name,
            destination_id,
        } => Operation::RenameMoveDir {
            id: resolve(&id),
            name,
            destination_id: destination_id.map(|d| resolve(&d)),
        },
    }
}

/// Applies `script` (a diff against the local snapshot, per §4.B scenario
/// 2) to the cloud through `cloud`, reading content to upload from the
/// local filesystem through `local`. Placeholder identifiers minted for
/// locally-created nodes are rewritten against `placeholders` before each
/// operation is issued; a successful `AddFile`/`AddDir` registers its real
/// id in `placeholders` for every later operation in the same script.
pub async fn apply_cloud_script<C, L>(
    cloud: &C,
    local: &L,
    tree: &mut Tree,
    paths: &HashMap<Id, PathBuf>,
    placeholders: &mut HashMap<Id, Id>,
    script: &[Operation],
) -> Result<(), ApplyError>
where
    C: CloudCollaborator,
    L: LocalCollaborator,
{
    for op in script {
        let resolved = resolve_placeholders(op, placeholders);
        if !ops::check(&resolved, tree) {
            return Err(ApplyError::IllegalOperation { op: resolved });
        }

        let applied = match &resolved {
            Operation::AddDir {
                parent_id,
                child_id,
                name,
            } => {
                let real_id = cloud
                    .create_dir(parent_id, name)
                    .await
                    .map_err(ApplyError::cloud)?;
                if child_id.is_placeholder() {
                    placeholders.insert(child_id.clone(), real_id.clone());
                    if let Ok(path) = current_path(paths, child_id) {
                        local.save_id(&path, &real_id).await.map_err(ApplyError::local)?;
                    }
                }
                Operation::AddDir {
                    parent_id: parent_id.clone(),
                    child_id: real_id,
                    name: name.clone(),
                }
            }

            Operation::AddFile {
                parent_id,
                child_id,
                name,
                size,
                ..
            } => {
                let path = current_path(paths, child_id)?;
                let mut reader = local.open_read(&path).await.map_err(ApplyError::local)?;
                let cloud_file = cloud
                    .create_file(parent_id, name, reader.as_mut(), *size)
                    .await
                    .map_err(ApplyError::cloud)?;
                if child_id.is_placeholder() {
                    placeholders.insert(child_id.clone(), cloud_file.id.clone());
                    local
                        .save_id(&path, &cloud_file.id)
                        .await
                        .map_err(ApplyError::local)?;
                }
                Operation::AddFile {
                    parent_id: parent_id.clone(),
                    child_id: cloud_file.id.clone(),
                    name: name.clone(),
                    size: cloud_file.size,
                    cloud_meta: Some(CloudFileMeta {
                        e_tag: cloud_file.e_tag,
                        c_tag: cloud_file.c_tag,
                    }),
                }
            }

            Operation::ModifyFile { id, size, .. } => {
                let path = current_path(paths, id)?;
                let mut reader = local.open_read(&path).await.map_err(ApplyError::local)?;
                let cloud_file = cloud
                    .upload(id, reader.as_mut(), *size)
                    .await
                    .map_err(ApplyError::cloud)?;
                Operation::ModifyFile {
                    id: id.clone(),
                    size: cloud_file.size,
                    cloud_meta: Some(CloudFileMeta {
                        e_tag: cloud_file.e_tag,
                        c_tag: cloud_file.c_tag,
                    }),
                }
            }

            Operation::DelFile { id } => {
                cloud.delete(id).await.map_err(ApplyError::cloud)?;
                resolved.clone()
            }

            Operation::DelDir { id } => {
                cloud.delete(id).await.map_err(ApplyError::cloud)?;
                resolved.clone()
            }

            Operation::RenameMoveFile {
                id,
                name,
                destination_id,
            }
            | Operation::RenameMoveDir {
                id,
                name,
                destination_id,
            } => {
                cloud
                    .rename_move(id, name.as_deref(), destination_id.as_ref())
                    .await
                    .map_err(ApplyError::cloud)?;
                resolved.clone()
            }
        };

        ops::apply(&applied, tree)?;
    }
    Ok(())
}
