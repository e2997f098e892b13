use super::error::ModelError;
use super::node::{CloudFile, File};
use super::operation::Operation;
use super::tree::Tree;
use super::Id;

/// Evaluates whether `op` is legal against the current state of `tree`.
/// Never mutates. See §4.A of the specification for the rule table.
pub fn check(op: &Operation, tree: &Tree) -> bool {
    match op {
        Operation::AddFile {
            parent_id, name, ..
        }
        | Operation::AddDir {
            parent_id, name, ..
        } => tree.dirs().contains_key(parent_id) && !tree.list_names(parent_id).contains(name.as_str()),

        Operation::DelFile { id } => tree.files().contains_key(id),

        Operation::ModifyFile { id, .. } => tree.files().contains_key(id),

        Operation::DelDir { id } => match tree.dirs().get(id) {
            Some(dir) => dir.files.is_empty() && dir.dirs.is_empty(),
            None => false,
        },

        Operation::RenameMoveFile {
            id,
            name,
            destination_id,
        } => {
            let Some(file) = tree.files().get(id) else {
                return false;
            };
            check_rename_move(tree, file.parent(), file.name(), name, destination_id)
        }

        Operation::RenameMoveDir {
            id,
            name,
            destination_id,
        } => {
            let Some(dir) = tree.dirs().get(id) else {
                return false;
            };
            let Some(parent) = &dir.parent else {
                return false;
            };
            let dir_name = dir.name.as_deref().unwrap_or_default();
            check_rename_move(tree, parent, dir_name, name, destination_id)
        }
    }
}

fn check_rename_move(
    tree: &Tree,
    current_parent: &Id,
    current_name: &str,
    name: &Option<String>,
    destination_id: &Option<Id>,
) -> bool {
    match destination_id {
        Some(dest) => {
            if !tree.dirs().contains_key(dest) {
                return false;
            }
            let effective_name = name.as_deref().unwrap_or(current_name);
            !tree.list_names(dest).contains(effective_name)
        }
        None => match name {
            Some(name) => !tree.list_names(current_parent).contains(name.as_str()),
            None => true,
        },
    }
}

/// Mutates `tree` to reflect `op`, assuming `check(op, tree)` held. Callers
/// that cannot guarantee legality (anything but the field-test validator
/// and the apply orchestrator, both of which call `check` first) should not
/// call this directly.
pub fn apply(op: &Operation, tree: &mut Tree) -> Result<(), ModelError> {
    match op {
        Operation::AddFile {
            parent_id,
            child_id,
            name,
            size,
            cloud_meta,
        } => {
            let file = match cloud_meta {
                Some(meta) => File::Cloud(CloudFile {
                    id: child_id.clone(),
                    name: name.clone(),
                    parent: parent_id.clone(),
                    size: *size,
                    e_tag: meta.e_tag.clone(),
                    c_tag: meta.c_tag.clone(),
                    hashes: Default::default(),
                }),
                None => File::Bare {
                    id: child_id.clone(),
                    name: name.clone(),
                    parent: parent_id.clone(),
                    size: *size,
                },
            };
            tree.files_mut().insert(child_id.clone(), file);
            tree.dirs_mut()
                .get_mut(parent_id)
                .ok_or_else(|| ModelError::NoSuchDirectory {
                    parent_id: parent_id.clone(),
                })?
                .files
                .insert(child_id.clone());
            Ok(())
        }

        Operation::DelFile { id } => {
            let file = tree
                .files_mut()
                .remove(id)
                .ok_or_else(|| ModelError::NoSuchFile { id: id.clone() })?;
            if let Some(parent) = tree.dirs_mut().get_mut(file.parent()) {
                parent.files.remove(id);
            }
            Ok(())
        }

        Operation::ModifyFile {
            id,
            size,
            cloud_meta,
        } => {
            let file = tree
                .files_mut()
                .get_mut(id)
                .ok_or_else(|| ModelError::NoSuchFile { id: id.clone() })?;
            match file {
                File::Cloud(f) => {
                    f.size = *size;
                    if let Some(meta) = cloud_meta {
                        f.e_tag = meta.e_tag.clone();
                        f.c_tag = meta.c_tag.clone();
                    }
                }
                File::Local(f) => f.size = *size,
                File::Bare { size: s, .. } => *s = *size,
            }
            Ok(())
        }

        Operation::RenameMoveFile {
            id,
            name,
            destination_id,
        } => {
            let old_parent = tree
                .files()
                .get(id)
                .ok_or_else(|| ModelError::NoSuchFile { id: id.clone() })?
                .parent()
                .clone();

            if let Some(new_name) = name {
                let file = tree.files_mut().get_mut(id).unwrap();
                match file {
                    File::Cloud(f) => f.name = new_name.clone(),
                    File::Local(f) => f.name = new_name.clone(),
                    File::Bare { name: n, .. } => *n = new_name.clone(),
                }
            }
            if let Some(dest) = destination_id {
                {
                    let file = tree.files_mut().get_mut(id).unwrap();
                    match file {
                        File::Cloud(f) => f.parent = dest.clone(),
                        File::Local(f) => f.parent = dest.clone(),
                        File::Bare { parent: p, .. } => *p = dest.clone(),
                    }
                }
                tree.dirs_mut()
                    .get_mut(&old_parent)
                    .ok_or_else(|| ModelError::NoSuchDirectory {
                        parent_id: old_parent.clone(),
                    })?
                    .files
                    .remove(id);
                tree.dirs_mut()
                    .get_mut(dest)
                    .ok_or_else(|| ModelError::NoSuchDirectory {
                        parent_id: dest.clone(),
                    })?
                    .files
                    .insert(id.clone());
            }
            Ok(())
        }

        Operation::AddDir {
            parent_id,
            child_id,
            name,
        } => {
            tree.dirs_mut().insert(
                child_id.clone(),
                super::node::Directory::new(child_id.clone(), name, parent_id.clone()),
            );
            tree.dirs_mut()
                .get_mut(parent_id)
                .ok_or_else(|| ModelError::NoSuchDirectory {
                    parent_id: parent_id.clone(),
                })?
                .dirs
                .insert(child_id.clone());
            Ok(())
        }

        Operation::DelDir { id } => {
            let dir = tree
                .dirs_mut()
                .remove(id)
                .ok_or_else(|| ModelError::NoSuchFile { id: id.clone() })?;
            if let Some(parent) = &dir.parent {
                if let Some(parent) = tree.dirs_mut().get_mut(parent) {
                    parent.dirs.remove(id);
                }
            }
            Ok(())
        }

        Operation::RenameMoveDir {
            id,
            name,
            destination_id,
        } => {
            let old_parent = tree
                .dirs()
                .get(id)
                .ok_or_else(|| ModelError::NoSuchFile { id: id.clone() })?
                .parent
                .clone();

            if let Some(new_name) = name {
                tree.dirs_mut().get_mut(id).unwrap().name = Some(new_name.clone());
            }
            if let Some(dest) = destination_id {
                tree.dirs_mut().get_mut(id).unwrap().parent = Some(dest.clone());
                if let Some(old_parent) = &old_parent {
                    if let Some(parent) = tree.dirs_mut().get_mut(old_parent) {
                        parent.dirs.remove(id);
                    }
                }
                tree.dirs_mut()
                    .get_mut(dest)
                    .ok_or_else(|| ModelError::NoSuchDirectory {
                        parent_id: dest.clone(),
                    })?
                    .dirs
                    .insert(id.clone());
            }
            Ok(())
        }
    }
}

/// Removes a directory and its whole subtree from the index, regardless of
/// whether it is empty. Unlike [`apply`] for `DelDir` — which `check`
/// forbids when the directory has children — this is only meant for
/// trusted bulk contexts (post-processing a delta feed that already
/// reports every removed descendant as its own event) where the caller
/// has independently established that the subtree is meant to disappear.
pub fn force_delete_subtree(id: &Id, tree: &mut Tree) {
    let Some(dir) = tree.dirs_mut().remove(id) else {
        return;
    };
    if let Some(parent) = &dir.parent {
        if let Some(parent) = tree.dirs_mut().get_mut(parent) {
            parent.dirs.remove(id);
        }
    }
    for child_dir in dir.dirs.clone() {
        force_delete_subtree(&child_dir, tree);
    }
    for child_file in dir.files {
        tree.files_mut().remove(&child_file);
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, check};
    use crate::{Directory, File, Id, LocalFile, Operation, Tree};

    fn tree_with_dir() -> Tree {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        tree.reconstruct_by_parents();
        tree
    }

    #[test]
    fn add_file_checks_parent_and_name() {
        let tree = tree_with_dir();
        let op = Operation::AddFile {
            parent_id: Id::real("d1"),
            child_id: Id::real("f1"),
            name: "a.txt".into(),
            size: 10,
            cloud_meta: None,
        };
        assert!(check(&op, &tree));

        let op_missing_parent = Operation::AddFile {
            parent_id: Id::real("nope"),
            child_id: Id::real("f1"),
            name: "a.txt".into(),
            size: 10,
            cloud_meta: None,
        };
        assert!(!check(&op_missing_parent, &tree));
    }

    #[test]
    fn apply_add_file_preserves_invariants() {
        let mut tree = tree_with_dir();
        let op = Operation::AddFile {
            parent_id: Id::real("d1"),
            child_id: Id::real("f1"),
            name: "a.txt".into(),
            size: 10,
            cloud_meta: None,
        };
        assert!(check(&op, &tree));
        apply(&op, &mut tree).unwrap();

        assert!(tree.files().contains_key(&Id::real("f1")));
        assert!(tree.dirs()[&Id::real("d1")].files.contains(&Id::real("f1")));
        assert!(!check(&op, &tree), "name is no longer free");
    }

    #[test]
    fn del_dir_requires_empty() {
        let mut tree = tree_with_dir();
        tree.files_mut().insert(
            Id::real("f1"),
            File::Local(LocalFile {
                id: Id::real("f1"),
                name: "f1".into(),
                parent: Id::real("d1"),
                size: 0,
                mtime_ns: 0,
            }),
        );
        tree.reconstruct_by_parents();

        let op = Operation::DelDir { id: Id::real("d1") };
        assert!(!check(&op, &tree));

        apply(
            &Operation::DelFile { id: Id::real("f1") },
            &mut tree,
        )
        .unwrap();
        assert!(check(&op, &tree));
    }

    #[test]
    fn rename_move_file_checks_destination_name_collision() {
        let mut tree = tree_with_dir();
        tree.files_mut().insert(
            Id::real("f1"),
            File::Local(LocalFile {
                id: Id::real("f1"),
                name: "a".into(),
                parent: Id::real("root"),
                size: 0,
                mtime_ns: 0,
            }),
        );
        tree.reconstruct_by_parents();
        tree.dirs_mut().insert(
            Id::real("d2"),
            Directory::new(Id::real("d2"), "d2", Id::real("root")),
        );
        tree.reconstruct_by_parents();

        let move_ok = Operation::RenameMoveFile {
            id: Id::real("f1"),
            name: None,
            destination_id: Some(Id::real("d2")),
        };
        assert!(check(&move_ok, &tree));
        apply(&move_ok, &mut tree).unwrap();
        assert_eq!(tree.files()[&Id::real("f1")].parent(), &Id::real("d2"));
        assert!(tree.dirs()[&Id::real("d2")].files.contains(&Id::real("f1")));
        assert!(!tree.dirs()[&Id::real("root")].files.contains(&Id::real("f1")));
    }
}
