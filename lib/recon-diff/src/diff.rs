use std::collections::HashSet;

use recon_model::{CloudFileMeta, File, Id, Operation, Tree};

use crate::error::DiffError;

/// Computes the set of operations that turn `before` into `after`, treating
/// files and directories independently. `file_equivalent` decides, for a
/// file present unchanged in both trees, whether its content also needs an
/// accompanying `ModifyFile` — see the `comparators` module for the three
/// ways the engine instantiates it.
pub fn diff(
    before: &Tree,
    after: &Tree,
    file_equivalent: impl Fn(&File, &File) -> bool,
) -> Result<HashSet<Operation>, DiffError> {
    let mut ops = HashSet::new();

    let mut file_ids: HashSet<&Id> = before.files().keys().collect();
    file_ids.extend(after.files().keys());
    for id in file_ids {
        if before.dirs().contains_key(id) || after.dirs().contains_key(id) {
            return Err(DiffError::IdKindMismatch { id: id.clone() });
        }
        match (before.files().get(id), after.files().get(id)) {
            (None, Some(a)) => {
                ops.insert(Operation::AddFile {
                    parent_id: a.parent().clone(),
                    child_id: id.clone(),
                    name: a.name().to_string(),
                    size: a.size(),
                    cloud_meta: a.as_cloud().map(|c| CloudFileMeta {
                        e_tag: c.e_tag.clone(),
                        c_tag: c.c_tag.clone(),
                    }),
                });
            }
            (Some(_), None) => {
                ops.insert(Operation::DelFile { id: id.clone() });
            }
            (Some(b), Some(a)) => {
                let moved = b.parent() != a.parent();
                let renamed = b.name() != a.name();
                if moved || renamed {
                    ops.insert(Operation::RenameMoveFile {
                        id: id.clone(),
                        name: renamed.then(|| a.name().to_string()),
                        destination_id: moved.then(|| a.parent().clone()),
                    });
                }
                if !file_equivalent(b, a) {
                    ops.insert(Operation::ModifyFile {
                        id: id.clone(),
                        size: a.size(),
                        cloud_meta: a.as_cloud().map(|c| CloudFileMeta {
                            e_tag: c.e_tag.clone(),
                            c_tag: c.c_tag.clone(),
                        }),
                    });
                }
            }
            (None, None) => unreachable!("id came from the union of both key sets"),
        }
    }

    let mut dir_ids: HashSet<&Id> = before.dirs().keys().collect();
    dir_ids.extend(after.dirs().keys());
    for id in dir_ids {
        if *id == *before.root_id() || *id == *after.root_id() {
            continue;
        }
        if before.files().contains_key(id) || after.files().contains_key(id) {
            return Err(DiffError::IdKindMismatch { id: id.clone() });
        }
        match (before.dirs().get(id), after.dirs().get(id)) {
            (None, Some(a)) => {
                ops.insert(Operation::AddDir {
                    parent_id: a.parent.clone().expect("non-root directory has a parent"),
                    child_id: id.clone(),
                    name: a.name.clone().expect("non-root directory has a name"),
                });
            }
            (Some(_), None) => {
                ops.insert(Operation::DelDir { id: id.clone() });
            }
            (Some(b), Some(a)) => {
                let moved = b.parent != a.parent;
                let renamed = b.name != a.name;
                if moved || renamed {
                    ops.insert(Operation::RenameMoveDir {
                        id: id.clone(),
                        name: renamed.then(|| a.name.clone().unwrap()),
                        destination_id: moved.then(|| a.parent.clone().unwrap()),
                    });
                }
            }
            (None, None) => unreachable!("id came from the union of both key sets"),
        }
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::diff;
    use recon_model::{Directory, File, Id, LocalFile, Operation, Tree};

    fn mkfile(id: &str, name: &str, parent: &str, size: u64) -> File {
        File::Local(LocalFile {
            id: Id::real(id),
            name: name.to_string(),
            parent: Id::real(parent),
            size,
            mtime_ns: 0,
        })
    }

    fn always_equivalent(_b: &File, _a: &File) -> bool {
        true
    }

    #[test]
    fn diff_of_identical_trees_is_empty() {
        let mut tree = Tree::new(Id::real("root"));
        tree.files_mut()
            .insert(Id::real("f1"), mkfile("f1", "a", "root", 1));
        tree.reconstruct_by_parents();

        let ops = diff(&tree, &tree, always_equivalent).unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn diff_detects_add_and_delete() {
        let mut before = Tree::new(Id::real("root"));
        before
            .files_mut()
            .insert(Id::real("f1"), mkfile("f1", "a", "root", 1));
        before.reconstruct_by_parents();

        let mut after = Tree::new(Id::real("root"));
        after
            .files_mut()
            .insert(Id::real("f2"), mkfile("f2", "b", "root", 1));
        after.reconstruct_by_parents();

        let ops = diff(&before, &after, always_equivalent).unwrap();
        assert!(ops.contains(&Operation::DelFile { id: Id::real("f1") }));
        assert!(ops.iter().any(|op| matches!(
            op,
            Operation::AddFile { child_id, .. } if *child_id == Id::real("f2")
        )));
    }

    #[test]
    fn diff_detects_rename_and_modify_independently() {
        let mut before = Tree::new(Id::real("root"));
        before
            .files_mut()
            .insert(Id::real("f1"), mkfile("f1", "a", "root", 1));
        before.reconstruct_by_parents();

        let mut after = Tree::new(Id::real("root"));
        after
            .files_mut()
            .insert(Id::real("f1"), mkfile("f1", "b", "root", 2));
        after.reconstruct_by_parents();

        let ops = diff(&before, &after, |_b, _a| false).unwrap();
        assert!(ops.contains(&Operation::RenameMoveFile {
            id: Id::real("f1"),
            name: Some("b".to_string()),
            destination_id: None,
        }));
        assert!(ops
            .iter()
            .any(|op| matches!(op, Operation::ModifyFile { id, .. } if *id == Id::real("f1"))));
    }

    #[test]
    fn diff_detects_dir_move() {
        let mut before = Tree::new(Id::real("root"));
        before.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        before.dirs_mut().insert(
            Id::real("d2"),
            Directory::new(Id::real("d2"), "d2", Id::real("root")),
        );
        before.reconstruct_by_parents();

        let mut after = before.clone();
        after.dirs_mut().get_mut(&Id::real("d1")).unwrap().parent = Some(Id::real("d2"));
        after.reconstruct_by_parents();

        let ops = diff(&before, &after, always_equivalent).unwrap();
        assert!(ops.contains(&Operation::RenameMoveDir {
            id: Id::real("d1"),
            name: None,
            destination_id: Some(Id::real("d2")),
        }));
    }
}
