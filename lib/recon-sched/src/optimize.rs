use std::collections::HashSet;

use recon_model::{Id, Operation, Tree};

fn has_deleted_ancestor(tree: &Tree, id: &Id, deleted_dirs: &HashSet<&Id>) -> bool {
    let mut current = tree
        .dirs()
        .get(id)
        .map(|dir| dir.parent.clone())
        .unwrap_or_else(|| tree.files().get(id).map(|f| f.parent().clone()));

    while let Some(parent) = current {
        if deleted_dirs.contains(&parent) {
            return true;
        }
        current = tree.dirs().get(&parent).and_then(|d| d.parent.clone());
    }
    false
}

/// Drops any `DelFile`/`DelDir` whose ancestor chain (evaluated against the
/// pre-state `tree`) already contains a `DelDir` from the same script: the
/// cloud removes a directory's whole subtree on one call, so issuing the
/// descendants' own delete calls is redundant traffic. Purely a throughput
/// optimization — the script is correct with or without it.
pub fn optimize_cloud_deletion(script: Vec<Operation>, tree: &Tree) -> Vec<Operation> {
    let deleted_dirs: HashSet<&Id> = script
        .iter()
        .filter_map(|op| match op {
            Operation::DelDir { id } => Some(id),
            _ => None,
        })
        .collect();

    script
        .into_iter()
        .filter(|op| {
            let id = match op {
                Operation::DelFile { id } | Operation::DelDir { id } => id,
                _ => return true,
            };
            !has_deleted_ancestor(tree, id, &deleted_dirs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::optimize_cloud_deletion;
    use recon_model::{Directory, File, Id, LocalFile, Operation, Tree};

    fn tree_with_nested_subtree() -> Tree {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        tree.dirs_mut().insert(
            Id::real("d2"),
            Directory::new(Id::real("d2"), "d2", Id::real("d1")),
        );
        tree.files_mut().insert(
            Id::real("f1"),
            File::Local(LocalFile {
                id: Id::real("f1"),
                name: "f1".into(),
                parent: Id::real("d2"),
                size: 0,
                mtime_ns: 0,
            }),
        );
        tree.reconstruct_by_parents();
        tree
    }

    #[test]
    fn drops_descendants_of_a_deleted_directory() {
        let tree = tree_with_nested_subtree();
        let script = vec![
            Operation::DelDir { id: Id::real("d1") },
            Operation::DelDir { id: Id::real("d2") },
            Operation::DelFile { id: Id::real("f1") },
        ];
        let optimized = optimize_cloud_deletion(script, &tree);
        assert_eq!(optimized, vec![Operation::DelDir { id: Id::real("d1") }]);
    }

    #[test]
    fn keeps_unrelated_deletes() {
        let tree = tree_with_nested_subtree();
        let script = vec![Operation::DelFile { id: Id::real("f1") }];
        let optimized = optimize_cloud_deletion(script, &tree);
        assert_eq!(optimized, vec![Operation::DelFile { id: Id::real("f1") }]);
    }
}
