use recon_model::{Id, Operation, Tree};

/// A fact about the tree state that one operation can produce and another
/// can require, forming the edges of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    DirectoryExists(Id),
    NameReleased(Id, String),
}

fn current_parent_and_name(tree: &Tree, id: &Id) -> (Id, String) {
    if let Some(file) = tree.files().get(id) {
        return (file.parent().clone(), file.name().to_string());
    }
    let dir = tree
        .dirs()
        .get(id)
        .unwrap_or_else(|| panic!("operation references unknown id {id}"));
    (
        dir.parent.clone().expect("non-root directory has a parent"),
        dir.name.clone().expect("non-root directory has a name"),
    )
}

/// The condition `op` establishes once applied to `tree`, if any.
/// `tree` is the common pre-state both scripts were diffed from.
pub fn effect_of(op: &Operation, tree: &Tree) -> Option<Condition> {
    match op {
        Operation::AddFile { .. } | Operation::ModifyFile { .. } => None,
        Operation::AddDir { child_id, .. } => Some(Condition::DirectoryExists(child_id.clone())),
        Operation::DelFile { id } | Operation::DelDir { id } => {
            let (parent, name) = current_parent_and_name(tree, id);
            Some(Condition::NameReleased(parent, name))
        }
        Operation::RenameMoveFile { id, .. } | Operation::RenameMoveDir { id, .. } => {
            let (parent, name) = current_parent_and_name(tree, id);
            Some(Condition::NameReleased(parent, name))
        }
    }
}

/// The conditions `op` requires to hold before it may be applied to `tree`.
pub fn prerequisites_of(op: &Operation, tree: &Tree) -> Vec<Condition> {
    match op {
        Operation::AddFile {
            parent_id, name, ..
        }
        | Operation::AddDir {
            parent_id, name, ..
        } => vec![
            Condition::DirectoryExists(parent_id.clone()),
            Condition::NameReleased(parent_id.clone(), name.clone()),
        ],

        Operation::DelFile { .. } | Operation::ModifyFile { .. } => vec![],

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
            let (current_parent, current_name) = current_parent_and_name(tree, id);
            let dest = destination_id.clone().unwrap_or(current_parent);
            let new_name = name.clone().unwrap_or(current_name);
            vec![
                Condition::DirectoryExists(dest.clone()),
                Condition::NameReleased(dest, new_name),
            ]
        }

        Operation::DelDir { id } => tree
            .list_names(id)
            .into_iter()
            .map(|name| Condition::NameReleased(id.clone(), name.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_model::{Directory, File, Id, LocalFile, Tree};

    fn tree_with_file() -> Tree {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        tree.files_mut().insert(
            Id::real("f1"),
            File::Local(LocalFile {
                id: Id::real("f1"),
                name: "a.txt".into(),
                parent: Id::real("d1"),
                size: 0,
                mtime_ns: 0,
            }),
        );
        tree.reconstruct_by_parents();
        tree
    }

    #[test]
    fn del_file_effect_releases_its_current_name() {
        let tree = tree_with_file();
        let op = Operation::DelFile { id: Id::real("f1") };
        assert_eq!(
            effect_of(&op, &tree),
            Some(Condition::NameReleased(Id::real("d1"), "a.txt".into()))
        );
    }

    #[test]
    fn add_file_requires_destination_and_released_name() {
        let tree = tree_with_file();
        let op = Operation::AddFile {
            parent_id: Id::real("d1"),
            child_id: Id::real("f2"),
            name: "b.txt".into(),
            size: 0,
            cloud_meta: None,
        };
        let prereqs = prerequisites_of(&op, &tree);
        assert!(prereqs.contains(&Condition::DirectoryExists(Id::real("d1"))));
        assert!(prereqs.contains(&Condition::NameReleased(Id::real("d1"), "b.txt".into())));
    }

    #[test]
    fn del_dir_requires_every_child_name_released() {
        let tree = tree_with_file();
        let op = Operation::DelDir { id: Id::real("d1") };
        let prereqs = prerequisites_of(&op, &tree);
        assert_eq!(
            prereqs,
            vec![Condition::NameReleased(Id::real("d1"), "a.txt".into())]
        );
    }
}
