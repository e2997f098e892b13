use std::collections::{HashMap, HashSet};

use super::node::compatible_size;
use super::{Directory, File, Id};

/// A snapshot of a tree on one side of the sync: a root directory id plus
/// two id-keyed maps. The children-index sets on each [`Directory`] are
/// derived data — [`Tree::reconstruct_by_parents`] is the only way to
/// rebuild them from scratch, and every other mutation keeps them in sync
/// incrementally (see `recon_model::ops`).
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root_id: Id,
    dirs: HashMap<Id, Directory>,
    files: HashMap<Id, File>,
}

impl Tree {
    pub fn new(root_id: Id) -> Tree {
        let mut dirs = HashMap::new();
        dirs.insert(root_id.clone(), Directory::root(root_id.clone()));
        Tree {
            root_id,
            dirs,
            files: HashMap::new(),
        }
    }

    pub fn root_id(&self) -> &Id {
        &self.root_id
    }
    pub fn dirs(&self) -> &HashMap<Id, Directory> {
        &self.dirs
    }
    pub fn dirs_mut(&mut self) -> &mut HashMap<Id, Directory> {
        &mut self.dirs
    }
    pub fn files(&self) -> &HashMap<Id, File> {
        &self.files
    }
    pub fn files_mut(&mut self) -> &mut HashMap<Id, File> {
        &mut self.files
    }

    /// All sibling names currently used directly under `dir_id` (both file
    /// and directory children share one namespace per invariant 3).
    pub fn list_names(&self, dir_id: &Id) -> HashSet<&str> {
        let Some(directory) = self.dirs.get(dir_id) else {
            return HashSet::new();
        };
        directory
            .files
            .iter()
            .filter_map(|id| self.files.get(id))
            .map(|f| f.name())
            .chain(
                directory
                    .dirs
                    .iter()
                    .filter_map(|id| self.dirs.get(id))
                    .filter_map(|d| d.name.as_deref()),
            )
            .collect()
    }

    /// Rebuilds every directory's children-index sets purely from each
    /// node's `parent` field, discarding nodes whose parent chain does not
    /// terminate at the root (computed by fixed point, since an orphan's
    /// own children are orphans too).
    pub fn reconstruct_by_parents(&mut self) {
        let mut orphan_files: HashSet<Id> = HashSet::new();
        let mut orphan_dirs: HashSet<Id> = HashSet::new();

        loop {
            let mut changed = false;
            for (id, file) in &self.files {
                if orphan_files.contains(id) {
                    continue;
                }
                if !self.dirs.contains_key(file.parent()) || orphan_dirs.contains(file.parent()) {
                    orphan_files.insert(id.clone());
                    changed = true;
                }
            }
            for (id, dir) in &self.dirs {
                if *id == self.root_id || orphan_dirs.contains(id) {
                    continue;
                }
                let Some(parent) = &dir.parent else {
                    continue;
                };
                if !self.dirs.contains_key(parent) || orphan_dirs.contains(parent) {
                    orphan_dirs.insert(id.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for id in &orphan_files {
            self.files.remove(id);
        }
        for id in &orphan_dirs {
            self.dirs.remove(id);
        }

        for directory in self.dirs.values_mut() {
            directory.dirs.clear();
            directory.files.clear();
        }
        let file_parents: Vec<(Id, Id)> = self
            .files
            .iter()
            .map(|(id, f)| (id.clone(), f.parent().clone()))
            .collect();
        for (id, parent) in file_parents {
            self.dirs.get_mut(&parent).unwrap().files.insert(id);
        }
        let dir_parents: Vec<(Id, Id)> = self
            .dirs
            .iter()
            .filter(|(id, _)| **id != self.root_id)
            .map(|(id, d)| (id.clone(), d.parent.clone().unwrap()))
            .collect();
        for (id, parent) in dir_parents {
            self.dirs.get_mut(&parent).unwrap().dirs.insert(id);
        }
    }

    /// Structural equality used by the field-test validator: ignores the
    /// derived children-index sets and compares identity sets plus
    /// `name`/`parent`/(for files) `size` through [`compatible_size`].
    pub fn equals(&self, other: &Tree) -> bool {
        if self.root_id != other.root_id {
            return false;
        }

        let self_file_ids: HashSet<&Id> = self.files.keys().collect();
        let other_file_ids: HashSet<&Id> = other.files.keys().collect();
        if self_file_ids != other_file_ids {
            return false;
        }
        for id in self_file_ids {
            let a = &self.files[id];
            let b = &other.files[id];
            if a.name() != b.name() || a.parent() != b.parent() {
                return false;
            }
            if !compatible_size(a.size(), b.size()) {
                return false;
            }
        }

        let self_dir_ids: HashSet<&Id> = self.dirs.keys().collect();
        let other_dir_ids: HashSet<&Id> = other.dirs.keys().collect();
        if self_dir_ids != other_dir_ids {
            return false;
        }
        for id in self_dir_ids {
            let a = &self.dirs[id];
            let b = &other.dirs[id];
            if a.name != b.name || a.parent != b.parent {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;
    use crate::{Directory, File, Id, LocalFile};

    fn mkfile(id: &str, name: &str, parent: &str) -> File {
        File::Local(LocalFile {
            id: Id::real(id),
            name: name.to_string(),
            parent: Id::real(parent),
            size: 0,
            mtime_ns: 0,
        })
    }

    #[test]
    fn reconstruct_rebuilds_indices() {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        tree.files_mut()
            .insert(Id::real("f1"), mkfile("f1", "f1", "d1"));

        tree.reconstruct_by_parents();

        assert!(tree.dirs()[&Id::real("root")].dirs.contains(&Id::real("d1")));
        assert!(tree.dirs()[&Id::real("d1")].files.contains(&Id::real("f1")));
    }

    #[test]
    fn reconstruct_is_idempotent() {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        tree.files_mut()
            .insert(Id::real("f1"), mkfile("f1", "f1", "d1"));
        tree.reconstruct_by_parents();
        let once = tree.clone();
        tree.reconstruct_by_parents();
        assert_eq!(once, tree);
    }

    #[test]
    fn reconstruct_drops_orphans_transitively() {
        let mut tree = Tree::new(Id::real("root"));
        // d1's parent ("missing") does not exist, and d2 hangs off d1: both
        // must be dropped, along with f1 under d2.
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("missing")),
        );
        tree.dirs_mut().insert(
            Id::real("d2"),
            Directory::new(Id::real("d2"), "d2", Id::real("d1")),
        );
        tree.files_mut()
            .insert(Id::real("f1"), mkfile("f1", "f1", "d2"));

        tree.reconstruct_by_parents();

        assert!(!tree.dirs().contains_key(&Id::real("d1")));
        assert!(!tree.dirs().contains_key(&Id::real("d2")));
        assert!(!tree.files().contains_key(&Id::real("f1")));
        for dir in tree.dirs().values() {
            assert!(dir.parent.is_none() || tree.dirs().contains_key(dir.parent.as_ref().unwrap()));
        }
    }

    #[test]
    fn list_names_spans_files_and_dirs() {
        let mut tree = Tree::new(Id::real("root"));
        tree.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "same-name", Id::real("root")),
        );
        tree.reconstruct_by_parents();
        let names = tree.list_names(&Id::real("root"));
        assert!(names.contains("same-name"));
    }

    #[test]
    fn equals_ignores_incompatible_size_but_checks_name_and_parent() {
        let mut a = Tree::new(Id::real("root"));
        a.files_mut().insert(Id::real("f1"), mkfile("f1", "a", "root"));
        let mut b = Tree::new(Id::real("root"));
        b.files_mut().insert(Id::real("f1"), mkfile("f1", "a", "root"));
        assert!(a.equals(&b));

        let mut c = Tree::new(Id::real("root"));
        c.files_mut().insert(Id::real("f1"), mkfile("f1", "different", "root"));
        assert!(!a.equals(&c));
    }
}
