use std::path::Path;

use recon_apply::WalkEntry;
use recon_model::{CloudFile, File, Id, Tree};

use crate::error::LocalFsError;

/// After a raw walk, multiple entries may carry the same extended-attribute
/// id (a file manager copy duplicates it along with the bytes). Exactly one
/// entry per colliding id is kept; the rest have their `id_candidate`
/// cleared so the caller mints them a fresh placeholder, per §6.
///
/// `parent_id_of` resolves an entry's parent directory path to the id
/// already assigned to it (by an earlier, non-colliding walk entry); it is
/// injected so this function stays agnostic of how that resolution is
/// performed.
///
/// A colliding id that the cloud tree knows nothing about is an operator-level
/// anomaly, not a case to normalize away silently: it means some local entry
/// claims to be a node the cloud never reported, so this returns an error
/// instead of picking an arbitrary winner.
pub fn normalize_duplicate_ids(
    mut entries: Vec<WalkEntry>,
    cloud: &Tree,
    parent_id_of: impl Fn(&Path) -> Option<Id>,
    content_equivalent: impl Fn(&WalkEntry, &CloudFile) -> bool,
) -> Result<Vec<WalkEntry>, LocalFsError> {
    let mut by_id: std::collections::HashMap<Id, Vec<usize>> = std::collections::HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        if let Some(id) = &entry.id_candidate {
            by_id.entry(id.clone()).or_default().push(i);
        }
    }

    for (id, indices) in by_id {
        if indices.len() < 2 {
            continue;
        }
        if !cloud.dirs().contains_key(&id) && !cloud.files().contains_key(&id) {
            return Err(LocalFsError::UnknownId { id: id.to_string() });
        }
        let ranks: Vec<(usize, (bool, bool, bool))> = indices
            .iter()
            .map(|&i| (i, rank(&entries, i, &id, cloud, &parent_id_of, &content_equivalent)))
            .collect();
        let winner = ranks
            .iter()
            .max_by_key(|(_, rank)| *rank)
            .map(|(i, _)| *i)
            .expect("indices is non-empty");
        for i in indices {
            if i != winner {
                entries[i].id_candidate = None;
            }
        }
    }

    Ok(entries)
}

fn rank(
    entries: &[WalkEntry],
    i: usize,
    id: &Id,
    cloud: &Tree,
    parent_id_of: &impl Fn(&Path) -> Option<Id>,
    content_equivalent: &impl Fn(&WalkEntry, &CloudFile) -> bool,
) -> (bool, bool, bool) {
    let entry = &entries[i];
    let name_matches = |cloud_name: &str| {
        entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy() == cloud_name)
            .unwrap_or(false)
    };
    let parent_matches = |cloud_parent: &Id| {
        entry
            .path
            .parent()
            .and_then(parent_id_of)
            .is_some_and(|p| p == *cloud_parent)
    };

    if entry.is_dir {
        let Some(dir) = cloud.dirs().get(id) else {
            return (false, false, false);
        };
        let local_child_count = entries
            .iter()
            .filter(|e| e.path.parent() == Some(entry.path.as_path()))
            .count();
        let child_count_matches = local_child_count == dir.files.len() + dir.dirs.len();
        let parent_ok = dir.parent.as_ref().is_some_and(parent_matches);
        let name_ok = dir.name.as_deref().is_some_and(name_matches);
        (child_count_matches, parent_ok, name_ok)
    } else {
        let Some(cloud_file) = cloud.files().get(id).and_then(File::as_cloud) else {
            return (false, false, false);
        };
        let content_ok = content_equivalent(entry, cloud_file);
        let parent_ok = parent_matches(&cloud_file.parent);
        let name_ok = name_matches(&cloud_file.name);
        (content_ok, parent_ok, name_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_duplicate_ids;
    use recon_apply::WalkEntry;
    use recon_model::{CloudFile, Id, Tree};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn cloud_tree_with_file() -> Tree {
        let mut tree = Tree::new(Id::real("root"));
        tree.files_mut().insert(
            Id::real("f1"),
            recon_model::File::Cloud(CloudFile {
                id: Id::real("f1"),
                name: "keep.txt".into(),
                parent: Id::real("root"),
                size: 3,
                e_tag: "e".into(),
                c_tag: "c".into(),
                hashes: BTreeMap::new(),
            }),
        );
        tree.reconstruct_by_parents();
        tree
    }

    #[test]
    fn keeps_the_entry_whose_name_matches_the_cloud() {
        let cloud = cloud_tree_with_file();
        let entries = vec![
            WalkEntry {
                path: PathBuf::from("/root/keep.txt"),
                is_dir: false,
                id_candidate: Some(Id::real("f1")),
                size: 3,
                mtime_ns: 0,
            },
            WalkEntry {
                path: PathBuf::from("/root/copy (2).txt"),
                is_dir: false,
                id_candidate: Some(Id::real("f1")),
                size: 3,
                mtime_ns: 0,
            },
        ];
        let normalized = normalize_duplicate_ids(
            entries,
            &cloud,
            |p: &std::path::Path| (p == std::path::Path::new("/root")).then(|| Id::real("root")),
            |_entry, _cloud_file| false,
        )
        .expect("f1 is known to the cloud tree");
        assert_eq!(normalized[0].id_candidate, Some(Id::real("f1")));
        assert_eq!(normalized[1].id_candidate, None);
    }

    #[test]
    fn errors_when_a_colliding_id_is_unknown_to_the_cloud() {
        let cloud = cloud_tree_with_file();
        let entries = vec![
            WalkEntry {
                path: PathBuf::from("/root/a.txt"),
                is_dir: false,
                id_candidate: Some(Id::real("ghost")),
                size: 3,
                mtime_ns: 0,
            },
            WalkEntry {
                path: PathBuf::from("/root/b.txt"),
                is_dir: false,
                id_candidate: Some(Id::real("ghost")),
                size: 3,
                mtime_ns: 0,
            },
        ];
        let result = normalize_duplicate_ids(
            entries,
            &cloud,
            |p: &std::path::Path| (p == std::path::Path::new("/root")).then(|| Id::real("root")),
            |_entry, _cloud_file| false,
        );
        assert!(result.is_err());
    }
}
