use rusqlite::{params, Connection};

use recon_model::{CloudFile, Digests, Directory, File, Id, Tree};

use crate::error::{inerr, StoreError};
use crate::schema::TreeKind;

/// Persists `tree` as `kind`, replacing whatever was stored for it before.
/// Every file in `tree` must be [`File::Cloud`] — the saved and delta trees
/// are the only ones ever written here, and both are built from cloud
/// snapshots. Hashes are only kept for the delta tree, matching the
/// original implementation: the saved tree never needs them again once a
/// sync completes.
pub fn save_tree(conn: &mut Connection, kind: TreeKind, tree: &Tree) -> Result<(), StoreError> {
    let tx = conn.transaction().map_err(inerr("save_tree"))?;
    let tree_id = kind as i64;

    tx.execute("DELETE FROM file_nodes WHERE tree = ?1", params![tree_id])
        .map_err(inerr("save_tree"))?;
    tx.execute("DELETE FROM dir_nodes WHERE tree = ?1", params![tree_id])
        .map_err(inerr("save_tree"))?;
    if kind == TreeKind::Delta {
        tx.execute("DELETE FROM hashes", []).map_err(inerr("save_tree"))?;
    }

    for (id, file) in tree.files() {
        let cloud = file.as_cloud().ok_or_else(|| StoreError::NonCloudFile {
            id: id.as_str().to_string(),
        })?;
        tx.execute(
            "INSERT INTO file_nodes (tree, id, name, size, e_tag, c_tag, parent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tree_id,
                cloud.id.as_str(),
                cloud.name,
                cloud.size as i64,
                cloud.e_tag,
                cloud.c_tag,
                cloud.parent.as_str(),
            ],
        )
        .map_err(inerr("save_tree"))?;

        if kind == TreeKind::Delta {
            for (algorithm, value) in &cloud.hashes {
                tx.execute(
                    "INSERT INTO hashes (id, algorithm, value) VALUES (?1, ?2, ?3)",
                    params![cloud.id.as_str(), algorithm, value],
                )
                .map_err(inerr("save_tree"))?;
            }
        }
    }

    for (id, dir) in tree.dirs() {
        tx.execute(
            "INSERT INTO dir_nodes (tree, id, name, parent) VALUES (?1, ?2, ?3, ?4)",
            params![
                tree_id,
                id.as_str(),
                dir.name,
                dir.parent.as_ref().map(Id::as_str),
            ],
        )
        .map_err(inerr("save_tree"))?;
    }

    tx.commit().map_err(inerr("save_tree"))
}

/// Loads the tree stored as `kind`, anchored at `root_id`.
pub fn load_tree(conn: &Connection, kind: TreeKind, root_id: &Id) -> Result<Tree, StoreError> {
    let tree_id = kind as i64;
    let mut tree = Tree::new(root_id.clone());

    let mut file_stmt = conn
        .prepare("SELECT id, name, size, e_tag, c_tag, parent FROM file_nodes WHERE tree = ?1")
        .map_err(inerr("load_tree"))?;
    let mut hash_stmt = conn
        .prepare("SELECT algorithm, value FROM hashes WHERE id = ?1")
        .map_err(inerr("load_tree"))?;

    let rows = file_stmt
        .query_map(params![tree_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(inerr("load_tree"))?;

    for row in rows {
        let (id, name, size, e_tag, c_tag, parent) = row.map_err(inerr("load_tree"))?;
        let hashes: Digests = if kind == TreeKind::Delta {
            hash_stmt
                .query_map(params![id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(inerr("load_tree"))?
                .collect::<Result<_, _>>()
                .map_err(inerr("load_tree"))?
        } else {
            Digests::new()
        };
        tree.files_mut().insert(
            Id::real(&id),
            File::Cloud(CloudFile {
                id: Id::real(id),
                name,
                parent: Id::real(parent),
                size: size as u64,
                e_tag,
                c_tag,
                hashes,
            }),
        );
    }

    let mut dir_stmt = conn
        .prepare("SELECT id, name, parent FROM dir_nodes WHERE tree = ?1")
        .map_err(inerr("load_tree"))?;
    let dir_rows = dir_stmt
        .query_map(params![tree_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(inerr("load_tree"))?;

    for row in dir_rows {
        let (id, name, parent) = row.map_err(inerr("load_tree"))?;
        let dir = match (name, parent) {
            (Some(name), Some(parent)) => Directory::new(Id::real(&id), name, Id::real(parent)),
            _ => Directory::root(Id::real(&id)),
        };
        tree.dirs_mut().insert(Id::real(id), dir);
    }

    tree.reconstruct_by_parents();
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;
    use std::collections::BTreeMap;

    fn sample_tree() -> Tree {
        let root = Id::real("root");
        let mut tree = Tree::new(root.clone());
        tree.dirs_mut()
            .insert(Id::real("d1"), Directory::new(Id::real("d1"), "sub", root.clone()));
        let mut hashes = BTreeMap::new();
        hashes.insert("sha1Hash".to_string(), "ABC123".to_string());
        tree.files_mut().insert(
            Id::real("f1"),
            File::Cloud(CloudFile {
                id: Id::real("f1"),
                name: "a.txt".into(),
                parent: Id::real("d1"),
                size: 10,
                e_tag: "e".into(),
                c_tag: "c".into(),
                hashes,
            }),
        );
        tree.reconstruct_by_parents();
        tree
    }

    #[test]
    fn saved_tree_roundtrips_without_hashes() {
        let mut conn = open_in_memory().unwrap();
        let original = sample_tree();
        save_tree(&mut conn, TreeKind::Saved, &original).unwrap();
        let loaded = load_tree(&conn, TreeKind::Saved, &Id::real("root")).unwrap();
        assert!(original.equals(&loaded));
        let file = loaded.files().get(&Id::real("f1")).unwrap().as_cloud().unwrap();
        assert!(file.hashes.is_empty());
    }

    #[test]
    fn delta_tree_roundtrips_with_hashes() {
        let mut conn = open_in_memory().unwrap();
        let original = sample_tree();
        save_tree(&mut conn, TreeKind::Delta, &original).unwrap();
        let loaded = load_tree(&conn, TreeKind::Delta, &Id::real("root")).unwrap();
        assert!(original.equals(&loaded));
        let file = loaded.files().get(&Id::real("f1")).unwrap().as_cloud().unwrap();
        assert_eq!(file.hashes.get("sha1Hash"), Some(&"ABC123".to_string()));
    }

    #[test]
    fn saving_a_bare_file_is_rejected() {
        let mut conn = open_in_memory().unwrap();
        let mut tree = Tree::new(Id::real("root"));
        tree.files_mut().insert(
            Id::real("f1"),
            File::Bare {
                id: Id::real("f1"),
                name: "a".into(),
                parent: Id::real("root"),
                size: 0,
            },
        );
        assert!(save_tree(&mut conn, TreeKind::Saved, &tree).is_err());
    }
}
