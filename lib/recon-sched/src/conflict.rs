use std::collections::{HashMap, HashSet};

use recon_model::{Id, Operation};

use crate::error::{AmbiguityKind, SchedError};

fn group_non_add(ops: &HashSet<Operation>) -> HashMap<&Id, Vec<&Operation>> {
    let mut groups: HashMap<&Id, Vec<&Operation>> = HashMap::new();
    for op in ops {
        if op.is_add() {
            continue;
        }
        groups.entry(op.subject_id()).or_default().push(op);
    }
    groups
}

fn is_delete(op: &Operation) -> bool {
    matches!(op, Operation::DelFile { .. } | Operation::DelDir { .. })
}

fn classify(id: &Id, cloud_op: &Operation, local_op: &Operation) -> Result<(), SchedError> {
    if cloud_op.is_file_kind() != local_op.is_file_kind() {
        return Err(SchedError::IdKindMismatch { id: id.clone() });
    }

    let (cloud_del, local_del) = (is_delete(cloud_op), is_delete(local_op));
    if cloud_del && local_del {
        return Ok(());
    }
    if cloud_del || local_del {
        return Err(SchedError::AmbiguousEdit {
            id: id.clone(),
            kind: AmbiguityKind::ModifyOfDeleted,
            cloud_op: cloud_op.to_string(),
            local_op: local_op.to_string(),
        });
    }

    match (cloud_op, local_op) {
        (Operation::ModifyFile { .. }, Operation::ModifyFile { .. }) => Err(SchedError::AmbiguousEdit {
            id: id.clone(),
            kind: AmbiguityKind::DoubleModify,
            cloud_op: cloud_op.to_string(),
            local_op: local_op.to_string(),
        }),

        (
            Operation::RenameMoveFile {
                name: cloud_name,
                destination_id: cloud_dest,
                ..
            },
            Operation::RenameMoveFile {
                name: local_name,
                destination_id: local_dest,
                ..
            },
        )
        | (
            Operation::RenameMoveDir {
                name: cloud_name,
                destination_id: cloud_dest,
                ..
            },
            Operation::RenameMoveDir {
                name: local_name,
                destination_id: local_dest,
                ..
            },
        ) => {
            if cloud_name.is_some() && local_name.is_some() {
                return Err(SchedError::AmbiguousEdit {
                    id: id.clone(),
                    kind: AmbiguityKind::DoubleRename,
                    cloud_op: cloud_op.to_string(),
                    local_op: local_op.to_string(),
                });
            }
            if cloud_dest.is_some() && local_dest.is_some() {
                return Err(SchedError::AmbiguousEdit {
                    id: id.clone(),
                    kind: AmbiguityKind::DoubleMove,
                    cloud_op: cloud_op.to_string(),
                    local_op: local_op.to_string(),
                });
            }
            Ok(())
        }

        _ => Ok(()),
    }
}

/// Groups `cloud_ops`/`local_ops` (excluding adds, whose freshly-minted
/// identifiers can never collide) by subject identifier and classifies
/// every pair sharing one, per the conflict table. Returns the first
/// ambiguity found; callers abort the whole run without applying anything
/// when this returns `Err`.
pub fn check_same_node_operations(
    cloud_ops: &HashSet<Operation>,
    local_ops: &HashSet<Operation>,
) -> Result<(), SchedError> {
    let cloud_groups = group_non_add(cloud_ops);
    let local_groups = group_non_add(local_ops);

    for (id, cloud_group) in &cloud_groups {
        let Some(local_group) = local_groups.get(id) else {
            continue;
        };
        for cloud_op in cloud_group {
            for local_op in local_group {
                classify(id, cloud_op, local_op)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_model::Id;

    fn set(ops: Vec<Operation>) -> HashSet<Operation> {
        ops.into_iter().collect()
    }

    #[test]
    fn no_conflict_when_ids_disjoint() {
        let cloud = set(vec![Operation::DelFile { id: Id::real("a") }]);
        let local = set(vec![Operation::DelFile { id: Id::real("b") }]);
        assert!(check_same_node_operations(&cloud, &local).is_ok());
    }

    #[test]
    fn both_sides_deleting_is_not_ambiguous() {
        let cloud = set(vec![Operation::DelFile { id: Id::real("a") }]);
        let local = set(vec![Operation::DelFile { id: Id::real("a") }]);
        assert!(check_same_node_operations(&cloud, &local).is_ok());
    }

    #[test]
    fn modify_of_deleted_is_ambiguous() {
        let cloud = set(vec![Operation::DelFile { id: Id::real("a") }]);
        let local = set(vec![Operation::ModifyFile {
            id: Id::real("a"),
            size: 1,
            cloud_meta: None,
        }]);
        let err = check_same_node_operations(&cloud, &local).unwrap_err();
        assert_eq!(
            err,
            SchedError::AmbiguousEdit {
                id: Id::real("a"),
                kind: AmbiguityKind::ModifyOfDeleted,
                cloud_op: Operation::DelFile { id: Id::real("a") }.to_string(),
                local_op: Operation::ModifyFile {
                    id: Id::real("a"),
                    size: 1,
                    cloud_meta: None,
                }
                .to_string(),
            }
        );
    }

    #[test]
    fn double_modify_is_ambiguous() {
        let cloud = set(vec![Operation::ModifyFile {
            id: Id::real("a"),
            size: 1,
            cloud_meta: None,
        }]);
        let local = set(vec![Operation::ModifyFile {
            id: Id::real("a"),
            size: 2,
            cloud_meta: None,
        }]);
        assert!(check_same_node_operations(&cloud, &local).is_err());
    }

    #[test]
    fn rename_and_move_on_disjoint_fields_is_not_ambiguous() {
        let cloud = set(vec![Operation::RenameMoveFile {
            id: Id::real("a"),
            name: Some("new-name".into()),
            destination_id: None,
        }]);
        let local = set(vec![Operation::RenameMoveFile {
            id: Id::real("a"),
            name: None,
            destination_id: Some(Id::real("d2")),
        }]);
        assert!(check_same_node_operations(&cloud, &local).is_ok());
    }

    #[test]
    fn double_rename_is_ambiguous() {
        let cloud = set(vec![Operation::RenameMoveFile {
            id: Id::real("a"),
            name: Some("x".into()),
            destination_id: None,
        }]);
        let local = set(vec![Operation::RenameMoveFile {
            id: Id::real("a"),
            name: Some("y".into()),
            destination_id: None,
        }]);
        assert!(check_same_node_operations(&cloud, &local).is_err());
    }

    #[test]
    fn file_and_dir_kind_collision_is_id_kind_mismatch() {
        let cloud = set(vec![Operation::DelFile { id: Id::real("a") }]);
        let local = set(vec![Operation::DelDir { id: Id::real("a") }]);
        assert_eq!(
            check_same_node_operations(&cloud, &local).unwrap_err(),
            SchedError::IdKindMismatch { id: Id::real("a") }
        );
    }
}
