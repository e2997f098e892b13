use recon_model::{ops, Operation, Tree};

use crate::error::SchedError;

/// Replays `script` against a clone of `tree`, asserting legality before
/// every step. Used both to validate a freshly-scheduled script before it
/// is shown to the user and, with the same two inputs in different
/// combinations, to prove the round-trip and diamond properties at test
/// time (see the crate's integration tests).
pub fn field_test(tree: &Tree, script: &[Operation]) -> Result<Tree, SchedError> {
    let mut clone = tree.clone();
    for op in script {
        if !ops::check(op, &clone) {
            return Err(SchedError::FieldTestFailed { op: op.clone() });
        }
        ops::apply(op, &mut clone).map_err(|_| SchedError::FieldTestFailed { op: op.clone() })?;
    }
    Ok(clone)
}

#[cfg(test)]
mod tests {
    use super::field_test;
    use recon_model::{Directory, Id, Operation, Tree};

    #[test]
    fn replays_a_legal_script() {
        let mut tree = Tree::new(Id::real("root"));
        tree.reconstruct_by_parents();

        let script = vec![Operation::AddDir {
            parent_id: Id::real("root"),
            child_id: Id::real("d1"),
            name: "d1".into(),
        }];
        let result = field_test(&tree, &script).unwrap();
        assert!(result.dirs().contains_key(&Id::real("d1")));
    }

    #[test]
    fn rejects_an_illegal_script() {
        let tree = Tree::new(Id::real("root"));
        let script = vec![Operation::DelDir {
            id: Id::real("nonexistent"),
        }];
        assert!(field_test(&tree, &script).is_err());
    }

    #[test]
    fn diamond_property_holds_for_commuting_scripts() {
        let mut base = Tree::new(Id::real("root"));
        base.dirs_mut().insert(
            Id::real("d1"),
            Directory::new(Id::real("d1"), "d1", Id::real("root")),
        );
        base.reconstruct_by_parents();

        let cloud_script = vec![Operation::AddDir {
            parent_id: Id::real("root"),
            child_id: Id::real("d2"),
            name: "d2".into(),
        }];
        let local_script = vec![Operation::AddDir {
            parent_id: Id::real("root"),
            child_id: Id::real("d3"),
            name: "d3".into(),
        }];

        let cloud_tree = field_test(&base, &cloud_script).unwrap();
        let local_tree = field_test(&base, &local_script).unwrap();

        let via_cloud_then_local = field_test(&cloud_tree, &local_script).unwrap();
        let via_local_then_cloud = field_test(&local_tree, &cloud_script).unwrap();

        assert!(via_cloud_then_local.equals(&via_local_then_cloud));
    }
}
