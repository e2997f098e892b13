use std::collections::{HashMap, HashSet, VecDeque};

use recon_model::{Operation, Tree};

use crate::condition::{effect_of, prerequisites_of, Condition};
use crate::error::SchedError;

/// Orders `ops` (all diffed against the same pre-state `tree`) into a
/// script respecting the dependency graph from §4.D, with `AddFile`/
/// `ModifyFile` deliberately deferred to the very end regardless of when
/// their prerequisites clear — see module docs for why.
pub fn schedule(ops: HashSet<Operation>, tree: &Tree) -> Result<Vec<Operation>, SchedError> {
    let ops: Vec<Operation> = ops.into_iter().collect();
    let n = ops.len();

    let mut effects: HashMap<Condition, usize> = HashMap::new();
    let mut prereqs: Vec<Vec<Condition>> = Vec::with_capacity(n);
    for (i, op) in ops.iter().enumerate() {
        if let Some(cond) = effect_of(op, tree) {
            effects.insert(cond, i);
        }
        prereqs.push(prerequisites_of(op, tree));
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for (consumer, conds) in prereqs.iter().enumerate() {
        for cond in conds {
            if let Some(&producer) = effects.get(cond) {
                successors[producer].push(consumer);
                indegree[consumer] += 1;
            }
        }
    }

    let deferred: Vec<bool> = ops.iter().map(|op| op.is_deferred()).collect();
    let mut ready: VecDeque<usize> = (0..n)
        .filter(|&i| indegree[i] == 0 && !deferred[i])
        .collect();
    let mut scheduled = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop_front() {
        scheduled[i] = true;
        order.push(i);
        for &succ in &successors[i] {
            indegree[succ] -= 1;
            if indegree[succ] == 0 && !scheduled[succ] && !deferred[succ] {
                ready.push_back(succ);
            }
        }
    }

    let stuck: Vec<usize> = (0..n)
        .filter(|&i| !scheduled[i] && !deferred[i])
        .collect();
    if !stuck.is_empty() {
        return Err(SchedError::CyclicDependency {
            remaining: stuck.len(),
        });
    }

    let mut deferred_indices: Vec<usize> = (0..n).filter(|&i| deferred[i]).collect();
    deferred_indices.sort_by(|&a, &b| ops[a].subject_id().as_str().cmp(ops[b].subject_id().as_str()));
    order.extend(deferred_indices);

    Ok(order.into_iter().map(|i| ops[i].clone()).collect())
}
