/*!

Quick check is a cheap, approximate pre-filter: a fixed-width vector of types extracted along
a small, grammar-supplied set of paths. Two fs's quick-check vectors being pairwise
glb-compatible is necessary (not sufficient) for full unification to succeed, which makes it a
safe rejection test but never a safe acceptance test.

Failure recording (training mode) accumulates, for each failing unification, the kind of
failure, the normalized path at which it occurred, and the pre-failure cost — raw material for
ranking the next grammar's qc-path list.

*/

use crate::abstractions::HashMap;
use crate::core::attrs::AttrId;
use crate::core::graph::node::NodeId;
use crate::core::types::{TypeHierarchy, TypeId, BOTTOM};
use crate::core::unify::engine::Engine;
use crate::core::unify::errors::FailureKind;

/// A small tree of paths, each annotated with its position in the qc vector. Read from the
/// grammar file at load time.
#[derive(Clone, Debug, Default)]
pub struct QcTree {
  children: HashMap<AttrId, QcTree>,
  position: Option<usize>,
}

impl QcTree {
  pub fn new() -> Self {
    QcTree::default()
  }

  pub fn insert(&mut self, path: &[AttrId], position: usize) {
    match path {
      [] => self.position = Some(position),
      [head, rest @ ..] => {
        self.children.entry(*head).or_default().insert(rest, position);
      }
    }
  }

  /// The length a qc vector built from this tree must have: one past the largest position
  /// assigned anywhere in the tree.
  pub fn len(&self) -> usize {
    fn max_position(tree: &QcTree, acc: &mut usize) {
      if let Some(position) = tree.position {
        *acc = (*acc).max(position + 1);
      }
      for child in tree.children.values() {
        max_position(child, acc);
      }
    }
    let mut acc = 0;
    max_position(self, &mut acc);
    acc
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Walks `tree` in parallel with the fs rooted at `node`, writing each marked position's
/// current type. A missing arc leaves its positions at `top`. Read-only: does not perturb any
/// node's generation.
pub fn get_qc_vector(engine: &Engine, tree: &QcTree, node: NodeId, top: TypeId) -> Vec<TypeId> {
  let mut vector = vec![top; tree.len()];
  fill(engine, tree, node, &mut vector);
  vector
}

fn fill(engine: &Engine, tree: &QcTree, node: NodeId, vector: &mut Vec<TypeId>) {
  if let Some(position) = tree.position {
    vector[position] = engine.current_type(node);
  }
  for (&attr, child) in &tree.children {
    if let Some(target) = engine.find_arc(node, attr) {
      fill(engine, child, target, vector);
    }
  }
}

/// Unification filter: false if any position's types have `glb == BOTTOM`.
pub fn qc_compatible_unif(hierarchy: &mut TypeHierarchy, a: &[TypeId], b: &[TypeId]) -> bool {
  debug_assert_eq!(a.len(), b.len());
  a.iter().zip(b.iter()).all(|(&x, &y)| hierarchy.glb(x, y) != BOTTOM)
}

/// Subsumption filter, one `subtypeBidir` per position, conjoined.
pub fn qc_compatible_subs(hierarchy: &TypeHierarchy, a: &[TypeId], b: &[TypeId]) -> (bool, bool) {
  debug_assert_eq!(a.len(), b.len());
  let mut forward = true;
  let mut backward = true;
  for (&x, &y) in a.iter().zip(b.iter()) {
    if !forward && !backward {
      break;
    }
    let (f, bwd) = hierarchy.subtype_bidir(x, y);
    // `forward` = a is more general than b, which needs y≤x (bwd), not x≤y (f).
    forward &= bwd;
    backward &= f;
  }
  (forward, backward)
}

#[derive(Clone, Debug)]
pub struct FailureRecord {
  pub kind: FailureKind,
  pub path: Vec<AttrId>,
  pub cost: usize,
}

#[derive(Clone, Debug, Default)]
pub struct FailureRecorder {
  records: Vec<FailureRecord>,
}

impl FailureRecorder {
  pub fn new() -> Self {
    FailureRecorder::default()
  }

  pub fn record(&mut self, record: FailureRecord) {
    self.records.push(record);
  }

  pub fn records(&self) -> &[FailureRecord] {
    &self.records
  }

  pub fn clear(&mut self) {
    self.records.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn qc_tree_assigns_positions_by_path() {
    let mut tree = QcTree::new();
    tree.insert(&[1, 2], 0);
    tree.insert(&[3], 1);
    assert_eq!(tree.len(), 2);
  }

  #[test]
  fn failure_recorder_accumulates_in_order() {
    let mut recorder = FailureRecorder::new();
    recorder.record(FailureRecord { kind: FailureKind::TypeClash, path: vec![1], cost: 3 });
    recorder.record(FailureRecord { kind: FailureKind::Cycle, path: vec![], cost: 1 });
    assert_eq!(recorder.records().len(), 2);
    assert_eq!(recorder.records()[0].kind, FailureKind::TypeClash);
  }
}
