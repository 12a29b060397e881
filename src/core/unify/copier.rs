/*!

Partial (smart) copy: produces a fresh dag reflecting every generation-protected change
accumulated on top of a source dag, sharing whatever sub-dag didn't actually change rather
than duplicating it wholesale. A permanent node with an unchanged type, no `compArcs`, no
restriction applied at it, and no child that itself changed under copy, is returned as-is.

Cycle detection reuses the `CopyState` slot the unifier's own cycle check uses; the two
operations are never active on the same generation at once.

*/

use crate::core::attrs::AttrId;
use crate::core::graph::node::{CopyState, NodeId};
use crate::core::unify::engine::Engine;
use crate::core::unify::errors::{CopyFailure, FailureKind};
use crate::core::unify::restrictor::{RestrictDecision, Restrictor};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CopyTarget {
  Temporary,
  Permanent,
}

pub fn partial_copy(
  engine: &mut Engine,
  root: NodeId,
  restrict: &Restrictor,
  target: CopyTarget,
) -> Result<NodeId, CopyFailure> {
  copy_node(engine, root, restrict, target, false)
}

/// Like `partial_copy`, but never takes the sharing fast path: every node reached, permanent
/// or not, is allocated fresh. `partial_copy`'s sharing is only safe when the source dag's own
/// generation-protected slots are themselves stable across the calls sharing it; constraint
/// enforcement unifies a node against the *same* cached dag once per node that acquires the
/// type, so without this, the first enforcement in a generation would touch the cached dag
/// directly (nothing on it looks changed yet) and every later enforcement against the same
/// type that generation would be merging against an already-mutated constraint, not the
/// original one.
pub fn fresh_copy(engine: &mut Engine, root: NodeId, target: CopyTarget) -> Result<NodeId, CopyFailure> {
  copy_node(engine, root, &Restrictor::None, target, true)
}

fn copy_node(
  engine: &mut Engine,
  node: NodeId,
  restrict: &Restrictor,
  target: CopyTarget,
  force_fresh: bool,
) -> Result<NodeId, CopyFailure> {
  let node = engine.deref(node);

  match engine.copy_state(node) {
    CopyState::Copied(existing) => return Ok(existing),
    CopyState::OnStack => {
      engine.record_failure(FailureKind::Cycle);
      if engine.failure_recording_enabled() {
        // Continue past the cycle treating the re-entered node as unified with itself,
        // rather than aborting the whole copy.
        return Ok(node);
      }
      return Err(CopyFailure { kind: FailureKind::Cycle });
    }
    CopyState::Unvisited => {}
  }
  engine.set_copy_state(node, CopyState::OnStack);

  let new_type = engine.new_type(node);
  let permanent = node.is_permanent();
  let type_unchanged = new_type == engine.permanent_type(node);
  let has_comp_arcs = engine.comp_arcs_of(node).is_some();
  let restricts_here = restrict.prunes_anything_here();

  let arcs = engine.collect_arcs(node);
  let mut copied_arcs: Vec<(AttrId, NodeId)> = Vec::with_capacity(arcs.len());
  let mut any_child_changed = false;

  for (attr, child) in arcs {
    if restrict.decide(attr) == RestrictDecision::Delete {
      any_child_changed = true;
      continue;
    }
    let child_restrict = restrict.descend(attr);
    engine.push_path(attr);
    let copied = copy_node(engine, child, &child_restrict, target, force_fresh);
    engine.pop_path();
    let copied = copied?;
    if copied != child {
      any_child_changed = true;
    }
    copied_arcs.push((attr, copied));
  }

  let shareable =
    !force_fresh && permanent && type_unchanged && !has_comp_arcs && !any_child_changed && !restricts_here;

  let result = if shareable {
    node
  } else {
    let new_node = match target {
      CopyTarget::Temporary => engine.alloc_temporary_node(new_type),
      CopyTarget::Permanent => engine.alloc_permanent_node(new_type),
    };
    for (attr, child) in copied_arcs.into_iter().rev() {
      engine.add_arc(new_node, attr, child);
    }
    new_node
  };

  engine.set_copy_state(node, CopyState::Copied(result));
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::attrs::AttributeTable;
  use crate::core::types::bitcode::Bitcode;
  use crate::core::types::hierarchy::TypeHierarchyBuilder;
  use crate::core::unify::engine::EngineConfig;
  use crate::abstractions::IString;

  fn test_engine() -> Engine {
    let mut builder = TypeHierarchyBuilder::new();
    let mut top_bits = Bitcode::with_capacity(1);
    top_bits.set(0);
    let top = builder.push_proper(IString::from("TOP"), IString::from("TOP"), 0, top_bits);
    let hierarchy = builder.build(top, top);
    Engine::new(hierarchy, AttributeTable::with_capacity(0), EngineConfig::default())
  }

  #[test]
  fn unchanged_permanent_node_is_shared_not_copied() {
    let mut engine = test_engine();
    let top = engine.hierarchy().top();
    let node = engine.alloc_permanent_node(top);
    let copied = engine.copy(node, &Restrictor::None, false).unwrap();
    assert_eq!(copied, node);
  }

  #[test]
  fn fresh_copy_never_shares_even_an_untouched_permanent_node() {
    let mut engine = test_engine();
    let top = engine.hierarchy().top();
    let node = engine.alloc_permanent_node(top);
    let copied = fresh_copy(&mut engine, node, CopyTarget::Temporary).unwrap();
    assert_ne!(copied, node);
  }

  #[test]
  fn restricted_root_forces_a_fresh_node() {
    let mut engine = test_engine();
    let top = engine.hierarchy().top();
    let node = engine.alloc_permanent_node(top);
    let mut set = crate::abstractions::Set::new();
    set.insert(0u32);
    let restrict = Restrictor::flat(set);
    let copied = engine.copy(node, &restrict, false).unwrap();
    assert_ne!(copied, node);
  }
}
