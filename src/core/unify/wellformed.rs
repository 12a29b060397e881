/*!

Well-formedness is enforced in two passes at grammar-load time. Delta expansion unifies each
proper type's own local constraint dag with each of its immediate parents' (already-expanded)
constraint dag, once. Full expansion then recursively unifies every sub-node's own type
constraint into the result, so that `Engine::enforce_constraint`'s incremental, run-time check
never needs to recurse further than one arc.

*/

use crate::abstractions::{HashMap, Set};
use crate::core::graph::node::NodeId;
use crate::core::types::TypeId;
use crate::core::unify::engine::Engine;
use crate::core::unify::errors::{FailureKind, UnifyFailure};
use crate::core::unify::restrictor::Restrictor;

/// `order` must list proper types in topological order (parents before children); `raw` holds
/// each type's own, not-yet-expanded constraint dag root as read from the grammar file.
pub fn delta_expand(engine: &mut Engine, order: &[TypeId], raw: &HashMap<TypeId, NodeId>) -> Result<(), UnifyFailure> {
  for &t in order {
    let Some(&own_root) = raw.get(&t) else {
      continue;
    };

    let parents = engine.hierarchy().immediate_supertypes(t);
    let mark = engine.arena_mark();
    let mut current = own_root;
    let mut failed = None;

    for parent in parents {
      let Some(&parent_root) = engine.constraint_cache().get(&parent) else {
        continue;
      };
      match engine.unify1(current, parent_root) {
        Ok(merged) => current = merged,
        Err(failure) => {
          failed = Some(failure);
          break;
        }
      }
    }

    if let Some(failure) = failed {
      engine.arena_release(mark);
      engine.invalidate_generation();
      return Err(failure);
    }

    let copied = engine.copy(current, &Restrictor::None, true)?;
    engine.invalidate_generation();
    engine.register_constraint(t, copied);
  }
  Ok(())
}

/// Recursively unifies every sub-node's own constraint into the already delta-expanded
/// structure.
pub fn full_expand(engine: &mut Engine, proper_types: &[TypeId]) -> Result<(), UnifyFailure> {
  for &t in proper_types {
    let Some(&root) = engine.constraint_cache().get(&t) else {
      continue;
    };
    let mark = engine.arena_mark();
    let mut visiting = Set::new();
    let result = expand_node(engine, root, &mut visiting);

    match result {
      Ok(()) => {
        let copied = engine.copy(root, &Restrictor::None, true)?;
        engine.invalidate_generation();
        engine.register_constraint(t, copied);
      }
      Err(mut failure) => {
        // A cycle discovered while fully expanding a type's own constraint is a constraint
        // failure, not a structural cycle in caller-supplied dags.
        if failure.kind == FailureKind::Cycle {
          failure.kind = FailureKind::ConstraintClash;
        }
        engine.arena_release(mark);
        engine.invalidate_generation();
        return Err(failure);
      }
    }
  }
  Ok(())
}

fn expand_node(engine: &mut Engine, node: NodeId, visiting: &mut Set<NodeId>) -> Result<(), UnifyFailure> {
  let node = engine.deref(node);
  if !visiting.insert(node) {
    return Err(UnifyFailure { kind: FailureKind::Cycle });
  }

  let t = engine.current_type(node);
  if let Some(&constraint_root) = engine.constraint_cache().get(&t) {
    if constraint_root != node {
      engine.unify1(node, constraint_root)?;
    }
  }

  for (_, target) in engine.collect_arcs(node) {
    expand_node(engine, target, visiting)?;
  }

  visiting.remove(&node);
  Ok(())
}
