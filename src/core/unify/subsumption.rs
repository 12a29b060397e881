/*!

Subsumption walks two dags in parallel without mutating either beyond a coreference witness
per node. `subsumes(a, b)` returns `(forward, backward)`: `forward` holds iff `a` is at least as
general as `b`. A side missing an arc the other has falls back to that side's type's
constraint dag as a stand-in, so coreferences still get discovered without materializing
anything.

*/

use crate::abstractions::HashMap;
use crate::core::attrs::AttrId;
use crate::core::graph::node::NodeId;
use crate::core::unify::engine::Engine;

/// `(a is at least as general as b, b is at least as general as a)`.
pub fn subsumes(engine: &mut Engine, a: NodeId, b: NodeId) -> (bool, bool) {
  let mut a_witness: HashMap<NodeId, NodeId> = HashMap::new();
  let mut b_witness: HashMap<NodeId, NodeId> = HashMap::new();
  let mut forward_ok = true;
  let mut backward_ok = true;
  walk(engine, a, b, &mut a_witness, &mut b_witness, &mut forward_ok, &mut backward_ok);
  (forward_ok, backward_ok)
}

fn walk(
  engine: &mut Engine,
  a: NodeId,
  b: NodeId,
  a_witness: &mut HashMap<NodeId, NodeId>,
  b_witness: &mut HashMap<NodeId, NodeId>,
  forward_ok: &mut bool,
  backward_ok: &mut bool,
) {
  if !*forward_ok && !*backward_ok {
    return;
  }

  let a = engine.deref(a);
  let b = engine.deref(b);

  match a_witness.get(&a) {
    Some(&seen_with) if seen_with != b => *forward_ok = false,
    Some(_) => {}
    None => {
      a_witness.insert(a, b);
    }
  }
  match b_witness.get(&b) {
    Some(&seen_with) if seen_with != a => *backward_ok = false,
    Some(_) => {}
    None => {
      b_witness.insert(b, a);
    }
  }
  if !*forward_ok && !*backward_ok {
    return;
  }

  let type_a = engine.new_type(a);
  let type_b = engine.new_type(b);
  let (a_le_b, b_le_a) = engine.hierarchy().subtype_bidir(type_a, type_b);
  // `forward` = a is more general than b, which needs b's type to be the subtype (b_le_a).
  if !b_le_a {
    *forward_ok = false;
  }
  if !a_le_b {
    *backward_ok = false;
  }
  if !*forward_ok && !*backward_ok {
    return;
  }

  let arcs_a = engine.collect_arcs(a);
  let arcs_b = engine.collect_arcs(b);

  let mut attrs: Vec<AttrId> = arcs_a.iter().map(|&(attr, _)| attr).collect();
  for &(attr, _) in &arcs_b {
    if !attrs.contains(&attr) {
      attrs.push(attr);
    }
  }

  for attr in attrs {
    if !*forward_ok && !*backward_ok {
      return;
    }
    let target_a = arcs_a
      .iter()
      .find(|&&(at, _)| at == attr)
      .map(|&(_, t)| t)
      .or_else(|| engine.constraint_target(a, attr));
    let target_b = arcs_b
      .iter()
      .find(|&&(at, _)| at == attr)
      .map(|&(_, t)| t)
      .or_else(|| engine.constraint_target(b, attr));

    match (target_a, target_b) {
      (Some(ta), Some(tb)) => walk(engine, ta, tb, a_witness, b_witness, forward_ok, backward_ok),
      // `a` has structure under `attr` that `b` doesn't: `a` is not the more general side.
      (Some(_), None) => *forward_ok = false,
      // `b` has structure under `attr` that `a` doesn't: `b` is not the more general side.
      (None, Some(_)) => *backward_ok = false,
      (None, None) => {}
    }
  }
}
