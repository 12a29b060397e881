/*!

`GraphArena` is the two-stack (permanent, temporary) fixed-size-slot allocator for `Node`s and
`Arc`s described in the arena allocator component. It replaces the reference algorithm's raw
`dag_node*`/`dag_arc*` pointers with typed indices (`NodeId`, `ArcId`) into one of four backing
`Vec`s, tagged by which arena owns the slot.

*/

use crate::core::graph::arc::{Arc, ArcId};
use crate::core::graph::node::{Node, NodeId};
use crate::core::types::TypeId;

/// Hard caps on arena growth. Exceeding one is a fatal, unrecoverable condition (a corrupt
/// grammar file or a runaway unification), not something a caller can meaningfully retry.
#[derive(Copy, Clone, Debug)]
pub struct ArenaLimits {
  pub max_permanent_nodes: usize,
  pub max_permanent_arcs : usize,
  pub max_temporary_nodes: usize,
  pub max_temporary_arcs : usize,
}

impl Default for ArenaLimits {
  fn default() -> Self {
    ArenaLimits {
      max_permanent_nodes: 1 << 22,
      max_permanent_arcs : 1 << 23,
      max_temporary_nodes: 1 << 20,
      max_temporary_arcs : 1 << 21,
    }
  }
}

/// An opaque mark token for the temporary arena. `release_to` truncates both temporary
/// vectors back to the lengths recorded at `mark()` time.
#[derive(Copy, Clone, Debug)]
pub struct ArenaMark {
  nodes: usize,
  arcs  : usize,
}

pub struct GraphArena {
  limits: ArenaLimits,

  permanent_nodes: Vec<Node>,
  permanent_arcs : Vec<Arc>,
  temporary_nodes: Vec<Node>,
  temporary_arcs : Vec<Arc>,
}

impl GraphArena {
  pub fn new(limits: ArenaLimits) -> Self {
    GraphArena {
      limits,
      permanent_nodes: Vec::new(),
      permanent_arcs : Vec::new(),
      temporary_nodes: Vec::new(),
      temporary_arcs : Vec::new(),
    }
  }

  // region Allocation

  pub fn alloc_permanent_node(&mut self, r#type: TypeId) -> NodeId {
    assert!(
      self.permanent_nodes.len() < self.limits.max_permanent_nodes,
      "permanent node arena exhausted"
    );
    self.permanent_nodes.push(Node::new(r#type));
    NodeId::Permanent((self.permanent_nodes.len() - 1) as u32)
  }

  pub fn alloc_temporary_node(&mut self, r#type: TypeId) -> NodeId {
    assert!(
      self.temporary_nodes.len() < self.limits.max_temporary_nodes,
      "temporary node arena exhausted"
    );
    self.temporary_nodes.push(Node::new(r#type));
    NodeId::Temporary((self.temporary_nodes.len() - 1) as u32)
  }

  fn alloc_permanent_arc(&mut self, arc: Arc) -> ArcId {
    assert!(
      self.permanent_arcs.len() < self.limits.max_permanent_arcs,
      "permanent arc arena exhausted"
    );
    self.permanent_arcs.push(arc);
    ArcId::Permanent((self.permanent_arcs.len() - 1) as u32)
  }

  fn alloc_temporary_arc(&mut self, arc: Arc) -> ArcId {
    assert!(
      self.temporary_arcs.len() < self.limits.max_temporary_arcs,
      "temporary arc arena exhausted"
    );
    self.temporary_arcs.push(arc);
    ArcId::Temporary((self.temporary_arcs.len() - 1) as u32)
  }

  /// Prepends a new permanent arc `(attr, target)` onto `node`'s permanent arc list.
  pub fn add_permanent_arc(&mut self, node: NodeId, attr: crate::core::attrs::AttrId, target: NodeId) {
    let head = self.node(node).arcs;
    let arc_id = self.alloc_permanent_arc(Arc::new(attr, target, head));
    self.node_mut(node).arcs = Some(arc_id);
  }

  /// Prepends a new arc onto `node`'s permanent arc list, choosing the arc arena that matches
  /// `node`'s own (permanent or temporary). Used by the copier when building a freshly
  /// allocated node's arc list regardless of which arena `node` itself lives in.
  pub fn add_arc(&mut self, node: NodeId, attr: crate::core::attrs::AttrId, target: NodeId) {
    let head = self.node(node).arcs;
    let arc_id = match node {
      NodeId::Permanent(_) => self.alloc_permanent_arc(Arc::new(attr, target, head)),
      NodeId::Temporary(_) => self.alloc_temporary_arc(Arc::new(attr, target, head)),
    };
    self.node_mut(node).arcs = Some(arc_id);
  }

  /// Prepends a new generation-protected `compArcs` entry onto `node`. The caller
  /// (`Engine::touch`) is responsible for ensuring `node`'s generation-protected slots are
  /// already current.
  pub fn cons_comp_arc(&mut self, node: NodeId, attr: crate::core::attrs::AttrId, target: NodeId) -> ArcId {
    let head = self.node(node).comp_arcs;
    let arc_id = self.alloc_temporary_arc(Arc::new(attr, target, head));
    self.node_mut(node).comp_arcs = Some(arc_id);
    arc_id
  }

  // endregion

  // region Accessors

  #[inline(always)]
  pub fn node(&self, id: NodeId) -> &Node {
    match id {
      NodeId::Permanent(i) => &self.permanent_nodes[i as usize],
      NodeId::Temporary(i) => &self.temporary_nodes[i as usize],
    }
  }

  #[inline(always)]
  pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
    match id {
      NodeId::Permanent(i) => &mut self.permanent_nodes[i as usize],
      NodeId::Temporary(i) => &mut self.temporary_nodes[i as usize],
    }
  }

  #[inline(always)]
  pub fn arc(&self, id: ArcId) -> &Arc {
    match id {
      ArcId::Permanent(i) => &self.permanent_arcs[i as usize],
      ArcId::Temporary(i) => &self.temporary_arcs[i as usize],
    }
  }

  // endregion

  // region Mark / release

  pub fn mark(&self) -> ArenaMark {
    ArenaMark {
      nodes: self.temporary_nodes.len(),
      arcs : self.temporary_arcs.len(),
    }
  }

  pub fn release_to(&mut self, mark: ArenaMark) {
    self.temporary_nodes.truncate(mark.nodes);
    self.temporary_arcs.truncate(mark.arcs);
  }

  /// Bytes currently in use across all four backing vectors.
  pub fn current_usage(&self) -> usize {
    self.permanent_nodes.len() * size_of::<Node>()
      + self.permanent_arcs.len() * size_of::<Arc>()
      + self.temporary_nodes.len() * size_of::<Node>()
      + self.temporary_arcs.len() * size_of::<Arc>()
  }

  /// A hint, not a guarantee: returns spare temporary capacity to the allocator between
  /// parses.
  pub fn may_shrink(&mut self) {
    self.temporary_nodes.shrink_to_fit();
    self.temporary_arcs.shrink_to_fit();
  }

  // endregion
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mark_and_release_discards_temporary_allocations() {
    let mut arena = GraphArena::new(ArenaLimits::default());
    let before = arena.mark();

    let n1 = arena.alloc_temporary_node(0);
    arena.add_permanent_arc(n1, 0, n1); // exercise permanent-arc path regardless of node arena
    let _n2 = arena.alloc_temporary_node(1);
    assert_eq!(arena.temporary_nodes.len(), 2);

    arena.release_to(before);
    assert_eq!(arena.temporary_nodes.len(), 0);
  }

  #[test]
  fn permanent_allocations_survive_release() {
    let mut arena = GraphArena::new(ArenaLimits::default());
    let perm = arena.alloc_permanent_node(0);
    let mark = arena.mark();
    let _temp = arena.alloc_temporary_node(1);
    arena.release_to(mark);
    assert_eq!(arena.node(perm).permanent_type(), 0);
  }

  #[test]
  #[should_panic(expected = "exhausted")]
  fn exceeding_the_configured_cap_is_fatal() {
    let limits = ArenaLimits {
      max_permanent_nodes: 1,
      ..ArenaLimits::default()
    };
    let mut arena = GraphArena::new(limits);
    arena.alloc_permanent_node(0);
    arena.alloc_permanent_node(0); // exceeds cap of 1
  }
}
