/*!

`Node` is the feature-structure graph's one primitive. Its permanent fields (`r#type`, `arcs`)
are what a printer or a grammar dump sees; its generation-protected fields (`new_type`,
`comp_arcs`, `forward`, `copy_state`, `generation`) are a Tomabechi quasi-destructive unifier's
scratch space, valid only while `generation` matches the engine's current `unify_generation`.

Accessors that read or write a generation-protected slot live on `Engine`
(`crate::core::unify::engine`), not here, because "is this slot current" requires comparing
against the engine's counter. `Node` itself is a plain record.

*/

use crate::core::graph::arc::ArcId;
use crate::core::types::TypeId;

/// A typed index into one of the graph's four backing vectors (permanent/temporary ×
/// node/arc). Tagging the handle by arena, rather than using a single flat index space, is
/// what lets the permanent arena grow without ever invalidating a temporary handle and vice
/// versa.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeId {
  Permanent(u32),
  Temporary(u32),
}

impl NodeId {
  #[inline(always)]
  pub fn is_permanent(self) -> bool {
    matches!(self, NodeId::Permanent(_))
  }

  #[inline(always)]
  pub(crate) fn index(self) -> usize {
    match self {
      NodeId::Permanent(i) | NodeId::Temporary(i) => i as usize,
    }
  }
}

/// The cycle/visit state of a node during copying or well-formedness expansion. A type-safe
/// stand-in for the reference algorithm's overloaded `copy == INSIDE` sentinel.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum CopyState {
  #[default]
  Unvisited,
  /// On the copy/cycle-detection stack for the current top-level operation.
  OnStack,
  /// Already copied this generation; holds the copy's handle so repeated visits share it.
  Copied(NodeId),
}

#[derive(Clone, Debug)]
pub struct Node {
  /// The node's permanent type. Unaffected by any in-progress unification.
  pub(crate) r#type: TypeId,

  /// Head of the node's permanent, ordered singly-linked arc list.
  pub(crate) arcs: Option<ArcId>,

  // region Generation-protected slots. Valid iff `generation == engine.unify_generation`;
  // otherwise treated as `new_type == type`, `comp_arcs == None`, `forward == None`,
  // `copy_state == Unvisited`.
  pub(crate) generation: u64,
  pub(crate) new_type: TypeId,
  pub(crate) comp_arcs: Option<ArcId>,
  pub(crate) forward: Option<NodeId>,
  pub(crate) copy_state: CopyState,
  // endregion
}

impl Node {
  /// A freshly allocated node: no arcs, no stale generation-protected state.
  pub(crate) fn new(r#type: TypeId) -> Self {
    Node {
      r#type,
      arcs: None,
      generation: 0,
      new_type: r#type,
      comp_arcs: None,
      forward: None,
      copy_state: CopyState::Unvisited,
    }
  }

  /// The node's permanent type, ignoring any in-progress unification.
  #[inline(always)]
  pub fn permanent_type(&self) -> TypeId {
    self.r#type
  }

  #[inline(always)]
  pub fn has_permanent_arcs(&self) -> bool {
    self.arcs.is_some()
  }
}
