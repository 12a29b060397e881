/*!

An `Arc` is an `(attr, target)` pair plus a `next` pointer, forming the singly-linked arc list
hung off each `Node`. Two arc lists exist per node: the permanent one (`Node::arcs`) and the
generation-protected `compArcs` extension consed on during unification.

*/

use crate::core::attrs::AttrId;
use crate::core::graph::node::NodeId;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ArcId {
  Permanent(u32),
  Temporary(u32),
}

impl ArcId {
  #[inline(always)]
  pub(crate) fn index(self) -> usize {
    match self {
      ArcId::Permanent(i) | ArcId::Temporary(i) => i as usize,
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct Arc {
  pub(crate) attr: AttrId,
  pub(crate) target: NodeId,
  pub(crate) next: Option<ArcId>,
}

impl Arc {
  pub(crate) fn new(attr: AttrId, target: NodeId, next: Option<ArcId>) -> Self {
    Arc { attr, target, next }
  }
}
