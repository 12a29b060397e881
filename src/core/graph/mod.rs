/*!

The feature-structure graph: a single node type plus an ordered singly-linked arc list keyed
by attribute id. Everything above this layer (unification, copying, subsumption, quick check)
is built entirely out of the accessors exposed here; the graph itself knows nothing about
unification.

*/

pub mod node;
pub mod arc;

pub use node::{Node, NodeId, CopyState};
pub use arc::{Arc, ArcId};
