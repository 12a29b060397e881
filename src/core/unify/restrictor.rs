/*!

Restrictors tell the copier which arcs to keep. Two shapes ship: a path-tree restrictor built
from a flat set of paths (pruning only where a path actually ends), and a dag-shaped
restrictor with explicit `Full`/`Del`/`Only` markers at every node, mirroring a second
feature structure laid directly alongside the one being copied.

*/

use crate::abstractions::{HashMap, Set};
use crate::core::attrs::AttrId;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RestrictDecision {
  Keep,
  Delete,
}

/// A dag-shaped restrictor. `Only` keeps exactly the attributes it maps and recurses with the
/// mapped child restrictor; anything not mentioned is deleted.
#[derive(Clone, Debug)]
pub enum DagRestrictor {
  Full,
  Del,
  Only(HashMap<AttrId, DagRestrictor>),
}

impl DagRestrictor {
  fn decide(&self, attr: AttrId) -> RestrictDecision {
    match self {
      DagRestrictor::Full => RestrictDecision::Keep,
      DagRestrictor::Del => RestrictDecision::Delete,
      DagRestrictor::Only(map) => {
        if map.contains_key(&attr) {
          RestrictDecision::Keep
        } else {
          RestrictDecision::Delete
        }
      }
    }
  }

  fn descend(&self, attr: AttrId) -> DagRestrictor {
    match self {
      DagRestrictor::Full => DagRestrictor::Full,
      DagRestrictor::Del => DagRestrictor::Del,
      DagRestrictor::Only(map) => map.get(&attr).cloned().unwrap_or(DagRestrictor::Del),
    }
  }

  fn prunes_anything_here(&self) -> bool {
    !matches!(self, DagRestrictor::Full)
  }
}

/// A set of paths to prune, consuming one attribute per level; only the path's final arc is
/// actually deleted, everything above it is kept (and recursed into) unchanged.
#[derive(Clone, Debug, Default)]
pub struct PathTreeRestrictor {
  children: HashMap<AttrId, PathTreeRestrictor>,
  terminal: Set<AttrId>,
}

impl PathTreeRestrictor {
  pub fn from_paths<I: IntoIterator<Item = Vec<AttrId>>>(paths: I) -> Self {
    let mut root = PathTreeRestrictor::default();
    for path in paths {
      root.insert_path(&path);
    }
    root
  }

  fn insert_path(&mut self, path: &[AttrId]) {
    match path {
      [] => {}
      [only] => {
        self.terminal.insert(*only);
      }
      [head, rest @ ..] => {
        self.children.entry(*head).or_default().insert_path(rest);
      }
    }
  }

  fn decide(&self, attr: AttrId) -> RestrictDecision {
    if self.terminal.contains(&attr) {
      RestrictDecision::Delete
    } else {
      RestrictDecision::Keep
    }
  }

  fn descend(&self, attr: AttrId) -> PathTreeRestrictor {
    self.children.get(&attr).cloned().unwrap_or_default()
  }

  fn prunes_anything_here(&self) -> bool {
    !self.terminal.is_empty() || !self.children.is_empty()
  }
}

/// The restriction discipline the copier accepts: no restriction, a flat attribute set pruned
/// only at the copy's root, or a full per-level restrictor.
#[derive(Clone, Debug)]
pub enum Restrictor {
  None,
  FlatAtRoot(Set<AttrId>, bool),
  PathTree(PathTreeRestrictor),
  Dag(DagRestrictor),
}

impl Restrictor {
  pub fn flat(attrs: Set<AttrId>) -> Self {
    Restrictor::FlatAtRoot(attrs, true)
  }

  pub fn decide(&self, attr: AttrId) -> RestrictDecision {
    match self {
      Restrictor::None => RestrictDecision::Keep,
      Restrictor::FlatAtRoot(set, at_root) => {
        if *at_root && set.contains(&attr) {
          RestrictDecision::Delete
        } else {
          RestrictDecision::Keep
        }
      }
      Restrictor::PathTree(tree) => tree.decide(attr),
      Restrictor::Dag(dag) => dag.decide(attr),
    }
  }

  pub fn descend(&self, attr: AttrId) -> Restrictor {
    match self {
      Restrictor::None => Restrictor::None,
      Restrictor::FlatAtRoot(set, _) => Restrictor::FlatAtRoot(set.clone(), false),
      Restrictor::PathTree(tree) => Restrictor::PathTree(tree.descend(attr)),
      Restrictor::Dag(dag) => Restrictor::Dag(dag.descend(attr)),
    }
  }

  pub fn prunes_anything_here(&self) -> bool {
    match self {
      Restrictor::None => false,
      Restrictor::FlatAtRoot(set, at_root) => *at_root && !set.is_empty(),
      Restrictor::PathTree(tree) => tree.prunes_anything_here(),
      Restrictor::Dag(dag) => dag.prunes_anything_here(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn path_tree_deletes_only_at_the_tip() {
    let tree = PathTreeRestrictor::from_paths(vec![vec![1, 2]]);
    assert_eq!(tree.decide(1), RestrictDecision::Keep);
    let child = tree.descend(1);
    assert_eq!(child.decide(2), RestrictDecision::Delete);
  }

  #[test]
  fn dag_only_keeps_exactly_the_mapped_attributes() {
    let mut map = HashMap::new();
    map.insert(5u32, DagRestrictor::Full);
    let restrictor = DagRestrictor::Only(map);
    assert_eq!(restrictor.decide(5), RestrictDecision::Keep);
    assert_eq!(restrictor.decide(6), RestrictDecision::Delete);
  }

  #[test]
  fn flat_at_root_only_prunes_the_root_level() {
    let mut set = Set::new();
    set.insert(3u32);
    let restrictor = Restrictor::flat(set);
    assert_eq!(restrictor.decide(3), RestrictDecision::Delete);
    let child = restrictor.descend(7);
    assert_eq!(child.decide(3), RestrictDecision::Keep);
  }
}
