/*!

A two-key cache from `(TypeId, TypeId)` to `TypeId` (or `BOTTOM`), normalized so `(a, b)` and
`(b, a)` hit the same entry. Leaf-type pairs are deliberately never inserted here — the parent
chain for a leaf is cheap enough to walk directly, and caching every distinct leaf pairing
would grow the cache unboundedly as dynamic string types accumulate.

*/

use crate::abstractions::HashMap;
use crate::core::types::TypeId;

#[derive(Default)]
pub struct GlbCache {
  entries: HashMap<(TypeId, TypeId), TypeId>,
}

impl GlbCache {
  pub fn new() -> Self {
    GlbCache { entries: HashMap::new() }
  }

  #[inline(always)]
  fn key(a: TypeId, b: TypeId) -> (TypeId, TypeId) {
    if a <= b { (a, b) } else { (b, a) }
  }

  pub fn get(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
    self.entries.get(&Self::key(a, b)).copied()
  }

  pub fn insert(&mut self, a: TypeId, b: TypeId, glb: TypeId) {
    self.entries.insert(Self::key(a, b), glb);
  }

  /// Drops every cached entry. Called between parses (or whenever dynamic types are cleared)
  /// to bound memory growth; a correctness requirement only in the sense that stale entries
  /// referencing a since-cleared dynamic type must never be looked up again, which this
  /// trivially ensures by not existing.
  pub fn prune(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_is_symmetric() {
    let mut cache = GlbCache::new();
    cache.insert(3, 1, 1);
    assert_eq!(cache.get(1, 3), Some(1));
    assert_eq!(cache.get(3, 1), Some(1));
  }

  #[test]
  fn prune_clears_everything() {
    let mut cache = GlbCache::new();
    cache.insert(1, 2, 0);
    cache.prune();
    assert_eq!(cache.get(1, 2), None);
    assert_eq!(cache.len(), 0);
  }
}
