/*!

A `Bitcode` encodes a proper type's down-set as a fixed-width bit vector: bit `i` set means
"proper type `i` is a subtype of this one". Subtype test between proper types is bitwise
subset; glb is bitwise intersection followed by a lookup from bitcodes to type ids, since the
hierarchy-building phase closes the set of bitcodes under intersection (adding synthetic "glb
types" as needed) so every intersection names a real type.

*/

use std::hash::Hash;
use crate::abstractions::NatSet;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Bitcode(NatSet);

impl Bitcode {
  pub fn with_capacity(proper_type_count: usize) -> Self {
    Bitcode(NatSet::with_capacity(proper_type_count))
  }

  #[inline(always)]
  pub fn set(&mut self, proper_type: usize) {
    self.0.insert(proper_type);
  }

  #[inline(always)]
  pub fn contains(&self, proper_type: usize) -> bool {
    self.0.contains(proper_type)
  }

  /// `self ≤ other` as down-sets, i.e. `self`'s type is a subtype of `other`'s type.
  #[inline(always)]
  pub fn is_subset_of(&self, other: &Bitcode) -> bool {
    self.0.is_subset_of(&other.0)
  }

  pub fn intersect(&self, other: &Bitcode) -> Bitcode {
    Bitcode(self.0.intersection(&other.0))
  }

  pub fn union_in_place(&mut self, other: &Bitcode) {
    self.0.union_in_place(&other.0);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.0.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subset_matches_intersection() {
    let mut a = Bitcode::with_capacity(8);
    a.set(0);
    a.set(1);
    let mut b = Bitcode::with_capacity(8);
    b.set(0);
    b.set(1);
    b.set(2);

    assert!(a.is_subset_of(&b));
    let i = a.intersect(&b);
    assert_eq!(i, a);
  }
}
