/*!

A fixed-capacity set of small natural numbers, backed by `bit_set::BitSet`.

This is the bit-vector abstraction the type hierarchy's bitcodes and glb computation are built
on: subtype test is `is_subset`, glb is `intersection` followed by a hash lookup. Capacity is
fixed at construction time (the number of proper types in the hierarchy) so that two `NatSet`s
from the same hierarchy are always comparable without a length check.

*/

use std::hash::{Hash, Hasher};
use bit_set::BitSet;

#[derive(Clone, Debug, Eq)]
pub(crate) struct NatSet {
  bits: BitSet,
}

impl NatSet {
  /// An empty set with room for `capacity` bits without reallocating.
  pub fn with_capacity(capacity: usize) -> Self {
    NatSet { bits: BitSet::with_capacity(capacity) }
  }

  #[inline(always)]
  pub fn insert(&mut self, bit: usize) {
    self.bits.insert(bit);
  }

  #[inline(always)]
  pub fn remove(&mut self, bit: usize) {
    self.bits.remove(bit);
  }

  #[inline(always)]
  pub fn contains(&self, bit: usize) -> bool {
    self.bits.contains(bit)
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bits.is_empty()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bits.len()
  }

  /// `self ⊆ other`.
  #[inline(always)]
  pub fn is_subset_of(&self, other: &NatSet) -> bool {
    self.bits.is_subset(&other.bits)
  }

  pub fn union_in_place(&mut self, other: &NatSet) {
    self.bits.union_with(&other.bits);
  }

  /// `self ∩ other`, as a new set.
  pub fn intersection(&self, other: &NatSet) -> NatSet {
    let mut result = self.bits.clone();
    result.intersect_with(&other.bits);
    NatSet { bits: result }
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.bits.iter()
  }
}

impl PartialEq for NatSet {
  fn eq(&self, other: &Self) -> bool {
    self.bits == other.bits
  }
}

// `bit_set::BitSet` does not implement `Hash`, but the glb closure and the bitcode-to-type
// table need `NatSet` as a hash key. `BitSet::iter()` yields set members in ascending order,
// so two equal sets always hash the same members in the same order.
impl Hash for NatSet {
  fn hash<H: Hasher>(&self, state: &mut H) {
    for member in self.bits.iter() {
      member.hash(state);
    }
    // Terminator so that e.g. {1} and {1, 2} with 2 hashed separately can't collide trivially.
    usize::MAX.hash(state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subset_and_intersection() {
    let mut a = NatSet::with_capacity(8);
    let mut b = NatSet::with_capacity(8);
    a.insert(1);
    a.insert(2);
    b.insert(1);
    b.insert(2);
    b.insert(3);

    assert!(a.is_subset_of(&b));
    assert!(!b.is_subset_of(&a));

    let i = a.intersection(&b);
    assert!(i.contains(1));
    assert!(i.contains(2));
    assert!(!i.contains(3));
  }

  #[test]
  fn empty_set_is_subset_of_everything() {
    let empty = NatSet::with_capacity(4);
    let mut full = NatSet::with_capacity(4);
    full.insert(0);
    full.insert(1);
    full.insert(2);
    full.insert(3);
    assert!(empty.is_subset_of(&full));
    assert!(empty.is_empty());
  }

  #[test]
  fn equal_sets_hash_equal() {
    use std::collections::hash_map::DefaultHasher;

    let mut a = NatSet::with_capacity(16);
    let mut b = NatSet::with_capacity(16);
    a.insert(5);
    a.insert(9);
    b.insert(9);
    b.insert(5);
    assert_eq!(a, b);

    let hash_of = |s: &NatSet| {
      let mut hasher = DefaultHasher::new();
      s.hash(&mut hasher);
      hasher.finish()
    };
    assert_eq!(hash_of(&a), hash_of(&b));
  }
}
