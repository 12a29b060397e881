/*!

`TypeHierarchy` is the type lattice: proper types carry an explicit `Bitcode`; static leaf
types carry a single `parent`; dynamic leaf types (string literals registered mid-parse) carry
a `parent` that is always `STRING`. `subtype`/`glb`/`subtype_bidir` are the operations the
unifier, subsumption, and quick check are all built from.

*/

use crate::abstractions::{HashMap, IString};
use crate::core::types::bitcode::Bitcode;
use crate::core::types::glb_cache::GlbCache;
use crate::core::types::{TypeId, BOTTOM};

#[derive(Clone, Debug)]
enum TypeKind {
  Proper { bitcode: Bitcode },
  StaticLeaf { parent: TypeId },
  DynamicLeaf { parent: TypeId },
}

#[derive(Clone, Debug)]
struct TypeEntry {
  name      : IString,
  print_name: IString,
  status    : u8,
  kind      : TypeKind,
}

pub struct TypeHierarchy {
  entries: Vec<TypeEntry>,

  /// `entries[0..first_leaf_type]` are proper types.
  first_leaf_type: TypeId,
  /// `entries[first_leaf_type..n_static_types]` are static leaf types; everything from
  /// `n_static_types` on (appended past `entries`'s length at load time) is dynamic.
  n_static_types: TypeId,

  top        : TypeId,
  string_type: TypeId,

  glb_cache      : GlbCache,
  bitcode_to_type: HashMap<Bitcode, TypeId>,
  dynamic_names  : HashMap<IString, TypeId>,

  /// Cached immediate-supertype lists for proper types, indexed by `TypeId`.
  immediate_supertypes: Vec<Vec<TypeId>>,
}

/// Constructs a `TypeHierarchy` from the grammar loader's type tables. Proper types must all
/// be pushed before any static leaf type (matching the `TypeId` partition the rest of the
/// engine assumes).
pub struct TypeHierarchyBuilder {
  entries: Vec<TypeEntry>,
  first_leaf_type: Option<TypeId>,
}

impl TypeHierarchyBuilder {
  pub fn new() -> Self {
    TypeHierarchyBuilder { entries: Vec::new(), first_leaf_type: None }
  }

  pub fn push_proper(&mut self, name: IString, print_name: IString, status: u8, bitcode: Bitcode) -> TypeId {
    assert!(self.first_leaf_type.is_none(), "all proper types must be pushed before any leaf type");
    self.entries.push(TypeEntry { name, print_name, status, kind: TypeKind::Proper { bitcode } });
    (self.entries.len() - 1) as TypeId
  }

  pub fn push_static_leaf(&mut self, name: IString, print_name: IString, status: u8, parent: TypeId) -> TypeId {
    if self.first_leaf_type.is_none() {
      self.first_leaf_type = Some(self.entries.len() as TypeId);
    }
    self.entries.push(TypeEntry { name, print_name, status, kind: TypeKind::StaticLeaf { parent } });
    (self.entries.len() - 1) as TypeId
  }

  pub fn build(self, top: TypeId, string_type: TypeId) -> TypeHierarchy {
    let first_leaf_type = self.first_leaf_type.unwrap_or(self.entries.len() as TypeId);
    let n_static_types = self.entries.len() as TypeId;

    let mut bitcode_to_type = HashMap::new();
    for (index, entry) in self.entries.iter().enumerate() {
      if let TypeKind::Proper { bitcode } = &entry.kind {
        bitcode_to_type.insert(bitcode.clone(), index as TypeId);
      }
    }

    let mut hierarchy = TypeHierarchy {
      entries: self.entries,
      first_leaf_type,
      n_static_types,
      top,
      string_type,
      glb_cache: GlbCache::new(),
      bitcode_to_type,
      dynamic_names: HashMap::new(),
      immediate_supertypes: Vec::new(),
    };
    hierarchy.immediate_supertypes = hierarchy.compute_immediate_supertypes();
    hierarchy
  }
}

impl TypeHierarchy {
  // region Classification

  #[inline(always)]
  fn is_proper(&self, t: TypeId) -> bool {
    t >= 0 && t < self.first_leaf_type
  }

  #[inline(always)]
  fn is_leaf(&self, t: TypeId) -> bool {
    t >= self.first_leaf_type
  }

  #[inline(always)]
  fn entry(&self, t: TypeId) -> &TypeEntry {
    &self.entries[t as usize]
  }

  pub fn top(&self) -> TypeId {
    self.top
  }

  pub fn string_type(&self) -> TypeId {
    self.string_type
  }

  pub fn name(&self, t: TypeId) -> &IString {
    &self.entry(t).name
  }

  pub fn print_name(&self, t: TypeId) -> &IString {
    &self.entry(t).print_name
  }

  pub fn status(&self, t: TypeId) -> u8 {
    self.entry(t).status
  }

  pub fn proper_type_count(&self) -> usize {
    self.first_leaf_type as usize
  }

  // endregion

  // region Subtype / glb

  /// `a ≤ b`: `TOP` is super of all, `BOTTOM` is sub of all. A dynamic leaf is a subtype of
  /// `b` iff `STRING` is. A static leaf walks its parent chain until a proper type is
  /// reached; two proper types compare by bitcode subset.
  pub fn subtype(&self, a: TypeId, b: TypeId) -> bool {
    if b == self.top {
      return true;
    }
    if a == BOTTOM {
      return true;
    }
    if b == BOTTOM {
      return a == BOTTOM;
    }
    if a == b {
      return true;
    }

    match &self.entry(a).kind {
      TypeKind::DynamicLeaf { .. } => self.subtype(self.string_type, b),
      TypeKind::StaticLeaf { parent } => self.subtype(*parent, b),
      TypeKind::Proper { bitcode: bitcode_a } => match &self.entry(b).kind {
        TypeKind::Proper { bitcode: bitcode_b } => bitcode_a.is_subset_of(bitcode_b),
        // A proper type can only be a subtype of a leaf type if they're equal, already
        // handled above.
        TypeKind::StaticLeaf { .. } | TypeKind::DynamicLeaf { .. } => false,
      },
    }
  }

  /// `(a ≤ b, b ≤ a)` in one call. Proper/proper does a single bitcode comparison in each
  /// direction (still two subset tests — the "single pass" the design calls for is over the
  /// bitcode words, which `NatSet::is_subset_of` already is); leaves fall back to two
  /// `subtype` calls.
  pub fn subtype_bidir(&self, a: TypeId, b: TypeId) -> (bool, bool) {
    if a == b {
      return (true, true);
    }
    if let (TypeKind::Proper { bitcode: bitcode_a }, TypeKind::Proper { bitcode: bitcode_b })
      = (&self.entry_or_sentinel(a), &self.entry_or_sentinel(b))
    {
      return (bitcode_a.is_subset_of(bitcode_b), bitcode_b.is_subset_of(bitcode_a));
    }
    (self.subtype(a, b), self.subtype(b, a))
  }

  fn entry_or_sentinel(&self, t: TypeId) -> TypeKindRef {
    if t == BOTTOM || t == self.top {
      // TOP and BOTTOM are never proper-with-bitcode as far as this fast path is concerned;
      // fall through to the general `subtype` logic for them.
      return TypeKindRef::Other;
    }
    match &self.entry(t).kind {
      TypeKind::Proper { bitcode } => TypeKindRef::Proper(bitcode),
      _ => TypeKindRef::Other,
    }
  }

  pub fn glb(&mut self, a: TypeId, b: TypeId) -> TypeId {
    if a == b {
      return a;
    }
    if let Some(cached) = self.glb_cache.get(a, b) {
      return cached;
    }

    let result = self.glb_uncached(a, b);

    if !self.is_leaf(a) && !self.is_leaf(b) {
      self.glb_cache.insert(a, b, result);
    }
    result
  }

  fn glb_uncached(&self, a: TypeId, b: TypeId) -> TypeId {
    if a == self.top {
      return b;
    }
    if b == self.top {
      return a;
    }
    if a == BOTTOM || b == BOTTOM {
      return BOTTOM;
    }

    match (&self.entry(a).kind, &self.entry(b).kind) {
      (TypeKind::DynamicLeaf { .. }, TypeKind::DynamicLeaf { .. }) => {
        if a == b { a } else { BOTTOM }
      }
      (TypeKind::DynamicLeaf { .. }, _) => {
        if self.subtype(self.string_type, b) { a } else { BOTTOM }
      }
      (_, TypeKind::DynamicLeaf { .. }) => {
        if self.subtype(self.string_type, a) { b } else { BOTTOM }
      }
      (TypeKind::StaticLeaf { .. }, _) | (_, TypeKind::StaticLeaf { .. }) => {
        if self.subtype(a, b) {
          a
        } else if self.subtype(b, a) {
          b
        } else {
          BOTTOM
        }
      }
      (TypeKind::Proper { bitcode: bitcode_a }, TypeKind::Proper { bitcode: bitcode_b }) => {
        let intersection = bitcode_a.intersect(bitcode_b);
        self.bitcode_to_type.get(&intersection).copied().unwrap_or(BOTTOM)
      }
    }
  }

  // endregion

  // region Supertypes

  fn compute_immediate_supertypes(&self) -> Vec<Vec<TypeId>> {
    let proper_count = self.first_leaf_type as usize;
    let mut result = vec![Vec::new(); proper_count];

    // A covers B (B is an immediate supertype of A) iff B's bitcode strictly contains A's and
    // no proper type's bitcode sits strictly between them.
    for a in 0..proper_count {
      let bitcode_a = match &self.entries[a].kind {
        TypeKind::Proper { bitcode } => bitcode,
        _ => unreachable!(),
      };
      let mut candidates: Vec<TypeId> = Vec::new();
      for b in 0..proper_count {
        if a == b {
          continue;
        }
        let bitcode_b = match &self.entries[b].kind {
          TypeKind::Proper { bitcode } => bitcode,
          _ => unreachable!(),
        };
        if bitcode_a.is_subset_of(bitcode_b) && bitcode_a != *bitcode_b {
          candidates.push(b as TypeId);
        }
      }
      // Drop any candidate that is itself a supertype of another candidate (keep only the
      // immediate ones).
      let mut immediate = Vec::new();
      'candidate: for &c in &candidates {
        let bitcode_c = match &self.entries[c as usize].kind {
          TypeKind::Proper { bitcode } => bitcode,
          _ => unreachable!(),
        };
        for &other in &candidates {
          if other == c {
            continue;
          }
          let bitcode_other = match &self.entries[other as usize].kind {
            TypeKind::Proper { bitcode } => bitcode,
            _ => unreachable!(),
          };
          if bitcode_other.is_subset_of(bitcode_c) && bitcode_other != *bitcode_c {
            // `other` is strictly between `a` and `c`, so `c` is not immediate.
            continue 'candidate;
          }
        }
        immediate.push(c);
      }
      result[a] = immediate;
    }

    result
  }

  pub fn immediate_supertypes(&self, t: TypeId) -> Vec<TypeId> {
    match &self.entry(t).kind {
      TypeKind::Proper { .. } => self.immediate_supertypes[t as usize].clone(),
      TypeKind::StaticLeaf { parent } | TypeKind::DynamicLeaf { parent } => vec![*parent],
    }
  }

  pub fn all_supertypes(&self, t: TypeId) -> Vec<TypeId> {
    let mut seen = crate::abstractions::Set::new();
    let mut stack = vec![t];
    let mut result = Vec::new();
    while let Some(current) = stack.pop() {
      for &parent in &self.immediate_supertypes(current) {
        if seen.insert(parent) {
          result.push(parent);
          stack.push(parent);
        }
      }
    }
    result
  }

  // endregion

  // region Dynamic types

  /// Registers (or returns the existing id for) a dynamic leaf type under `STRING` named
  /// `s`. Stable for the lifetime of the current sentence/parse.
  pub fn retrieve_string_type(&mut self, s: &IString) -> TypeId {
    if let Some(&existing) = self.dynamic_names.get(s) {
      return existing;
    }
    let id = (self.entries.len()) as TypeId;
    self.entries.push(TypeEntry {
      name: s.clone(),
      print_name: s.clone(),
      status: 0,
      kind: TypeKind::DynamicLeaf { parent: self.string_type },
    });
    self.dynamic_names.insert(s.clone(), id);
    id
  }

  /// Drops every dynamic type registered since grammar load, and prunes the glb cache (which
  /// never held leaf-pair entries anyway, but may hold stale proper-type entries computed
  /// while a now-gone dynamic type's ancestor chain was involved indirectly through nothing —
  /// kept here purely as the "prune between parses" policy the design calls for).
  pub fn clear_dynamic_types(&mut self) {
    self.entries.truncate(self.n_static_types as usize);
    self.dynamic_names.clear();
    self.glb_cache.prune();
  }

  // endregion
}

enum TypeKindRef<'a> {
  Proper(&'a Bitcode),
  Other,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::types::bitcode::Bitcode;

  /// Builds `TOP(0) > U(1) > T(2)` and `TOP(0) > V(3)`, `T`/`V` incompatible (no common
  /// subtype below `TOP`), as a small proper-type-only lattice.
  fn small_hierarchy() -> TypeHierarchy {
    let mut builder = TypeHierarchyBuilder::new();

    // Bitcode bit i set means "is a subtype of proper type i". TOP's down-set is everyone.
    let mut top_bits = Bitcode::with_capacity(4);
    for i in 0..4 {
      top_bits.set(i);
    }
    let mut u_bits = Bitcode::with_capacity(4);
    u_bits.set(1);
    u_bits.set(2);
    let mut t_bits = Bitcode::with_capacity(4);
    t_bits.set(2);
    let mut v_bits = Bitcode::with_capacity(4);
    v_bits.set(3);

    let top = builder.push_proper(IString::from("TOP"), IString::from("TOP"), 0, top_bits);
    let u = builder.push_proper(IString::from("U"), IString::from("U"), 0, u_bits);
    let t = builder.push_proper(IString::from("T"), IString::from("T"), 0, t_bits);
    let v = builder.push_proper(IString::from("V"), IString::from("V"), 0, v_bits);
    assert_eq!((top, u, t, v), (0, 1, 2, 3));

    builder.build(top, /* string_type placeholder, unused in this test */ top)
  }

  #[test]
  fn subtype_respects_bitcodes() {
    let h = small_hierarchy();
    assert!(h.subtype(2, 1)); // T <= U
    assert!(h.subtype(2, 0)); // T <= TOP
    assert!(!h.subtype(3, 2)); // V !<= T
    assert!(h.subtype(0, 0));
  }

  #[test]
  fn glb_of_incompatible_types_is_bottom() {
    let mut h = small_hierarchy();
    assert_eq!(h.glb(2, 3), BOTTOM); // T, V incompatible
    assert_eq!(h.glb(2, 1), 2); // glb(T, U) = T
    assert_eq!(h.glb(1, 1), 1);
  }

  #[test]
  fn glb_is_commutative_and_cached() {
    let mut h = small_hierarchy();
    assert_eq!(h.glb(2, 1), h.glb(1, 2));
    assert_eq!(h.glb_cache.len(), 1); // one entry serves both orderings
  }

  #[test]
  fn dynamic_types_subtype_string_and_clear() {
    let mut builder = TypeHierarchyBuilder::new();
    let mut top_bits = Bitcode::with_capacity(1);
    top_bits.set(0);
    let top = builder.push_proper(IString::from("TOP"), IString::from("TOP"), 0, top_bits);
    let string_type = builder.push_static_leaf(IString::from("STRING"), IString::from("STRING"), 0, top);
    let mut h = builder.build(top, string_type);

    let foo = h.retrieve_string_type(&IString::from("foo"));
    let bar = h.retrieve_string_type(&IString::from("bar"));
    assert!(h.subtype(foo, string_type));
    assert!(!h.subtype(string_type, foo));
    assert_eq!(h.glb(foo, bar), BOTTOM);

    h.clear_dynamic_types();
    // `foo`/`bar` no longer exist; re-registering starts from the same id again.
    let foo_again = h.retrieve_string_type(&IString::from("foo"));
    assert_eq!(foo_again, foo);
  }
}
