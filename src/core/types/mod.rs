/*!

The type hierarchy: static proper/leaf type codes, bit-encoded subsumption and glb, and the
dynamic string types parsers register at run time. See `hierarchy::TypeHierarchy` for the
operations; `bitcode::Bitcode` for the bit-vector encoding a proper type's down-set.

*/

pub mod bitcode;
pub mod glb_cache;
pub mod hierarchy;

pub use bitcode::Bitcode;
pub use hierarchy::TypeHierarchy;

/// A type code. Non-negative except for the `BOTTOM` sentinel. `[0, first_leaf_type)` are
/// proper types; `[first_leaf_type, n_static_types)` are static leaf types; the rest are
/// dynamic leaf types registered at run time.
pub type TypeId = i32;

/// Unification failure, or "no such type". Sub of everything.
pub const BOTTOM: TypeId = -1;
