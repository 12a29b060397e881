#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

# Background and Motivation

A motivating example is the `IString` type, an interned string type. A number of external crates could provide this
functionality. This module redirects to whatever chosen implementation we want. To use the
[`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString` as an alias for
`string_cache::DefaultAtom`:

```ignore
pub use string_cache::DefaultAtom as IString;
```

For types or infrastructure with very different backing implementations, we define an abstraction layer over the
implementation. For example, the `log` module could use any of a number of logging frameworks. However, its (crate)
public interface consists only of `set_global_logging_threshold()`/`get_global_logging_threshold()` and the macros
`critical!`, `error!`, `warning!`, `info!`, `debug!`, and `trace!`. The (private) backing implementation is
encapsulated in the `log` module.

*/

mod nat_set;
mod string_join;

use std::collections::{HashMap as StdHashMap, HashSet as StdHashSet};

// Logging
pub mod log;

// Interned string. Use `DefaultAtom` for a global cache that can be used across threads.
pub use string_cache::DefaultAtom as IString;

// region Items meant to be used only internally

// A fixed-width set of small natural numbers, backed by `bit-set`. Used both for the
// `Bitcode` that encodes a proper type's down-set and for attribute-id sets (restriction,
// appropriateness).
pub(crate) use nat_set::NatSet;

// Join sequences with a separator
pub(crate) use string_join::{join_string, join_iter};

/// A general-purpose hash map. Kept as an alias so the hasher can be swapped later without
/// touching every call site.
pub type HashMap<K, V> = StdHashMap<K, V>;

/// A general-purpose hash set.
pub type Set<T> = StdHashSet<T>;

// endregion
