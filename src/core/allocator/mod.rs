/*!

The arena allocator backing the feature-structure graph. Two arenas — **permanent** (grows
only; grammar dags and cached well-formedness constraints live here) and **temporary**
(supports mark/release; scratch space for one unification attempt) — each serving fixed-size
node and arc slots so no allocation carries a per-object header.

Allocation is O(1) bump-pointer. The arena's own out-of-capacity failure is the one place this
module is allowed to panic: out-of-arena failures are fatal by design, and a configured hard
cap being exceeded indicates a corrupt grammar or a runaway process, not a recoverable
condition a caller could sensibly handle.

*/

mod arena;

pub use arena::{GraphArena, ArenaMark, ArenaLimits};
