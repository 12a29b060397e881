/*!

The unifier: Tomabechi quasi-destructive graph unification (`engine`), smart partial copying
(`copier`), arc-keep predicates (`restrictor`), bidirectional subsumption (`subsumption`),
appropriateness enforcement (`wellformed`), and the quick-check pre-filter (`quick_check`).
`errors` holds the plain-value failure types all of the above return.

*/

pub mod copier;
pub mod engine;
pub mod errors;
pub mod quick_check;
pub mod restrictor;
pub mod subsumption;
pub mod wellformed;

pub use engine::{Engine, EngineConfig};
pub use errors::{CopyFailure, FailureKind, UnifyFailure};
pub use quick_check::{get_qc_vector, qc_compatible_subs, qc_compatible_unif, FailureRecord, FailureRecorder, QcTree};
pub use restrictor::{DagRestrictor, PathTreeRestrictor, RestrictDecision, Restrictor};
pub use subsumption::subsumes;
pub use wellformed::{delta_expand, full_expand};
