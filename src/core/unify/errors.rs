/*!

Unification, copy, and subsumption failures are plain values, not `std::error::Error` types —
they are expected, frequent outcomes on the hot path, not exceptional conditions. Fatal,
load-time errors live in `crate::core::grammar_file` instead.

*/

/// The reason a unification, copy, or subsumption step failed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FailureKind {
  /// `glb` of two corresponding nodes' types was `BOTTOM`.
  TypeClash,
  /// Enforcing a type's appropriateness constraint against the current structure failed.
  ConstraintClash,
  /// Unification or copy re-entered a node already on the active stack.
  Cycle,
  /// Two non-coreferenced nodes were paired with a common partner during subsumption.
  CoreferenceClash,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UnifyFailure {
  pub kind: FailureKind,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CopyFailure {
  pub kind: FailureKind,
}

impl From<CopyFailure> for UnifyFailure {
  fn from(failure: CopyFailure) -> Self {
    UnifyFailure { kind: failure.kind }
  }
}
