#![allow(dead_code)]

pub mod abstractions;
pub mod core;

// We re-export abstractions that are meant to be used publicly.
pub use abstractions::{
  log,
  IString
};

pub use crate::core::{
  types::{TypeHierarchy, TypeId, BOTTOM},
  attrs::{AttrId, AttributeTable},
  graph::node::NodeId,
  unify::{
    Engine, EngineConfig,
    UnifyFailure, CopyFailure, FailureKind,
    Restrictor, DagRestrictor, PathTreeRestrictor,
    QcTree, FailureRecord, FailureRecorder,
    get_qc_vector, qc_compatible_unif, qc_compatible_subs, subsumes,
  },
  grammar_file::{GrammarLoadError, load_grammar},
};

/// The sentinel attribute/node index meaning "no value" where `Option` would cost a
/// discriminant byte we don't want to pay for in a hot struct.
pub(crate) const UNDEFINED: i32 = -1;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn crate_constants_are_sane() {
    assert_eq!(BOTTOM, -1);
    assert_eq!(UNDEFINED, -1);
  }
}
