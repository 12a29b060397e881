/*!

`Engine` bundles everything one unification attempt needs: the arena, the type hierarchy, the
attribute table, the constraint-dag cache, and the generation counter whose advance is the
whole undo mechanism. Accessors for a node's generation-protected slots live here rather than
on `Node` itself, since "is this slot current" is a question only the engine's counter can
answer.

*/

use crate::abstractions::HashMap;
use crate::core::allocator::{ArenaLimits, ArenaMark, GraphArena};
use crate::core::attrs::{AttrId, AttributeTable};
use crate::core::graph::arc::ArcId;
use crate::core::graph::node::{CopyState, NodeId};
use crate::core::types::{TypeHierarchy, TypeId, BOTTOM};
use crate::core::unify::copier::{self, CopyTarget};
use crate::core::unify::errors::{CopyFailure, FailureKind, UnifyFailure};
use crate::core::unify::quick_check::{FailureRecord, FailureRecorder};
use crate::core::unify::restrictor::Restrictor;

/// Arena capacities, initial quick-check vector length, and which optional passes are active.
/// Built once at grammar-load time and threaded through the engine for its whole lifetime.
#[derive(Clone, Debug)]
pub struct EngineConfig {
  pub arena_limits: ArenaLimits,
  pub initial_qc_len: usize,
  pub well_formedness_enabled: bool,
  pub failure_recording_enabled: bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    EngineConfig {
      arena_limits: ArenaLimits::default(),
      initial_qc_len: 0,
      well_formedness_enabled: true,
      failure_recording_enabled: false,
    }
  }
}

pub struct Engine {
  arena: GraphArena,
  hierarchy: TypeHierarchy,
  attrs: AttributeTable,
  config: EngineConfig,

  unify_generation: u64,
  constraint_cache: HashMap<TypeId, NodeId>,
  failure_recorder: Option<FailureRecorder>,

  /// Reversed-on-record path of attribute ids from the top-level call down to the current
  /// recursion point, used only when `failure_recorder` is active.
  current_path: Vec<AttrId>,
  nodes_visited: usize,
}

impl Engine {
  pub fn new(hierarchy: TypeHierarchy, attrs: AttributeTable, config: EngineConfig) -> Self {
    let failure_recorder = if config.failure_recording_enabled {
      Some(FailureRecorder::new())
    } else {
      None
    };
    Engine {
      arena: GraphArena::new(config.arena_limits),
      hierarchy,
      attrs,
      unify_generation: 0,
      constraint_cache: HashMap::new(),
      failure_recorder,
      current_path: Vec::new(),
      nodes_visited: 0,
      config,
    }
  }

  // region Accessors

  pub fn hierarchy(&self) -> &TypeHierarchy {
    &self.hierarchy
  }

  pub fn hierarchy_mut(&mut self) -> &mut TypeHierarchy {
    &mut self.hierarchy
  }

  pub fn attrs(&self) -> &AttributeTable {
    &self.attrs
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn failure_recorder(&self) -> Option<&FailureRecorder> {
    self.failure_recorder.as_ref()
  }

  pub(crate) fn failure_recording_enabled(&self) -> bool {
    self.config.failure_recording_enabled
  }

  pub fn constraint_cache(&self) -> &HashMap<TypeId, NodeId> {
    &self.constraint_cache
  }

  pub fn register_constraint(&mut self, t: TypeId, root: NodeId) {
    self.constraint_cache.insert(t, root);
  }

  pub fn arena_mark(&self) -> ArenaMark {
    self.arena.mark()
  }

  pub fn arena_release(&mut self, mark: ArenaMark) {
    self.arena.release_to(mark);
  }

  pub(crate) fn alloc_temporary_node(&mut self, r#type: TypeId) -> NodeId {
    self.arena.alloc_temporary_node(r#type)
  }

  pub(crate) fn alloc_permanent_node(&mut self, r#type: TypeId) -> NodeId {
    self.arena.alloc_permanent_node(r#type)
  }

  /// Allocates a fresh, arcless temporary node of type `t` — the entry point for building an
  /// input feature structure (a lexical entry, a parser's edge label) from outside the
  /// grammar loader. Lives only until the next `arena_release`/`unify`/`copy` call discards it.
  pub fn new_node(&mut self, t: TypeId) -> NodeId {
    self.alloc_temporary_node(t)
  }

  /// Allocates a fresh, arcless permanent node of type `t`. Permanent nodes outlive every
  /// `arena_release`; use sparingly outside grammar loading (e.g. a constraint root built by
  /// hand rather than read from a grammar file).
  pub fn new_permanent_node(&mut self, t: TypeId) -> NodeId {
    self.alloc_permanent_node(t)
  }

  pub(crate) fn add_arc(&mut self, node: NodeId, attr: AttrId, target: NodeId) {
    self.arena.add_arc(node, attr, target);
  }

  pub fn add_permanent_arc(&mut self, node: NodeId, attr: AttrId, target: NodeId) {
    self.arena.add_permanent_arc(node, attr, target);
  }

  // endregion

  // region Generation-protected slot access

  fn touch(&mut self, node: NodeId) {
    let current = self.unify_generation;
    let n = self.arena.node_mut(node);
    if n.generation != current {
      n.generation = current;
      n.new_type = n.r#type;
      n.comp_arcs = None;
      n.forward = None;
      n.copy_state = CopyState::Unvisited;
    }
  }

  fn is_generation_current(&self, node: NodeId) -> bool {
    self.arena.node(node).generation == self.unify_generation
  }

  pub fn permanent_type(&self, node: NodeId) -> TypeId {
    self.arena.node(node).r#type
  }

  /// The node's effective type without perturbing its generation — `new_type` if this node
  /// was already touched this generation, `type` otherwise.
  pub fn current_type(&self, node: NodeId) -> TypeId {
    if self.is_generation_current(node) {
      self.arena.node(node).new_type
    } else {
      self.arena.node(node).r#type
    }
  }

  pub(crate) fn new_type(&mut self, node: NodeId) -> TypeId {
    self.touch(node);
    self.arena.node(node).new_type
  }

  pub(crate) fn set_new_type(&mut self, node: NodeId, t: TypeId) {
    self.touch(node);
    self.arena.node_mut(node).new_type = t;
  }

  pub(crate) fn forward_of(&mut self, node: NodeId) -> Option<NodeId> {
    self.touch(node);
    self.arena.node(node).forward
  }

  pub(crate) fn set_forward(&mut self, node: NodeId, target: NodeId) {
    self.touch(node);
    self.arena.node_mut(node).forward = Some(target);
  }

  pub(crate) fn comp_arcs_of(&mut self, node: NodeId) -> Option<ArcId> {
    self.touch(node);
    self.arena.node(node).comp_arcs
  }

  pub(crate) fn copy_state(&mut self, node: NodeId) -> CopyState {
    self.touch(node);
    self.arena.node(node).copy_state
  }

  pub(crate) fn set_copy_state(&mut self, node: NodeId, state: CopyState) {
    self.touch(node);
    self.arena.node_mut(node).copy_state = state;
  }

  fn node_has_arcs(&mut self, node: NodeId) -> bool {
    self.arena.node(node).has_permanent_arcs() || self.comp_arcs_of(node).is_some()
  }

  /// Follows `forward` pointers to their fixed point.
  pub fn deref(&mut self, mut node: NodeId) -> NodeId {
    while let Some(target) = self.forward_of(node) {
      node = target;
    }
    node
  }

  // endregion

  // region Arc lookup

  fn walk_arc_list(&self, mut head: Option<ArcId>) -> Vec<(AttrId, NodeId)> {
    let mut result = Vec::new();
    while let Some(id) = head {
      let arc = self.arena.arc(id);
      result.push((arc.attr, arc.target));
      head = arc.next;
    }
    result
  }

  /// All of `node`'s arcs, permanent ones first, then any `compArcs` accumulated this
  /// generation.
  pub fn collect_arcs(&self, node: NodeId) -> Vec<(AttrId, NodeId)> {
    let n = self.arena.node(node);
    let mut result = self.walk_arc_list(n.arcs);
    if self.is_generation_current(node) {
      result.extend(self.walk_arc_list(n.comp_arcs));
    }
    result
  }

  fn search_arc_list(&self, mut head: Option<ArcId>, attr: AttrId) -> Option<NodeId> {
    while let Some(id) = head {
      let arc = self.arena.arc(id);
      if arc.attr == attr {
        return Some(arc.target);
      }
      head = arc.next;
    }
    None
  }

  pub fn find_arc(&self, node: NodeId, attr: AttrId) -> Option<NodeId> {
    let n = self.arena.node(node);
    self
      .search_arc_list(n.arcs, attr)
      .or_else(|| {
        if self.is_generation_current(node) {
          self.search_arc_list(n.comp_arcs, attr)
        } else {
          None
        }
      })
  }

  pub(crate) fn constraint_target(&mut self, node: NodeId, attr: AttrId) -> Option<NodeId> {
    let t = self.new_type(node);
    let constraint_root = *self.constraint_cache.get(&t)?;
    self.find_arc(constraint_root, attr)
  }

  // endregion

  // region Failure-recording path tracking

  pub(crate) fn push_path(&mut self, attr: AttrId) {
    self.current_path.push(attr);
  }

  pub(crate) fn pop_path(&mut self) {
    self.current_path.pop();
  }

  fn reset_path(&mut self) {
    self.current_path.clear();
    self.nodes_visited = 0;
  }

  pub(crate) fn record_failure(&mut self, kind: FailureKind) {
    if let Some(recorder) = &mut self.failure_recorder {
      let mut path = self.current_path.clone();
      path.reverse();
      recorder.record(FailureRecord { kind, path, cost: self.nodes_visited });
    }
  }

  // endregion

  // region Generation lifecycle

  /// Advances the generation counter, the single O(1) "commit or discard" operation: every
  /// generation-protected slot on every node reverts to its permanent value the next time it
  /// is touched.
  pub fn invalidate_generation(&mut self) {
    self.unify_generation += 1;
  }

  // endregion

  // region Unification

  pub(crate) fn unify1(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, UnifyFailure> {
    self.nodes_visited += 1;

    let a = self.deref(a);
    let b = self.deref(b);

    if matches!(self.copy_state(a), CopyState::OnStack) {
      self.record_failure(FailureKind::Cycle);
      return Err(UnifyFailure { kind: FailureKind::Cycle });
    }
    if a == b {
      return Ok(a);
    }
    self.unify2(a, b)
  }

  fn unify2(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, UnifyFailure> {
    let s1 = self.new_type(a);
    let s2 = self.new_type(b);
    let g = self.hierarchy.glb(s1, s2);
    if g == BOTTOM {
      self.record_failure(FailureKind::TypeClash);
      return Err(UnifyFailure { kind: FailureKind::TypeClash });
    }
    self.set_new_type(a, g);

    if self.config.well_formedness_enabled && g != s1 && g != s2 {
      self.enforce_constraint(a, g)?;
    }

    let b_has_arcs = self.node_has_arcs(b);
    let a_has_arcs = self.node_has_arcs(a);

    if !b_has_arcs {
      self.set_forward(b, a);
    } else if !a_has_arcs {
      self.set_new_type(b, g);
      self.set_forward(a, b);
    } else {
      self.set_copy_state(a, CopyState::OnStack);
      self.set_forward(b, a);
      if let Err(failure) = self.unify_arcs(a, b) {
        self.set_copy_state(a, CopyState::Unvisited);
        return Err(failure);
      }
      self.set_copy_state(a, CopyState::Unvisited);
    }

    Ok(self.deref(a))
  }

  fn unify_arcs(&mut self, a: NodeId, b: NodeId) -> Result<(), UnifyFailure> {
    for (attr, target_b) in self.collect_arcs(b) {
      match self.find_arc(a, attr) {
        Some(target_a) => {
          self.push_path(attr);
          let result = self.unify1(target_a, target_b);
          self.pop_path();
          result?;
        }
        None => {
          self.arena.cons_comp_arc(a, attr, target_b);
        }
      }
    }
    Ok(())
  }

  fn enforce_constraint(&mut self, node: NodeId, t: TypeId) -> Result<(), UnifyFailure> {
    let Some(&constraint_root) = self.constraint_cache.get(&t) else {
      return Ok(());
    };
    // A fresh copy, never the cached root itself: this generation may enforce the same
    // type's constraint against several unrelated nodes, and unify1 mutates generation-
    // protected slots in place, so sharing the cached root across calls would conflate them.
    let fresh_root = copier::fresh_copy(self, constraint_root, CopyTarget::Temporary)?;
    match self.unify1(node, fresh_root) {
      Ok(_) => Ok(()),
      Err(mut failure) => {
        // A cycle met while enforcing a type constraint is reported as the constraint
        // failing, not as a structural cycle in the caller's own dags.
        failure.kind = FailureKind::ConstraintClash;
        Err(failure)
      }
    }
  }

  /// Full top-level unification: unify `a` and `b` in place, then materialize a copy (sharing
  /// whatever didn't change) rooted at `root`, with `restrict` applied. Always restores the
  /// inputs on failure by releasing the temporary arena back to the pre-call mark and
  /// advancing the generation.
  pub fn unify(
    &mut self,
    root: NodeId,
    a: NodeId,
    b: NodeId,
    restrict: &Restrictor,
  ) -> Result<NodeId, UnifyFailure> {
    let mark = self.arena_mark();
    self.reset_path();

    let unify_result = self.unify1(a, b);
    let outcome = unify_result.and_then(|_| {
      copier::partial_copy(self, root, restrict, CopyTarget::Temporary).map_err(UnifyFailure::from)
    });

    match &outcome {
      Ok(_) => {
        self.invalidate_generation();
      }
      Err(_) => {
        self.arena_release(mark);
        self.invalidate_generation();
      }
    }
    outcome
  }

  /// Unifies without materializing a copy; the caller gets back a live, generation-protected
  /// representative. The caller owns calling `invalidate_generation` when done inspecting it.
  pub fn unify_np(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, UnifyFailure> {
    self.reset_path();
    self.unify1(a, b)
  }

  /// `unify1` discarding all mutation immediately afterward — a pure compatibility check.
  pub fn dags_compatible(&mut self, a: NodeId, b: NodeId) -> bool {
    let mark = self.arena_mark();
    self.reset_path();
    let ok = self.unify1(a, b).is_ok();
    self.arena_release(mark);
    self.invalidate_generation();
    ok
  }

  /// Copies `node` honoring `restrict`, into the temporary arena unless `permanent`.
  pub fn copy(&mut self, node: NodeId, restrict: &Restrictor, permanent: bool) -> Result<NodeId, CopyFailure> {
    let target = if permanent { CopyTarget::Permanent } else { CopyTarget::Temporary };
    copier::partial_copy(self, node, restrict, target)
  }
  // endregion
}
