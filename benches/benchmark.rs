//! Manual-harness benchmarks (no `criterion` in the dependency stack, so this times things by
//! hand with `std::time::Instant` and prints a simple report, run via `cargo bench`).

use std::time::Instant;

use mod2unify::core::types::hierarchy::TypeHierarchyBuilder;
use mod2unify::core::types::bitcode::Bitcode;
use mod2unify::{AttributeTable, Engine, EngineConfig, Restrictor};

const CHAIN_LEN: usize = 64;

/// A linear chain `T0 > T1 > ... > T{N-1}`: `Ti`'s bitcode is bits `i..N`, so `Ti <= Tj` iff
/// `i >= j`. Cheap to build, deep enough to exercise `glb`'s bitcode-intersection path and the
/// immediate-supertype computation with a non-trivial ancestor chain.
fn build_chain_hierarchy(n: usize) -> TypeHierarchyBuilder {
  let mut builder = TypeHierarchyBuilder::new();
  for i in 0..n {
    let mut bits = Bitcode::with_capacity(n);
    for bit in i..n {
      bits.set(bit);
    }
    let name = mod2unify::IString::from(format!("T{i}").as_str());
    builder.push_proper(name.clone(), name, 0, bits);
  }
  builder
}

fn bench_glb() {
  let builder = build_chain_hierarchy(CHAIN_LEN);
  let mut hierarchy = builder.build(0, CHAIN_LEN as i32);

  let iterations = 200_000usize;
  let start = Instant::now();
  for i in 0..iterations {
    let a = (i % CHAIN_LEN) as i32;
    let b = ((i * 7 + 3) % CHAIN_LEN) as i32;
    std::hint::black_box(hierarchy.glb(a, b));
  }
  let elapsed = start.elapsed();
  println!(
    "glb: {iterations} calls over a {CHAIN_LEN}-type chain in {:?} ({:.1} ns/call)",
    elapsed,
    elapsed.as_nanos() as f64 / iterations as f64
  );
}

/// Builds two small feature structures sharing most of their structure (a two-attribute
/// record whose first value is a deep-chain type and whose second value is another small
/// record) and times repeated top-level `unify` calls, each run in its own arena mark/release
/// so the arena doesn't grow unboundedly across iterations.
fn bench_unify() {
  let builder = build_chain_hierarchy(CHAIN_LEN);
  let hierarchy = builder.build(0, CHAIN_LEN as i32);
  let mut engine = Engine::new(hierarchy, AttributeTable::with_capacity(2), EngineConfig::default());

  const ATTR_FIRST: u32 = 0;
  const ATTR_SECOND: u32 = 1;

  let iterations = 50_000usize;
  let start = Instant::now();
  for _ in 0..iterations {
    let mark = engine.arena_mark();

    let a_first = engine.new_node(10);
    let a_second = engine.new_node(20);
    let a_root = engine.new_node(0);
    engine.add_permanent_arc(a_root, ATTR_FIRST, a_first);
    engine.add_permanent_arc(a_root, ATTR_SECOND, a_second);

    let b_first = engine.new_node(15);
    let b_second = engine.new_node(20);
    let b_root = engine.new_node(0);
    engine.add_permanent_arc(b_root, ATTR_FIRST, b_first);
    engine.add_permanent_arc(b_root, ATTR_SECOND, b_second);

    let _ = std::hint::black_box(engine.unify(a_root, a_root, b_root, &Restrictor::None));
    engine.arena_release(mark);
  }
  let elapsed = start.elapsed();
  println!(
    "unify: {iterations} two-attribute unifications in {:?} ({:.1} ns/call)",
    elapsed,
    elapsed.as_nanos() as f64 / iterations as f64
  );
}

fn main() {
  bench_glb();
  bench_unify();
}
