//! Microbenchmarks for the symbolic hot path
//!
//! - Arena appends and truncation
//! - Rewriting set enumerations and filters under both encodings
//! - A full begin/rewrite/commit step followed by a restore
//!
//! Run with: cargo bench -p tla-bmc --bench hot_path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tla_bmc::{
    Arena, BmcConfig, CellType, Encoding, RewriteCache, Rewriter, RuleSet, SymbState,
    TransitionExecutor,
};
use tla_core::{ExprBuilder, ExprRef, TlaType};
use tla_smt::{MemorySolver, SolverContext, Sort, Term};

// ============================================================================
// Test Data Generators
// ============================================================================

/// `{0, 1, ..., n-1}`
fn int_set(b: &ExprBuilder, n: usize) -> ExprRef {
    b.set_enum(TlaType::Int, (0..n as i64).map(|i| b.int(i)).collect())
}

/// `{x \in {0, ..., n-1} : x > n / 2}`
fn upper_half(b: &ExprBuilder, n: usize) -> ExprRef {
    let x = b.name("x", TlaType::Int);
    b.filter("x", int_set(b, n), b.gt(x, b.int(n as i64 / 2)))
}

fn fresh_solver() -> MemorySolver {
    let mut solver = MemorySolver::new();
    let _ = solver.declare_cell(Arena::FALSE, &Sort::Bool);
    let _ = solver.declare_cell(Arena::TRUE, &Sort::Bool);
    let _ = solver.assert_ground_expr(&Term::not(Term::cell(Arena::FALSE)));
    let _ = solver.assert_ground_expr(&Term::cell(Arena::TRUE));
    solver
}

/// Rewrite `expr` from scratch and return the resulting cell count
fn rewrite_once(rules: &RuleSet, encoding: Encoding, expr: &ExprRef) -> usize {
    let mut solver = fresh_solver();
    let mut cache = RewriteCache::new();
    let mut rw = Rewriter::new(rules, &mut solver, &mut cache, encoding);
    let state = SymbState::new(expr.clone(), Arena::new(), Default::default());
    match rw.rewrite_sub(state, expr) {
        Ok((state, _)) => state.arena.len(),
        Err(e) => panic!("rewriting failed: {}", e),
    }
}

// ============================================================================
// Arena
// ============================================================================

fn bench_arena(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("append", size), &size, |b, &size| {
            b.iter(|| {
                let mut arena = Arena::new();
                let set = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
                for _ in 0..size {
                    let e = arena.append_cell(CellType::Int);
                    let _ = arena.append_has(set, &[e]);
                }
                black_box(arena.len())
            })
        });
    }

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("truncate", size), &size, |b, &size| {
            let mut base = Arena::new();
            let set = base.append_cell(CellType::FinSet(Box::new(CellType::Int)));
            let mark = base.mark();
            for _ in 0..size {
                let e = base.append_cell(CellType::Int);
                let _ = base.append_has(set, &[e]);
            }
            b.iter(|| {
                let mut arena = base.clone();
                arena.truncate(black_box(mark));
                black_box(arena.len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Rewriting
// ============================================================================

fn bench_rewriting(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let rules = RuleSet::standard();

    for encoding in [Encoding::Arrays, Encoding::Oracles] {
        for size in [10, 50, 200] {
            let b = ExprBuilder::new();
            let set = int_set(&b, size);
            let filter = upper_half(&b, size);
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("set_enum/{:?}", encoding), size),
                &set,
                |bench, set| bench.iter(|| black_box(rewrite_once(&rules, encoding, set))),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("filter/{:?}", encoding), size),
                &filter,
                |bench, filter| bench.iter(|| black_box(rewrite_once(&rules, encoding, filter))),
            );
        }
    }

    group.finish();
}

// ============================================================================
// Executor
// ============================================================================

fn bench_step_and_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("executor");
    let b = ExprBuilder::new();
    let x = || b.name("x", TlaType::Int);
    let init = b.assign("x", b.int(0));
    let next = b.and(vec![
        b.lt(x(), b.int(1_000_000)),
        b.assign("x", b.add(x(), b.int(1))),
    ]);

    group.bench_function("step_then_restore", |bench| {
        let config = BmcConfig::builder().max_steps(4).build();
        let mut exec = match TransitionExecutor::new(MemorySolver::new(), config, ["x"]) {
            Ok(exec) => exec,
            Err(e) => panic!("executor setup failed: {}", e),
        };
        let _ = exec.begin_step();
        let _ = exec.rewrite_step(&init);
        let _ = exec.commit_step();
        let token = match exec.snapshot() {
            Ok(token) => token,
            Err(e) => panic!("snapshot failed: {}", e),
        };
        bench.iter(|| {
            let _ = exec.begin_step();
            let _ = black_box(exec.rewrite_step(&next));
            let _ = black_box(exec.commit_step());
            let _ = exec.restore(&token);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_arena, bench_rewriting, bench_step_and_restore);
criterion_main!(benches);
