//! Benchmarks for reduction-graph and DFA construction.

use std::hint::black_box;
use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};

use lrmatch::redgraph::Redgraph;
use lrmatch::testing;
use lrmatch::{build_dfa, parse_source, translate, Ctx};

fn bench_redgraph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("redgraph_build");
    for depth in [8usize, 32, 128] {
        let grammar = testing::chain_grammar(depth);
        group.bench_function(format!("chain_{depth}"), |b| {
            b.iter(|| Redgraph::build(black_box(&grammar)));
        });
    }
    group.finish();
}

fn bench_dfa_build(c: &mut Criterion) {
    let ctx = Ctx::new(testing::paren_grammar());
    let spec = parse_source(
        "rule on_error = \
         | _ * ; LPAREN ; ! { a() } \
         | X ; _ * { b() } \
         | [S: LPAREN S . RPAREN] { c() }",
        &PathBuf::from("bench.lrm"),
    )
    .unwrap();
    let compiled = translate(&ctx.grammar, &spec).unwrap();

    c.bench_function("dfa_build_paren", |b| {
        b.iter(|| build_dfa(black_box(&ctx), black_box(&compiled.kres)));
    });
}

criterion_group!(benches, bench_redgraph_build, bench_dfa_build);
criterion_main!(benches);
