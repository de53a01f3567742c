//! Performance benchmarks for the coordination pipeline
//!
//! Targets:
//! - Single-engine request: <1ms per sentence
//! - Multi-cooperative request: <5ms per sentence
//! - Cache hit: <100µs per lookup
//! - Merge of four outcomes: <50µs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use harmonia_core::config::MergeConfig;
use harmonia_core::{
    Analysis, AnalyzerOutcome, Coordinator, HarmoniaConfig, Precedence, ResultMerger, Slot,
    SlotAssignment,
};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Coordinator with the built-in analyzers and caching disabled, so every
/// iteration pays for the full pipeline
fn cold_coordinator(rt: &Runtime) -> Coordinator {
    let mut config = HarmoniaConfig::default();
    config.cache.ttl_secs = 0;
    let coordinator = Coordinator::new(config);
    rt.block_on(async {
        harmonia_core::analyzers::register_builtin(coordinator.registry())
            .await
            .unwrap();
    });
    coordinator
}

fn outcome(
    id: &str,
    confidence: f64,
    priority: u32,
    precedence: Precedence,
    fills: &[(Slot, &str)],
) -> AnalyzerOutcome {
    let mut slots = SlotAssignment::new();
    for (slot, value) in fills {
        slots.set(*slot, *value);
    }
    AnalyzerOutcome::succeeded(
        id,
        Analysis::new(slots, confidence),
        Duration::from_millis(2),
        priority,
        precedence,
    )
}

/// Benchmark 1: full pipeline per strategy
fn bench_process(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let coordinator = cold_coordinator(&rt);

    let mut group = c.benchmark_group("process");
    group.throughput(Throughput::Elements(1));

    let sentences = [
        ("single_engine", "The dog barked loudly today"),
        ("foundation_plus_specialist", "The ball was thrown by the boy."),
        (
            "multi_cooperative",
            "The old book that was written by the author could not be found in the library.",
        ),
    ];
    for (label, sentence) in sentences {
        group.bench_with_input(BenchmarkId::new("sentence", label), &sentence, |b, &s| {
            b.iter(|| {
                let result = rt.block_on(coordinator.process_sentence(black_box(s)));
                black_box(result);
            });
        });
    }

    group.finish();
}

/// Benchmark 2: memoized lookup path
fn bench_cache_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let coordinator = Coordinator::new(HarmoniaConfig::default());
    rt.block_on(async {
        harmonia_core::analyzers::register_builtin(coordinator.registry())
            .await
            .unwrap();
        coordinator
            .process_sentence("The ball was thrown by the boy.")
            .await
    });

    let mut group = c.benchmark_group("cache");
    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| {
        b.iter(|| {
            let result = rt.block_on(
                coordinator.process_sentence(black_box("The ball was thrown by the boy.")),
            );
            black_box(result);
        });
    });
    group.finish();
}

/// Benchmark 3: merging a multi-cooperative outcome set
fn bench_merge(c: &mut Criterion) {
    let merger = ResultMerger::new(MergeConfig::default());
    let outcomes = vec![
        outcome(
            "passive",
            0.85,
            10,
            Precedence::Protected,
            &[
                (Slot::Subject, "The old book that"),
                (Slot::Auxiliary, "was"),
                (Slot::Verb, "written"),
                (Slot::Modifier1, "by the author"),
            ],
        ),
        outcome(
            "relative",
            0.75,
            20,
            Precedence::Standard,
            &[(Slot::Object1, "old book that was written by the author")],
        ),
        outcome(
            "modal",
            0.7,
            30,
            Precedence::Standard,
            &[
                (Slot::Auxiliary, "could"),
                (Slot::Modifier3, "not"),
                (Slot::Verb, "be found"),
            ],
        ),
        outcome(
            "foundation",
            0.6,
            100,
            Precedence::Standard,
            &[
                (Slot::Subject, "The old book that"),
                (Slot::Verb, "written"),
                (Slot::Object1, "by the author"),
            ],
        ),
    ];

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(outcomes.len() as u64));
    group.bench_function("four_contributors", |b| {
        b.iter(|| {
            let result = merger.merge(black_box(&outcomes));
            black_box(result);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_process, bench_cache_hit, bench_merge);
criterion_main!(benches);
