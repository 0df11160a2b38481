//! Benchmarks for call-site validation

use callsite_validator::{CallSite, CallSiteValidator, ServiceGraph, ServiceType};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

struct Root;
struct Link;
struct Db;
struct Config;

fn ty<T: 'static>() -> ServiceType {
    ServiceType::of::<T>()
}

/// `depth` transient constructors ending in a scoped Db.
fn chain(depth: usize) -> CallSite {
    let mut site = CallSite::scoped(ty::<Db>(), CallSite::new_of::<Db>());
    for _ in 0..depth {
        site = CallSite::transient(CallSite::constructor(ty::<Link>(), vec![site]));
    }
    site
}

/// One constructor with `width` constant parameters and a scoped Db last.
fn wide(width: usize) -> CallSite {
    let mut parameters: Vec<_> = (0..width)
        .map(|_| CallSite::Constant { service_type: ty::<Config>() })
        .collect();
    parameters.push(CallSite::scoped(ty::<Db>(), CallSite::new_of::<Db>()));
    CallSite::constructor(ty::<Root>(), parameters)
}

fn bench_validate_call_site(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_call_site");
    let validator = CallSiteValidator::new();

    for depth in [4, 32, 256] {
        let site = chain(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_function(format!("chain_{depth}"), |b| {
            b.iter(|| black_box(validator.validate_call_site(ty::<Root>(), black_box(&site))))
        });
    }

    for width in [8, 64] {
        let site = wide(width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_function(format!("wide_{width}"), |b| {
            b.iter(|| black_box(validator.validate_call_site(ty::<Root>(), black_box(&site))))
        });
    }

    let violation = CallSite::singleton(ty::<Root>(), chain(32));
    group.bench_function("violation_chain_32", |b| {
        b.iter(|| black_box(validator.validate_call_site(ty::<Root>(), black_box(&violation))))
    });

    group.finish();
}

fn bench_validate_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_resolution");
    let validator = CallSiteValidator::new();
    validator.validate_call_site(ty::<Root>(), &chain(4)).ok();

    group.bench_function("root_captured", |b| {
        b.iter(|| black_box(validator.validate_resolution(black_box(ty::<Root>()), true)))
    });
    group.bench_function("root_clean", |b| {
        b.iter(|| black_box(validator.validate_resolution(black_box(ty::<Config>()), true)))
    });
    group.bench_function("child_scope", |b| {
        b.iter(|| black_box(validator.validate_resolution(black_box(ty::<Root>()), false)))
    });

    group.finish();
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");

    group.bench_function("build_4_services", |b| {
        b.iter(|| {
            let graph = ServiceGraph::new();
            graph.register(ty::<Root>(), chain(8)).ok();
            graph.register(ty::<Link>(), chain(2)).ok();
            graph
                .register(ty::<Db>(), CallSite::scoped(ty::<Db>(), CallSite::new_of::<Db>()))
                .ok();
            graph
                .register(ty::<Config>(), CallSite::Constant { service_type: ty::<Config>() })
                .ok();
            black_box(graph.build())
        })
    });

    let graph = ServiceGraph::new();
    graph.register(ty::<Root>(), chain(8)).ok();
    graph.build().ok();
    let scope = graph.create_scope();

    group.bench_function("scoped_resolve", |b| {
        b.iter(|| black_box(scope.resolve(black_box(ty::<Root>()))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_validate_call_site,
    bench_validate_resolution,
    bench_graph
);
criterion_main!(benches);
