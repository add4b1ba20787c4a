use criterion::{criterion_group, criterion_main, Criterion};
use scenario_core::{default_draft, roster};

fn bench_simulate(c: &mut Criterion) {
    let inputs: Vec<_> = roster()
        .iter()
        .map(|p| default_draft().with_profile(p))
        .collect();
    c.bench_function("simulate_roster", |b| {
        b.iter(|| {
            for i in &inputs {
                let _ = unit_econ::simulate(i);
            }
        })
    });
}

criterion_group!(benches, bench_simulate);
criterion_main!(benches);
