use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fscore::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// `x{k+1} = x{k} + 1` for `k < len`, each relation invertible.
fn chain(len: usize) -> FunctionSystem {
    FunctionSystem::new((0..len).map(|k| {
        let lo = format!("x{}", k);
        let hi = format!("x{}", k + 1);
        Relation::total([
            (hi.clone(), Formula::pointwise([lo.clone()], |v| v[0] + 1.0)),
            (lo, Formula::pointwise([hi], |v| v[0] - 1.0)),
        ])
    }))
}

/// `out = x * y` solved for every variable.
fn product(out: &'static str, x: &'static str, y: &'static str) -> Relation {
    Relation::total([
        (out, Formula::pointwise([x, y], |v| v[0] * v[1])),
        (x, Formula::pointwise([out, y], |v| v[0] / v[1])),
        (y, Formula::pointwise([out, x], |v| v[0] / v[1])),
    ])
}

fn random_column(rng: &mut impl Rng, rows: usize) -> Vec<f64> {
    (0..rows).map(|_| rng.random_range(1.0..10.0)).collect()
}

fn bench_chain(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let table = Table::from_columns([("x0", random_column(&mut rng, 256))]).unwrap();

    let mut group = c.benchmark_group("derive_chain");
    for len in [4, 16, 64] {
        let system = chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &system, |b, system| {
            b.iter(|| black_box(system.derive(&table).unwrap().len()));
        });
    }
    group.finish();
}

fn bench_cross_validation(c: &mut Criterion) {
    // Fully measured `a = b * c` and `d = b * c`: every variable has several
    // independent derivations competing in the input enumeration.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let b = random_column(&mut rng, 256);
    let cc = random_column(&mut rng, 256);
    let bc: Vec<f64> = b.iter().zip(&cc).map(|(b, c)| b * c).collect();
    let table = Table::from_columns([("a", bc.clone()), ("b", b), ("c", cc), ("d", bc)]).unwrap();
    let system = FunctionSystem::new([product("a", "b", "c"), product("d", "b", "c")]);

    for visibility in [PassVisibility::Immediate, PassVisibility::NextPass] {
        let system = system
            .clone()
            .with_config(DerivationConfig::default().with_visibility(visibility));
        c.bench_function(&format!("derive_cross_validation_{}", visibility), |b| {
            b.iter(|| black_box(system.derive(&table).unwrap().len()));
        });
    }
}

criterion_group!(benches, bench_chain, bench_cross_validation);
criterion_main!(benches);
