//! Purchase pipeline benchmarks for outbreak_core.
//!
//! Run with: `cargo bench -p outbreak_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use outbreak_core::catalog::Side;
use outbreak_core::event::GameEvent;
use outbreak_core::mode::GameMode;
use outbreak_core::purchase;
use outbreak_core::session::PersistId;
use outbreak_test_utils::fixtures::{
    join_defender, sample_catalog, sample_context, sample_settings,
};

/// Benchmarks the pure validation path and a full buy-tick-drain cycle.
pub fn purchase_benchmark(c: &mut Criterion) {
    c.bench_function("validate_purchase", |b| {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "bench");
        let ak = ctx.catalog.weapon("rifle_ak").cloned().unwrap();
        let session = ctx.sessions.get(p).unwrap().clone();
        b.iter(|| {
            black_box(purchase::validate(
                &ctx.settings,
                &ctx.round,
                p,
                &session,
                &ak,
                true,
            ))
        });
    });

    c.bench_function("alias_buy_full_cycle", |b| {
        b.iter_batched(
            || {
                let mut mode = GameMode::new(sample_settings(), sample_catalog(), 7);
                let p = mode.connect("bench", Some(PersistId(1)), false, false);
                mode.handle_event(GameEvent::SideChanged {
                    participant: p,
                    side: Some(Side::Defender),
                });
                mode.handle_event(GameEvent::Spawned { participant: p });
                mode.tick();
                mode.handle_event(GameEvent::BalanceSet {
                    participant: p,
                    balance: 16_000,
                });
                mode.drain_effects();
                (mode, p)
            },
            |(mut mode, p)| {
                mode.handle_event(GameEvent::Command {
                    participant: p,
                    name: "ak".to_string(),
                    args: Vec::new(),
                });
                mode.tick();
                black_box(mode.drain_effects())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, purchase_benchmark);
criterion_main!(benches);
