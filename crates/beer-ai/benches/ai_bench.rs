use beer_ai::{decide_order, ProfileParams};
use beer_core::{AiProfile, Controller, GameConfig, Role, RoleState};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn build_state() -> RoleState {
    let mut s = RoleState::opening(
        Role::SecondarySupplier,
        Controller::Ai(AiProfile::Panic),
        &GameConfig::default(),
    );
    s.backorder = 6;
    for q in [4, 4, 6, 9, 12, 10, 8] {
        s.record_order(q);
    }
    s
}

fn bench_policy(c: &mut Criterion) {
    let state = build_state();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for profile in AiProfile::ALL {
        let params = ProfileParams::for_profile(profile);
        c.bench_function(&format!("decide_order {profile}"), |b| {
            b.iter(|| {
                black_box(decide_order(
                    black_box(&state),
                    black_box(8.0),
                    black_box(7.5),
                    &params,
                    &mut rng,
                ))
            })
        });
    }
}

criterion_group!(benches, bench_policy);
criterion_main!(benches);
