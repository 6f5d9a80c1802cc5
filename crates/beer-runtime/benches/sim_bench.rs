use beer_core::{AiProfile, GameConfig, Role};
use beer_runtime::{Setup, Simulation};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_games(c: &mut Criterion) {
    let setup = Setup::unattended()
        .all_profiles(AiProfile::Safe)
        .profile(Role::Retailer, AiProfile::Panic)
        .config(GameConfig {
            total_rounds: 30,
            transport_delay: 2,
            receiving_time: 1,
            production_time: 2,
            ..GameConfig::default()
        });
    c.bench_function("unattended game 30 rounds", |b| {
        b.iter(|| {
            let mut sim = Simulation::initialize(setup.clone()).unwrap();
            sim.run_to_completion().unwrap();
            black_box(sim.final_scores())
        })
    });
}

fn bench_round(c: &mut Criterion) {
    let setup = Setup::unattended().config(GameConfig {
        total_rounds: 100_000,
        ..GameConfig::default()
    });
    let mut sim = Simulation::initialize(setup.clone()).unwrap();
    c.bench_function("unattended round", |b| {
        b.iter(|| {
            if sim.is_game_over() {
                sim = Simulation::initialize(setup.clone()).unwrap();
            }
            black_box(sim.play_unattended_round().unwrap())
        })
    });
}

criterion_group!(benches, bench_games, bench_round);
criterion_main!(benches);
