use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ddpg_agent::{DdpgAgent, DdpgConfig, ReplayBuffer};
use ddpg_core::Transition;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_transition(rng: &mut StdRng, n_states: usize, n_actions: usize) -> Transition {
    let mut vector = |n: usize| (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect::<Vec<f64>>();
    let state = vector(n_states);
    let action = vector(n_actions);
    let next_state = vector(n_states);
    Transition::new(state, action, -1.0, next_state, false)
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddpg_update");
    for hidden_dim in [64, 256] {
        let mut rng = StdRng::seed_from_u64(0);
        let config = DdpgConfig {
            hidden_dim,
            seed: Some(0),
            ..DdpgConfig::default()
        };
        let mut agent = DdpgAgent::new(3, 1, config).unwrap();
        for _ in 0..1000 {
            agent.remember(random_transition(&mut rng, 3, 1)).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("pendulum_sized", hidden_dim), &hidden_dim, |b, _| {
            b.iter(|| black_box(agent.update()));
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(8000);
    for _ in 0..8000 {
        buffer.push(random_transition(&mut rng, 3, 1));
    }

    c.bench_function("replay_sample_128", |b| {
        b.iter(|| black_box(buffer.sample(128, &mut rng)));
    });
}

criterion_group!(benches, bench_update, bench_replay);
criterion_main!(benches);
