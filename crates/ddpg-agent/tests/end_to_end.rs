//! Learning sanity check on the 1-D tracking task

use ddpg_agent::{train, DdpgAgent, DdpgConfig, NoiseConfig, TrainConfig};
use ddpg_core::Environment;
use ddpg_env::TrackingEnv;

fn config(seed: u64) -> DdpgConfig {
    DdpgConfig {
        gamma: 0.5,
        critic_lr: 1e-2,
        actor_lr: 5e-3,
        memory_capacity: 1000,
        batch_size: 16,
        soft_tau: 0.01,
        hidden_dim: 16,
        seed: Some(seed),
        noise: NoiseConfig {
            sigma_max: 0.05,
            sigma_min: 0.05,
            ..NoiseConfig::default()
        },
        ..DdpgConfig::default()
    }
}

#[test]
fn tracking_reward_improves() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut env = TrackingEnv::new();
    env.seed(1);
    let n_states = env.observation_space().dim();
    let n_actions = env.action_space().dim();
    let mut agent = DdpgAgent::new(n_states, n_actions, config(3)).unwrap();

    let history = train(
        &mut env,
        &mut agent,
        &TrainConfig {
            train_eps: 50,
            seed: Some(5),
            ..TrainConfig::default()
        },
    )
    .unwrap();

    assert_eq!(history.len(), 50);
    let early = history.ma_rewards[4];
    let late = history.ma_rewards[44];
    assert!(early < 0.0);
    // at least 20% less negative
    assert!(late >= 0.8 * early, "early {early:.3}, late {late:.3}");
}

#[test]
fn trained_policy_follows_the_state() {
    let mut env = TrackingEnv::new();
    env.seed(2);
    let mut agent = DdpgAgent::new(1, 1, config(4)).unwrap();
    train(
        &mut env,
        &mut agent,
        &TrainConfig {
            train_eps: 50,
            seed: Some(6),
            ..TrainConfig::default()
        },
    )
    .unwrap();

    let low = agent.choose_action(&[-0.6]).unwrap()[0];
    let high = agent.choose_action(&[0.6]).unwrap()[0];
    assert!(high > low);
}
