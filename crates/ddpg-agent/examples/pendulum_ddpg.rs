//! Train DDPG on the pendulum swing-up and evaluate the learned policy.
//!
//! `cargo run --release --example pendulum_ddpg`

use ddpg_agent::{test, train, DdpgAgent, DdpgConfig, TrainConfig};
use ddpg_core::Environment;
use ddpg_env::{make_env, NormalizedActions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut env = NormalizedActions::new(make_env("Pendulum-v0", Some(1))?)?;
    let n_states = env.observation_space().dim();
    let n_actions = env.action_space().dim();

    let mut agent = DdpgAgent::new(
        n_states,
        n_actions,
        DdpgConfig {
            seed: Some(1),
            ..DdpgConfig::default()
        },
    )?;

    let config = TrainConfig {
        train_eps: 50,
        test_eps: 5,
        seed: Some(1),
        ..TrainConfig::default()
    };
    let history = train(&mut env, &mut agent, &config)?;
    println!("final training moving average: {:.1}", history.last_ma().unwrap_or_default());

    env.seed(10);
    let evaluation = test(&mut env, &agent, &config)?;
    println!("evaluation rewards: {:?}", evaluation.rewards);
    Ok(())
}
