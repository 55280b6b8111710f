// DDPG trainer CLI
// Trains a DDPG agent on a registered environment, then evaluates it

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ddpg_agent::{DdpgAgent, RewardHistory};
use ddpg_core::Environment;
use ddpg_env::{BoxedEnv, EnvRegistry, NormalizedActions};

mod config;
mod results;

use config::RunConfig;

#[derive(Parser)]
#[command(name = "ddpg")]
#[command(about = "Train and evaluate DDPG agents on continuous-control tasks", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, save the model, then evaluate it
    Run(RunArgs),

    /// Train and save the model only
    Train(RunArgs),

    /// Evaluate a saved model
    Test {
        /// Directory holding actor.json and critic.json
        #[arg(long)]
        model_path: PathBuf,

        #[command(flatten)]
        args: RunArgs,
    },

    /// List registered environments
    Envs,
}

/// Flags override values from `--config`, which override the defaults
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment name
    #[arg(short, long)]
    env: Option<String>,

    /// Number of training episodes
    #[arg(long)]
    train_eps: Option<usize>,

    /// Number of evaluation episodes
    #[arg(long)]
    test_eps: Option<usize>,

    /// Seed for training
    #[arg(long)]
    train_seed: Option<u64>,

    /// Seed for evaluation
    #[arg(long)]
    test_seed: Option<u64>,

    /// Discount factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Critic learning rate
    #[arg(long)]
    critic_lr: Option<f64>,

    /// Actor learning rate
    #[arg(long)]
    actor_lr: Option<f64>,

    /// Replay buffer capacity
    #[arg(long)]
    memory_capacity: Option<usize>,

    /// Minibatch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Target network tracking rate
    #[arg(long)]
    soft_tau: Option<f64>,

    /// Hidden layer width
    #[arg(long)]
    hidden_dim: Option<usize>,

    /// Root directory for run outputs
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Do not plot reward curves
    #[arg(long)]
    no_fig: bool,
}

impl RunArgs {
    fn resolve(&self) -> Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        set(&mut cfg.env_name, &self.env);
        set(&mut cfg.train_eps, &self.train_eps);
        set(&mut cfg.test_eps, &self.test_eps);
        set(&mut cfg.train_seed, &self.train_seed);
        set(&mut cfg.test_seed, &self.test_seed);
        set(&mut cfg.agent.gamma, &self.gamma);
        set(&mut cfg.agent.critic_lr, &self.critic_lr);
        set(&mut cfg.agent.actor_lr, &self.actor_lr);
        set(&mut cfg.agent.memory_capacity, &self.memory_capacity);
        set(&mut cfg.agent.batch_size, &self.batch_size);
        set(&mut cfg.agent.soft_tau, &self.soft_tau);
        set(&mut cfg.agent.hidden_dim, &self.hidden_dim);
        if self.no_fig {
            cfg.save_fig = false;
        }
        cfg.agent.validate()?;

        Ok(cfg.with_run_dirs(&self.output_dir, chrono::Local::now()))
    }
}

fn set<T: Clone>(target: &mut T, flag: &Option<T>) {
    if let Some(value) = flag {
        *target = value.clone();
    }
}

/// Environment wrapped for `[-1, 1]` actions and an agent sized for it
fn env_agent_config(cfg: &RunConfig, seed: u64) -> Result<(NormalizedActions<BoxedEnv>, DdpgAgent)> {
    let registry = EnvRegistry::with_builtins();
    let env = registry.make(&cfg.env_name, Some(seed))?;
    let env = NormalizedActions::new(env)?;
    let n_states = env.observation_space().dim();
    let n_actions = env.action_space().dim();
    let agent = DdpgAgent::new(n_states, n_actions, cfg.agent_config(seed))?;
    Ok((env, agent))
}

fn train_phase(cfg: &RunConfig) -> Result<RewardHistory> {
    info!("Env: {}, Algorithm: {}", cfg.env_name, cfg.algo_name);
    let (mut env, mut agent) = env_agent_config(cfg, cfg.train_seed)?;
    let history = ddpg_agent::train(&mut env, &mut agent, &cfg.train_config()).context("Training failed")?;
    agent
        .save(&cfg.model_path)
        .with_context(|| format!("Failed to save model to {}", cfg.model_path.display()))?;
    info!("Model saved to {}", cfg.model_path.display());
    Ok(history)
}

fn test_phase(cfg: &RunConfig, model_path: &Path) -> Result<RewardHistory> {
    let (mut env, mut agent) = env_agent_config(cfg, cfg.test_seed)?;
    agent
        .load(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let history = ddpg_agent::test(&mut env, &agent, &cfg.train_config()).context("Evaluation failed")?;
    Ok(history)
}

async fn persist(history: &RewardHistory, tag: &str, cfg: &RunConfig) -> Result<()> {
    results::save_results(history, tag, &cfg.result_path).await?;
    if cfg.save_fig {
        results::plot_rewards(history, tag, cfg)?;
    }
    Ok(())
}

/// Phases of one invocation
enum Phases {
    TrainAndTest,
    Train,
    Test(PathBuf),
}

async fn run(cfg: RunConfig, phases: Phases) -> Result<()> {
    results::make_dirs(&[&cfg.result_path, &cfg.model_path]).await?;
    results::save_params(&cfg).await?;

    if matches!(phases, Phases::TrainAndTest | Phases::Train) {
        let phase_cfg = cfg.clone();
        let history = tokio::task::spawn_blocking(move || train_phase(&phase_cfg)).await??;
        persist(&history, "train", &cfg).await?;
    }

    let model_path = match phases {
        Phases::TrainAndTest => Some(cfg.model_path.clone()),
        Phases::Train => None,
        Phases::Test(path) => Some(path),
    };
    if let Some(model_path) = model_path {
        let phase_cfg = cfg.clone();
        let history = tokio::task::spawn_blocking(move || test_phase(&phase_cfg, &model_path)).await??;
        persist(&history, "test", &cfg).await?;
    }

    info!("Outputs written to {}", cfg.result_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            run(args.resolve()?, Phases::TrainAndTest).await?;
        }

        Commands::Train(args) => {
            run(args.resolve()?, Phases::Train).await?;
        }

        Commands::Test { model_path, args } => {
            run(args.resolve()?, Phases::Test(model_path)).await?;
        }

        Commands::Envs => {
            for name in EnvRegistry::with_builtins().list() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
