// Run configuration for the ddpg binary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use ddpg_agent::{DdpgConfig, TrainConfig};

/// Everything one run needs, written to `params.json` next to the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Algorithm label used in reports
    pub algo_name: String,
    /// Registered environment name
    pub env_name: String,
    /// Training episodes
    pub train_eps: usize,
    /// Evaluation episodes
    pub test_eps: usize,
    /// Seed of the training environment, agent and noise
    pub train_seed: u64,
    /// Seed of the evaluation environment
    pub test_seed: u64,
    /// Training report interval in episodes
    pub log_interval: usize,
    /// Directory for rewards, plots and `params.json`
    pub result_path: PathBuf,
    /// Directory for checkpoints
    pub model_path: PathBuf,
    /// Plot reward curves. Builds without the `visualization` feature skip
    /// the plot and only log that it was requested
    pub save_fig: bool,
    /// Agent hyperparameters
    #[serde(flatten)]
    pub agent: DdpgConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            algo_name: "DDPG".into(),
            env_name: "Pendulum-v0".into(),
            train_eps: 300,
            test_eps: 30,
            train_seed: 1,
            test_seed: 10,
            log_interval: 10,
            result_path: PathBuf::from("outputs/results"),
            model_path: PathBuf::from("outputs/models"),
            save_fig: true,
            agent: DdpgConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read a JSON config; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Point both output directories at `<root>/<env_name>/<timestamp>/`
    pub fn with_run_dirs(mut self, root: &Path, now: DateTime<Local>) -> Self {
        let run_dir = root
            .join(&self.env_name)
            .join(now.format("%Y%m%d-%H%M%S").to_string());
        self.result_path = run_dir.join("results");
        self.model_path = run_dir.join("models");
        self
    }

    /// Agent hyperparameters seeded for `seed`
    pub fn agent_config(&self, seed: u64) -> DdpgConfig {
        DdpgConfig {
            seed: Some(seed),
            ..self.agent.clone()
        }
    }

    /// Loop settings; the noise seed follows the training seed
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            train_eps: self.train_eps,
            test_eps: self.test_eps,
            log_interval: self.log_interval,
            seed: Some(self.train_seed),
            ..TrainConfig::default()
        }
    }
}
