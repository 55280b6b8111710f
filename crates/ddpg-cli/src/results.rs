// Result persistence: run directories, params.json, reward histories, plots

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use ddpg_agent::RewardHistory;

use crate::config::RunConfig;

/// Create every directory in `dirs`
pub async fn make_dirs(dirs: &[&Path]) -> Result<()> {
    for dir in dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Write the effective run configuration to `<result_path>/params.json`
pub async fn save_params(cfg: &RunConfig) -> Result<PathBuf> {
    let path = cfg.result_path.join("params.json");
    let json = serde_json::to_string_pretty(cfg)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Parameters saved to {}", path.display());
    Ok(path)
}

/// Write `<dir>/<tag>_rewards.json`
pub async fn save_results(history: &RewardHistory, tag: &str, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{tag}_rewards.json"));
    let json = serde_json::to_string_pretty(history)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Results saved to {}", path.display());
    Ok(path)
}

/// Read a history written by [`save_results`]
pub async fn load_results(path: &Path) -> Result<RewardHistory> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

/// Plot rewards and their moving average to `<result_path>/<tag>_rewards_curve.png`
#[cfg(feature = "visualization")]
pub fn plot_rewards(history: &RewardHistory, tag: &str, cfg: &RunConfig) -> Result<Option<PathBuf>> {
    let path = cfg.result_path.join(format!("{tag}_rewards_curve.png"));
    draw_rewards(history, tag, cfg, &path)?;
    info!("Reward curve saved to {}", path.display());
    Ok(Some(path))
}

#[cfg(feature = "visualization")]
fn draw_rewards(history: &RewardHistory, tag: &str, cfg: &RunConfig, path: &Path) -> Result<()> {
    use anyhow::anyhow;
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (800, 480)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("{e:?}"))?;

    let (low, high) = history
        .rewards
        .iter()
        .chain(&history.ma_rewards)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (low, high) = if low < high { (low, high) } else { (low - 1.0, low + 1.0) };

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{tag} curve of {} for {}", cfg.algo_name, cfg.env_name),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..history.len().max(1), low..high)
        .map_err(|e| anyhow!("{e:?}"))?;

    chart
        .configure_mesh()
        .x_desc("episodes")
        .draw()
        .map_err(|e| anyhow!("{e:?}"))?;

    chart
        .draw_series(LineSeries::new(history.rewards.iter().copied().enumerate(), &BLUE))
        .map_err(|e| anyhow!("{e:?}"))?
        .label("rewards")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(LineSeries::new(history.ma_rewards.iter().copied().enumerate(), &RED))
        .map_err(|e| anyhow!("{e:?}"))?
        .label("ma rewards")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| anyhow!("{e:?}"))?;
    root.present().map_err(|e| anyhow!("{e:?}"))?;
    Ok(())
}

/// Plotting is compiled out without the `visualization` feature
#[cfg(not(feature = "visualization"))]
#[allow(clippy::unnecessary_wraps)]
pub fn plot_rewards(_history: &RewardHistory, tag: &str, _cfg: &RunConfig) -> Result<Option<PathBuf>> {
    info!("Skipping {tag} reward plot, built without the visualization feature");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn results_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/results");
        make_dirs(&[&nested]).await.unwrap();

        let mut history = RewardHistory::default();
        history.push(-3.0);
        history.push(-1.0);
        let path = save_results(&history, "train", &nested).await.unwrap();
        assert!(path.ends_with("train_rewards.json"));
        assert_eq!(load_results(&path).await.unwrap(), history);
    }

    #[tokio::test]
    async fn params_are_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig {
            result_path: dir.path().to_path_buf(),
            ..RunConfig::default()
        };
        let path = save_params(&cfg).await.unwrap();
        let written = RunConfig::from_file(&path).unwrap();
        assert_eq!(written, cfg);
    }

    #[test]
    fn plot_follows_build_features() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig {
            result_path: dir.path().to_path_buf(),
            ..RunConfig::default()
        };
        assert!(cfg.save_fig);

        let mut history = RewardHistory::default();
        for r in [-5.0, -4.0, -2.0] {
            history.push(r);
        }
        let plotted = plot_rewards(&history, "train", &cfg).unwrap();
        if cfg!(feature = "visualization") {
            let path = plotted.unwrap();
            assert!(path.exists());
        } else {
            assert!(plotted.is_none());
        }
    }
}
