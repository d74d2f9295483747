//! Configuration parsing for simplification runs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use voxel_topology::{
	AcceptanceRule, Connectivity, CostMode, SimplifyConfig, SolverMode, Thresholds,
};

use crate::volume_io::SampleFormat;

/// Root configuration of a run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// Raw input volume (single runs only).
	pub input: Option<PathBuf>,
	/// Label output path (single runs only).
	pub output: Option<PathBuf>,
	/// Volume dimensions [x, y, z] (single runs only).
	pub dims: Option<[u32; 3]>,
	/// Sample type of the input.
	#[serde(default)]
	pub sample: SampleFormat,
	/// Iso-value S.
	pub shape: f32,
	/// Kernel threshold K (K >= S).
	pub kernel: f32,
	/// Neighborhood threshold N (N <= S).
	pub neighborhood: f32,
	/// Foreground connectivity: 6 or 26.
	#[serde(default = "default_connectivity")]
	pub connectivity: u8,
	#[serde(default)]
	pub cost: CostSetting,
	#[serde(default)]
	pub acceptance: AcceptanceSetting,
	#[serde(default)]
	pub solver: SolverSetting,
	/// Precomputed simple-point dictionary (optional).
	pub dictionary: Option<PathBuf>,
	/// Worker threads for the local stage (default: rayon's choice).
	pub threads: Option<usize>,
	#[serde(default = "default_local_budget_ms")]
	pub local_budget_ms: u64,
	#[serde(default = "default_global_budget_ms")]
	pub global_budget_ms: u64,
	#[serde(default = "default_combination_limit")]
	pub combination_limit: u64,
	#[serde(default)]
	pub greedy_baseline: bool,
	/// Block-average factor applied before simplification.
	#[serde(default = "default_downsample")]
	pub downsample: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSetting {
	#[default]
	Intensity,
	VoxelCount,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceSetting {
	#[default]
	Strict,
	Roots,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverSetting {
	#[default]
	Steiner,
	Greedy,
}

fn default_connectivity() -> u8 {
	26
}

fn default_local_budget_ms() -> u64 {
	1_000
}

fn default_global_budget_ms() -> u64 {
	10_000
}

fn default_combination_limit() -> u64 {
	16
}

fn default_downsample() -> u32 {
	1
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	/// Parse and validate TOML text.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).with_context(|| "Failed to parse config TOML")?;

		if !(config.shape.is_finite() && config.kernel.is_finite() && config.neighborhood.is_finite()) {
			anyhow::bail!("Thresholds must be finite");
		}
		if config.kernel < config.shape || config.neighborhood > config.shape {
			anyhow::bail!(
				"Thresholds must satisfy neighborhood <= shape <= kernel, got {} / {} / {}",
				config.neighborhood,
				config.shape,
				config.kernel
			);
		}
		if config.connectivity != 6 && config.connectivity != 26 {
			anyhow::bail!("connectivity must be 6 or 26, got {}", config.connectivity);
		}
		if config.downsample == 0 {
			anyhow::bail!("downsample must be at least 1");
		}
		if config.threads == Some(0) {
			anyhow::bail!("threads must be at least 1");
		}
		if config.combination_limit == 0 {
			anyhow::bail!("combination_limit must be at least 1");
		}
		if let Some(dims) = config.dims {
			if dims.contains(&0) {
				anyhow::bail!("dims must be positive, got {:?}", dims);
			}
		}

		Ok(config)
	}

	/// Engine configuration for this run.
	pub fn simplify_config(&self) -> SimplifyConfig {
		let foreground = if self.connectivity == 6 {
			Connectivity::Six
		} else {
			Connectivity::TwentySix
		};
		let cost = match self.cost {
			CostSetting::Intensity => CostMode::Intensity,
			CostSetting::VoxelCount => CostMode::VoxelCount,
		};
		let acceptance = match self.acceptance {
			AcceptanceSetting::Strict => AcceptanceRule::Strict,
			AcceptanceSetting::Roots => AcceptanceRule::Roots,
		};
		let solver = match self.solver {
			SolverSetting::Steiner => SolverMode::Steiner,
			SolverSetting::Greedy => SolverMode::Greedy,
		};
		let mut config = SimplifyConfig::new(Thresholds::new(self.shape, self.kernel, self.neighborhood))
			.with_foreground(foreground)
			.with_cost_mode(cost)
			.with_acceptance(acceptance)
			.with_solver(solver)
			.with_combination_limit(self.combination_limit)
			.with_budgets(
				Duration::from_millis(self.local_budget_ms),
				Duration::from_millis(self.global_budget_ms),
			)
			.with_greedy_baseline(self.greedy_baseline);
		if let Some(threads) = self.threads {
			config = config.with_worker_threads(threads);
		}
		config
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
shape = 0.0
kernel = 0.3
neighborhood = -0.3
"#;

	#[test]
	fn test_defaults() {
		let config = Config::parse(MINIMAL).unwrap();
		assert_eq!(config.connectivity, 26);
		assert_eq!(config.sample, SampleFormat::U8);
		assert_eq!(config.downsample, 1);
		assert_eq!(config.solver, SolverSetting::Steiner);

		let engine = config.simplify_config();
		assert_eq!(engine.foreground, Connectivity::TwentySix);
		assert_eq!(engine.local_budget, Duration::from_secs(1));
		assert_eq!(engine.global_budget, Duration::from_secs(10));
		assert_eq!(engine.combination_limit, 16);
		assert_eq!(engine.worker_threads, None);
	}

	#[test]
	fn test_full_config() {
		let text = r#"
input = "brain.raw"
output = "brain_labels.raw"
dims = [64, 64, 32]
sample = "u16"
shape = 100.0
kernel = 140.0
neighborhood = 60.0
connectivity = 6
cost = "voxel_count"
acceptance = "roots"
solver = "greedy"
threads = 2
local_budget_ms = 250
combination_limit = 4
greedy_baseline = true
downsample = 2
"#;
		let config = Config::parse(text).unwrap();
		assert_eq!(config.dims, Some([64, 64, 32]));
		assert_eq!(config.sample, SampleFormat::U16);

		let engine = config.simplify_config();
		assert_eq!(engine.foreground, Connectivity::Six);
		assert_eq!(engine.cost_mode, CostMode::VoxelCount);
		assert_eq!(engine.acceptance, AcceptanceRule::Roots);
		assert_eq!(engine.solver, SolverMode::Greedy);
		assert_eq!(engine.worker_threads, Some(2));
		assert_eq!(engine.local_budget, Duration::from_millis(250));
		assert_eq!(engine.combination_limit, 4);
		assert!(engine.greedy_baseline);
	}

	#[test]
	fn test_rejects_bad_values() {
		let bad = [
			"shape = 0.0\nkernel = -1.0\nneighborhood = -2.0",
			"shape = 0.0\nkernel = 1.0\nneighborhood = 0.5",
			"shape = 0.0\nkernel = 1.0\nneighborhood = -1.0\nconnectivity = 18",
			"shape = 0.0\nkernel = 1.0\nneighborhood = -1.0\ndownsample = 0",
			"shape = 0.0\nkernel = 1.0\nneighborhood = -1.0\ndims = [4, 0, 4]",
			"shape = 0.0\nkernel = 1.0\nneighborhood = -1.0\nunknown = 3",
		];
		for text in bad {
			assert!(Config::parse(text).is_err(), "accepted: {text}");
		}
	}
}
