//! Topology simplification front end.
//!
//! Reads raw scalar volumes, runs the simplification engine and writes one
//! label byte per voxel (255 foreground, 0 background).
//!
//! Modes:
//! - `--config run.toml`: single volume named by the config
//! - `--config run.toml --batch <dir> --out <dir>`: every `.raw` file in a
//!   directory, shapes taken from `.dat` sidecars
//! - `--generate-table <path>`: write the simple-point dictionary

mod config;
mod volume_io;

use anyhow::{Context, Result};
use clap::Parser;
use glam::UVec3;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use config::Config;
use voxel_topology::{simplify, SimplePointOracle, SimpleTable, SimplifyOutcome, Volume};

/// Topology-preserving simplification of voxel volumes.
#[derive(Parser, Debug)]
#[command(name = "topo_simplify")]
#[command(about = "Removes spurious handles, components and cavities from voxel volumes")]
struct Args {
	/// Path to configuration TOML file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Process every .raw file in this directory.
	#[arg(short, long, requires = "out")]
	batch: Option<PathBuf>,

	/// Output directory for batch runs.
	#[arg(short, long)]
	out: Option<PathBuf>,

	/// Generate the simple-point dictionary at this path and exit.
	#[arg(long)]
	generate_table: Option<PathBuf>,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn main() -> Result<()> {
	let args = Args::parse();
	init_logging(args.verbose);

	if let Some(path) = &args.generate_table {
		let table = SimpleTable::generate();
		table
			.write(path)
			.with_context(|| format!("Writing dictionary: {}", path.display()))?;
		info!(path = %path.display(), "dictionary written");
		return Ok(());
	}

	let Some(config_path) = &args.config else {
		anyhow::bail!("--config is required unless --generate-table is given");
	};
	let config = Config::load(config_path)?;
	let oracle = match &config.dictionary {
		Some(path) => SimplePointOracle::load(path)
			.with_context(|| format!("Loading dictionary: {}", path.display()))?,
		None => SimplePointOracle::computed(),
	};

	match (&args.batch, &args.out) {
		(Some(dir), Some(out)) => run_batch(&config, &oracle, dir, out),
		_ => run_single(&config, &oracle),
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_target(false)
		.init();
}

fn run_single(config: &Config, oracle: &SimplePointOracle) -> Result<()> {
	let (Some(input), Some(output), Some(dims)) = (&config.input, &config.output, config.dims) else {
		anyhow::bail!("Single runs need input, output and dims in the config");
	};
	let volume = volume_io::read_raw(input, UVec3::from_array(dims), config.sample)?;
	let outcome = process(config, oracle, volume, input)?;
	volume_io::write_labels(output, &outcome.to_bytes())?;
	info!(path = %output.display(), "labels written");
	Ok(())
}

fn run_batch(config: &Config, oracle: &SimplePointOracle, dir: &Path, out: &Path) -> Result<()> {
	let mut inputs: Vec<PathBuf> = std::fs::read_dir(dir)
		.with_context(|| format!("Failed to read batch dir: {}", dir.display()))?
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.filter(|p| p.extension().is_some_and(|ext| ext == "raw"))
		.collect();
	inputs.sort();
	if inputs.is_empty() {
		warn!(dir = %dir.display(), "no .raw files found");
	}

	for input in &inputs {
		let volume = volume_io::read_with_sidecar(input)?;
		let outcome = process(config, oracle, volume, input)?;
		let Some(output) = output_path(out, input) else {
			continue;
		};
		volume_io::write_labels(&output, &outcome.to_bytes())?;
		info!(path = %output.display(), "labels written");
	}
	info!(volumes = inputs.len(), "batch finished");
	Ok(())
}

/// Batch output for `input`: its file name without the `.raw` extension.
fn output_path(out: &Path, input: &Path) -> Option<PathBuf> {
	input.file_stem().map(|stem| out.join(stem))
}

/// Downsample, simplify and report one volume.
fn process(config: &Config, oracle: &SimplePointOracle, volume: Volume, source: &Path) -> Result<SimplifyOutcome> {
	let volume = if config.downsample > 1 {
		let reduced = volume.downsample(config.downsample)?;
		info!(from = ?volume.dims(), to = ?reduced.dims(), "downsampled");
		reduced
	} else {
		volume
	};

	let outcome = simplify(&volume, config.simplify_config(), oracle)
		.with_context(|| format!("Simplifying {}", source.display()))?;
	report(source, &outcome);
	Ok(outcome)
}

fn report(source: &Path, outcome: &SimplifyOutcome) {
	info!(
		volume = %source.display(),
		before = %outcome.betti_before,
		after = %outcome.betti_after,
		cost = outcome.costs.applied,
		all_cut = outcome.costs.all_cut,
		all_fill = outcome.costs.all_fill,
		generators = outcome.stats.initial_generators,
		"simplified"
	);
	info!(timings = %outcome.stats.timings, "stage timings");
	let solve = &outcome.stats.solve;
	if let Some((min_us, max_us)) = solve.cluster_times_us.min_max() {
		info!(
			clusters = solve.clusters_solved,
			deferred = solve.clusters_deferred,
			avg_us = solve.cluster_times_us.average(),
			min_us,
			max_us,
			"cluster solve times"
		);
	}
	if let Some(fallback) = &solve.fallback {
		warn!(flips = fallback.flips, "steiner decisions replaced by greedy pass");
	}
	if let Some(baseline) = &outcome.baseline {
		info!(
			betti = %baseline.betti,
			cost = baseline.applied_cost,
			flips = baseline.flips,
			"greedy baseline"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_output_path_drops_raw_extension() {
		let out = Path::new("labels");
		assert_eq!(
			output_path(out, Path::new("scans/plant_07.raw")),
			Some(PathBuf::from("labels/plant_07"))
		);
		assert_eq!(
			output_path(out, Path::new("scans/head.v2.raw")),
			Some(PathBuf::from("labels/head.v2"))
		);
		assert_eq!(output_path(out, Path::new("/")), None);
	}
}
