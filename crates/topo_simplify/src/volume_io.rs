//! Raw volume files and their `.dat` sidecars.
//!
//! Samples are stored x fastest, little endian. A sidecar looks like:
//!
//! ```text
//! ObjectFileName: head.raw
//! Resolution:     256 256 113
//! Format:         USHORT
//! ```

use anyhow::{Context, Result};
use glam::UVec3;
use serde::Deserialize;
use std::path::Path;

use voxel_topology::Volume;

/// Sample type of a raw volume.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
	#[default]
	U8,
	U16,
	F32,
}

impl SampleFormat {
	pub fn bytes(self) -> usize {
		match self {
			SampleFormat::U8 => 1,
			SampleFormat::U16 => 2,
			SampleFormat::F32 => 4,
		}
	}

	/// Parse the `Format:` value of a sidecar.
	pub fn from_sidecar(name: &str) -> Option<Self> {
		match name.to_ascii_uppercase().as_str() {
			"UCHAR" => Some(SampleFormat::U8),
			"USHORT" => Some(SampleFormat::U16),
			"FLOAT" => Some(SampleFormat::F32),
			_ => None,
		}
	}
}

/// Decode little-endian samples to intensities.
pub fn decode(bytes: &[u8], format: SampleFormat) -> Result<Vec<f32>> {
	if bytes.len() % format.bytes() != 0 {
		anyhow::bail!(
			"{} bytes is not a whole number of {:?} samples",
			bytes.len(),
			format
		);
	}
	let data = match format {
		SampleFormat::U8 => bytes.iter().map(|&b| b as f32).collect(),
		SampleFormat::U16 => bytes
			.chunks_exact(2)
			.map(|c| u16::from_le_bytes([c[0], c[1]]) as f32)
			.collect(),
		SampleFormat::F32 => bytes
			.chunks_exact(4)
			.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
			.collect(),
	};
	Ok(data)
}

/// Read a raw volume of known shape.
pub fn read_raw(path: &Path, dims: UVec3, format: SampleFormat) -> Result<Volume> {
	let bytes =
		std::fs::read(path).with_context(|| format!("Failed to read volume: {}", path.display()))?;
	let data = decode(&bytes, format).with_context(|| format!("Decoding {}", path.display()))?;
	Volume::new(dims, data).with_context(|| format!("Invalid volume: {}", path.display()))
}

/// Dimensions and sample format from a `.dat` sidecar.
pub fn parse_sidecar(text: &str) -> Result<(UVec3, SampleFormat)> {
	let mut dims = None;
	let mut format = None;
	for line in text.lines() {
		let Some((key, value)) = line.split_once(':') else {
			continue;
		};
		match key.trim() {
			"Resolution" => {
				let parts: Vec<u32> = value
					.split_whitespace()
					.map(str::parse)
					.collect::<Result<_, _>>()
					.with_context(|| format!("Bad resolution: {}", value.trim()))?;
				if parts.len() != 3 {
					anyhow::bail!("Resolution needs three values, got {}", parts.len());
				}
				dims = Some(UVec3::new(parts[0], parts[1], parts[2]));
			}
			"Format" => {
				format = Some(
					SampleFormat::from_sidecar(value.trim())
						.with_context(|| format!("Unsupported format: {}", value.trim()))?,
				);
			}
			_ => {}
		}
	}
	match (dims, format) {
		(Some(dims), Some(format)) => Ok((dims, format)),
		(None, _) => anyhow::bail!("Sidecar has no Resolution line"),
		(_, None) => anyhow::bail!("Sidecar has no Format line"),
	}
}

/// Read `path` using the `.dat` sidecar next to it.
pub fn read_with_sidecar(path: &Path) -> Result<Volume> {
	let sidecar = path.with_extension("dat");
	let text = std::fs::read_to_string(&sidecar)
		.with_context(|| format!("Failed to read sidecar: {}", sidecar.display()))?;
	let (dims, format) =
		parse_sidecar(&text).with_context(|| format!("Parsing {}", sidecar.display()))?;
	read_raw(path, dims, format)
}

pub fn write_labels(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
	}
	std::fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))
}
