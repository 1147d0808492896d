use super::directory::{CANVAS_METADATA_FILE, REFERENCE_WORLD_FILE};
use crate::types::WorldFile;
use anyhow::{Context, Result};
use regex::Regex;
use std::{fs, path::Path};

/// Canvas geometry declared by the optional reference files.
#[derive(Debug)]
pub struct ReferenceCanvas {
	pub origin_x: i64,
	pub origin_y: i64,
	pub width: u32,
	pub height: u32,
}

/// Returns the declared canvas when BOTH the reference world file and the
/// canvas metadata file exist; `None` selects fallback bounding-box mode.
pub fn probe_reference_canvas(dir: &Path) -> Result<Option<ReferenceCanvas>> {
	let world_path = dir.join(REFERENCE_WORLD_FILE);
	let metadata_path = dir.join(CANVAS_METADATA_FILE);
	if !world_path.is_file() || !metadata_path.is_file() {
		return Ok(None);
	}

	let world = WorldFile::read(&world_path)?;
	world
		.ensure_axis_aligned()
		.with_context(|| format!("in reference world file {}", world_path.display()))?;

	let (width, height) = parse_canvas_size(&metadata_path)?;
	Ok(Some(ReferenceCanvas {
		origin_x: world.pixel_x(),
		origin_y: world.pixel_y(),
		width,
		height,
	}))
}

/// Extracts the `W H` integers of the `NombrePixels` element.
fn parse_canvas_size(path: &Path) -> Result<(u32, u32)> {
	let text = fs::read_to_string(path)
		.with_context(|| format!("MetadataMalformed: cannot read metadata file {}", path.display()))?;

	let pattern = Regex::new(r"<NombrePixels>\s*(\d+)\s+(\d+)\s*</NombrePixels>")?;
	let captures = pattern
		.captures(&text)
		.with_context(|| format!("MetadataMalformed: no NombrePixels element in {}", path.display()))?;

	let width = captures[1]
		.parse()
		.with_context(|| format!("MetadataMalformed: bad canvas width in {}", path.display()))?;
	let height = captures[2]
		.parse()
		.with_context(|| format!("MetadataMalformed: bad canvas height in {}", path.display()))?;
	Ok((width, height))
}
