use anyhow::{Context, Result};
use std::{
	fs,
	path::{Path, PathBuf},
};

/// Raster extensions probed next to each world file, in order.
const RASTER_EXTENSIONS: [&str; 4] = ["tif", "tiff", "TIF", "TIFF"];

/// Optional world file describing the pixel origin of the whole mosaic.
pub const REFERENCE_WORLD_FILE: &str = "Orthophotomosaic.tfw";

/// Optional metadata file declaring the canvas pixel dimensions.
pub const CANVAS_METADATA_FILE: &str = "MTDOrtho.xml";

const VALIDITY_RASTER_PREFIX: &str = "Ort_";
const VALIDITY_MASK_PREFIX: &str = "PC_";

/// Lists all world files in `dir`, sorted by file name so that tile
/// enumeration is deterministic across filesystems.
pub fn list_world_files(dir: &Path) -> Result<Vec<PathBuf>> {
	let entries =
		fs::read_dir(dir).with_context(|| format!("MissingInput: cannot read input directory {}", dir.display()))?;

	let mut paths = Vec::new();
	for entry in entries {
		let path = entry?.path();
		if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("tfw")) {
			paths.push(path);
		}
	}
	paths.sort();
	Ok(paths)
}

/// Probes for a raster next to `world_file`. World files without a raster
/// are valid input (e.g. the bare reference world file) and are skipped.
pub fn probe_raster(world_file: &Path) -> Option<PathBuf> {
	RASTER_EXTENSIONS
		.iter()
		.map(|ext| world_file.with_extension(ext))
		.find(|path| path.is_file())
}

/// Probes for a preauthored validity mask: rasters named `Ort_<rest>` may
/// carry a mask named `PC_<rest>`.
pub fn probe_validity_mask(raster: &Path) -> Option<PathBuf> {
	let name = raster.file_name()?.to_str()?;
	let rest = name.strip_prefix(VALIDITY_RASTER_PREFIX)?;
	let candidate = raster.with_file_name(format!("{VALIDITY_MASK_PREFIX}{rest}"));
	candidate.is_file().then_some(candidate)
}
