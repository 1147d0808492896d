//! The pipeline driver.
//!
//! A deterministic, strictly sequential run: resolve metadata, generate
//! Voronoi masks, prepare the blender, feed every tile (loading raster and
//! masks just before the feed and releasing them right after), blend, emit.
//! The first error aborts the run; recovery is never attempted.

mod inpaint;

pub use inpaint::fill_masked_with_mean;

use anyhow::{Result, ensure};
use image::GrayImage;
use orthoweave_core::{PixelBBox, Tile, resolve_mosaic};
use orthoweave_image::{
	blend::{DualMaskBlender, WeightType},
	convert, format,
	mask::{
		feathered_coverage, generate_voronoi_masks, magenta_validity, sharp_coverage, voronoi_mask_path,
		write_voronoi_mask,
	},
};
use std::path::{Path, PathBuf};

/// Tuning knobs of a blend run.
#[derive(Clone, Debug)]
pub struct BlendParameters {
	/// Number of pyramid bands; 0 degenerates to direct weighted blending.
	pub num_bands: u32,
	/// Distance in pixels over which weight masks ramp up from invalid
	/// pixels and tile borders.
	pub feather_radius: f64,
	/// Half-width of the Voronoi seam band in pixels.
	pub overlap_margin: f64,
	/// Generate Voronoi masks and blend with the dual-mask split. When
	/// disabled every tile's blend mask is a clone of its weight mask and
	/// the blender behaves conventionally.
	pub use_voronoi: bool,
	/// Numeric type of the blender's weight accumulators.
	pub weight_type: WeightType,
	/// Write per-tile weight/blend masks and the coverage mask next to the
	/// composite.
	pub debug: bool,
}

impl Default for BlendParameters {
	fn default() -> Self {
		Self {
			num_bands: 14,
			feather_radius: 512.0,
			overlap_margin: 20.0,
			use_voronoi: true,
			weight_type: WeightType::Float32,
			debug: false,
		}
	}
}

/// Runs the full pipeline on `input_dir` and writes the composite to
/// `output_path`.
pub fn run_pipeline(input_dir: &Path, output_path: &Path, parameters: &BlendParameters) -> Result<()> {
	let mut mosaic = resolve_mosaic(input_dir)?;

	if parameters.use_voronoi {
		generate_masks(&mut mosaic.tiles, parameters.overlap_margin)?;
	}

	let canvas = PixelBBox::new(0, 0, i64::from(mosaic.canvas_width), i64::from(mosaic.canvas_height));
	let mut blender = DualMaskBlender::prepare(canvas, parameters.num_bands, parameters.weight_type)?;
	log::info!("blending {} tiles with {} bands", mosaic.tiles.len(), blender.num_bands());

	for tile in &mosaic.tiles {
		feed_tile(&mut blender, tile, parameters, output_path)?;
	}

	let (image, coverage) = blender.blend()?;
	format::write_rgb(output_path, &convert::i16_to_rgb8(&image))?;
	if parameters.debug {
		format::write_gray(&debug_path(output_path, "coverage"), &coverage)?;
	}
	log::info!("wrote composite to {}", output_path.display());
	Ok(())
}

/// Generates and persists one Voronoi mask per tile, recording each mask's
/// path back into its tile.
pub fn generate_masks(tiles: &mut [Tile], overlap_margin: f64) -> Result<()> {
	let validity = load_validity_masks(tiles)?;
	let masks = generate_voronoi_masks(tiles, &validity, overlap_margin)?;
	for (tile, mask) in tiles.iter_mut().zip(&masks) {
		let path = voronoi_mask_path(&tile.image_path);
		write_voronoi_mask(&path, mask)?;
		log::debug!("wrote voronoi mask {}", path.display());
		tile.voronoi_mask_path = Some(path);
	}
	Ok(())
}

fn load_validity_masks(tiles: &[Tile]) -> Result<Vec<Option<GrayImage>>> {
	tiles
		.iter()
		.map(|tile| tile.validity_mask_path.as_deref().map(format::read_gray).transpose())
		.collect()
}

/// Loads one tile's buffers, builds its two masks and feeds the blender.
/// All buffers are released when this returns, keeping the peak footprint
/// at one resident tile.
fn feed_tile(blender: &mut DualMaskBlender, tile: &Tile, parameters: &BlendParameters, output_path: &Path) -> Result<()> {
	log::debug!("feeding tile {} at ({}, {})", tile.name, tile.x, tile.y);
	let mut raster = format::read_rgb(&tile.image_path)?;

	// weight mask: feathered validity, falling back to magenta detection
	let validity = match &tile.validity_mask_path {
		Some(path) => {
			let mask = format::read_gray(path)?;
			ensure_tile_shape(tile, &mask, path)?;
			mask
		}
		None => magenta_validity(&raster),
	};
	let weight = feathered_coverage(&validity, parameters.feather_radius);
	ensure!(
		weight.pixels().any(|p| p[0] > 0),
		"EmptyMask: tile {} has no valid pixels",
		tile.name
	);

	// blend mask: the sharp Voronoi gradient, or a clone of the weight mask
	// when Voronoi blending is disabled
	let blend = match &tile.voronoi_mask_path {
		Some(path) => {
			let mask = format::read_gray(path)?;
			ensure_tile_shape(tile, &mask, path)?;
			sharp_coverage(&mask)
		}
		None => weight.clone(),
	};

	// pixels the blend mask excludes still enter the pyramid; they carry
	// the tile's mean colour instead of whatever the raster holds there
	fill_masked_with_mean(&mut raster, &blend);

	if parameters.debug {
		format::write_gray(&debug_path(output_path, &format!("{}_weight", tile.name)), &weight)?;
		format::write_gray(&debug_path(output_path, &format!("{}_blend", tile.name)), &blend)?;
	}

	blender.feed(&convert::rgb8_to_i16(&raster), &weight, &blend, (tile.x, tile.y))
}

fn ensure_tile_shape(tile: &Tile, mask: &GrayImage, path: &Path) -> Result<()> {
	ensure!(
		mask.dimensions() == (tile.width, tile.height),
		"MaskShapeMismatch: mask {} is {}x{}, raster is {}x{}",
		path.display(),
		mask.width(),
		mask.height(),
		tile.width,
		tile.height
	);
	Ok(())
}

fn debug_path(output_path: &Path, suffix: &str) -> PathBuf {
	let stem = output_path
		.file_stem()
		.map(|s| s.to_string_lossy().to_string())
		.unwrap_or_default();
	output_path.with_file_name(format!("{stem}_{suffix}.tif"))
}
