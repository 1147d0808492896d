//! Turns an input directory of world files and rasters into a finalized
//! mosaic layout.
//!
//! Per tile: parse the world file, enforce axis-aligned geometry and a
//! consistent pixel scale, probe the raster and its optional validity mask,
//! and compute the canvas offset. The canvas itself comes either from the
//! reference files (referenced mode) or from the tight bounding box of all
//! tiles (fallback mode). Any malformed tile aborts the resolve.

mod directory;
mod reference;

pub use directory::{CANVAS_METADATA_FILE, REFERENCE_WORLD_FILE};

use crate::types::{PixelBBox, Tile, WorldFile};
use anyhow::{Context, Result, ensure};
use std::path::Path;

/// A finalized mosaic: tiles in canvas pixel coordinates plus the derived
/// canvas size. Tile metadata is immutable from here on.
#[derive(Clone, Debug)]
pub struct MosaicLayout {
	pub tiles: Vec<Tile>,
	pub canvas_width: u32,
	pub canvas_height: u32,
	/// Absolute pixel scale shared by all tiles.
	pub pixel_scale: (f64, f64),
}

/// Resolves all tiles in `dir` and derives the canvas.
pub fn resolve_mosaic(dir: &Path) -> Result<MosaicLayout> {
	let world_files = directory::list_world_files(dir)?;
	let mut tiles = Vec::new();
	let mut pixel_scale: Option<(f64, f64)> = None;

	for world_path in &world_files {
		let Some(image_path) = directory::probe_raster(world_path) else {
			log::debug!("skipping {}: no raster with a matching extension", world_path.display());
			continue;
		};

		let world = WorldFile::read(world_path)?;
		world
			.ensure_axis_aligned()
			.with_context(|| format!("in world file {}", world_path.display()))?;

		let scale = world.pixel_scale();
		match pixel_scale {
			None => pixel_scale = Some(scale),
			Some(expected) => ensure!(
				scale == expected,
				"ResolutionMismatch: {} has pixel scale {:?}, expected {:?}",
				world_path.display(),
				scale,
				expected
			),
		}

		let (width, height) = image::image_dimensions(&image_path)
			.with_context(|| format!("MissingInput: cannot read raster dimensions of {}", image_path.display()))?;
		ensure!(
			width > 0 && height > 0,
			"MissingInput: raster {} has no pixels",
			image_path.display()
		);

		let name = image_path
			.file_stem()
			.map(|s| s.to_string_lossy().to_string())
			.unwrap_or_default();
		log::trace!(
			"resolved tile {name}: origin ({}, {}), size {width}x{height}",
			world.pixel_x(),
			world.pixel_y()
		);

		tiles.push(Tile {
			name,
			validity_mask_path: directory::probe_validity_mask(&image_path),
			voronoi_mask_path: None,
			image_path,
			x: world.pixel_x(),
			y: world.pixel_y(),
			width,
			height,
		});
	}

	ensure!(
		tiles.len() >= 2,
		"CanvasInvalid: found {} tile(s) in {}, need at least two",
		tiles.len(),
		dir.display()
	);

	let (canvas_width, canvas_height) = if let Some(canvas) = reference::probe_reference_canvas(dir)? {
		log::debug!(
			"referenced mode: origin ({}, {}), canvas {}x{}",
			canvas.origin_x,
			canvas.origin_y,
			canvas.width,
			canvas.height
		);
		for tile in &mut tiles {
			tile.x -= canvas.origin_x;
			tile.y -= canvas.origin_y;
		}
		(i64::from(canvas.width), i64::from(canvas.height))
	} else {
		let mut bbox = PixelBBox::new_empty();
		for tile in &tiles {
			bbox.include_rect(tile.x, tile.y, tile.width, tile.height);
		}
		log::debug!("fallback mode: bounding box {bbox:?}");
		for tile in &mut tiles {
			tile.x -= bbox.x_min;
			tile.y -= bbox.y_min;
		}
		(bbox.width(), bbox.height())
	};

	ensure!(
		canvas_width > 0 && canvas_height > 0,
		"CanvasInvalid: derived canvas size {canvas_width}x{canvas_height}"
	);
	log::info!("resolved {} tiles on a {canvas_width}x{canvas_height} canvas", tiles.len());

	Ok(MosaicLayout {
		tiles,
		canvas_width: canvas_width as u32,
		canvas_height: canvas_height as u32,
		pixel_scale: pixel_scale.unwrap(),
	})
}
