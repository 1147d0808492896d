//! Voronoi ownership mask generation.
//!
//! For every pixel of a tile the generator decides how much ownership the
//! tile claims relative to its neighbours. Ownership is binary outside a
//! narrow seam band straddling the Voronoi frontier between tile centers;
//! inside the band it ramps linearly, so that the claims of the two nearest
//! tiles always sum to full ownership.

use super::INVALID_THRESHOLD;
use crate::format;
use anyhow::{Context, Result, ensure};
use image::{GrayImage, Luma};
use orthoweave_core::Tile;
use std::path::{Path, PathBuf};

/// Where the generated mask of a raster is persisted.
pub fn voronoi_mask_path(image_path: &Path) -> PathBuf {
	let stem = image_path
		.file_stem()
		.map(|s| s.to_string_lossy().to_string())
		.unwrap_or_default();
	image_path.with_file_name(format!("{stem}_voronoi_mask.tif"))
}

pub fn write_voronoi_mask(path: &Path, mask: &GrayImage) -> Result<()> {
	format::write_gray(path, mask).with_context(|| format!("MaskWriteFailure: {}", path.display()))
}

/// Generates one ownership mask per tile.
///
/// `validity_masks` runs parallel to `tiles`; `None` means the whole tile is
/// valid. `overlap_margin` is the half-width of the seam band in pixels.
pub fn generate_voronoi_masks(
	tiles: &[Tile],
	validity_masks: &[Option<GrayImage>],
	overlap_margin: f64,
) -> Result<Vec<GrayImage>> {
	ensure!(
		overlap_margin >= 0.0,
		"InvalidGeometry: overlap margin must not be negative, got {overlap_margin}"
	);
	ensure!(!tiles.is_empty(), "InvalidGeometry: tile list is empty");
	ensure!(
		tiles.len() == validity_masks.len(),
		"InvalidGeometry: {} tiles but {} validity masks",
		tiles.len(),
		validity_masks.len()
	);
	for (tile, mask) in tiles.iter().zip(validity_masks) {
		if let Some(mask) = mask {
			ensure!(
				mask.dimensions() == (tile.width, tile.height),
				"MaskShapeMismatch: validity mask of tile {} is {}x{}, raster is {}x{}",
				tile.name,
				mask.width(),
				mask.height(),
				tile.width,
				tile.height
			);
		}
	}

	Ok(
		(0..tiles.len())
			.map(|index| {
				log::debug!("generating voronoi mask for tile {}", tiles[index].name);
				generate_mask(tiles, validity_masks, index, overlap_margin)
			})
			.collect(),
	)
}

fn generate_mask(tiles: &[Tile], validity_masks: &[Option<GrayImage>], index: usize, margin: f64) -> GrayImage {
	let tile = &tiles[index];
	GrayImage::from_fn(tile.width, tile.height, |u, v| {
		if !is_valid(validity_masks, index, u, v) {
			return Luma([0]);
		}
		let x = tile.x + i64::from(u);
		let y = tile.y + i64::from(v);
		Luma([ownership(tiles, validity_masks, index, x, y, margin)])
	})
}

/// Ownership of the canvas pixel `(x, y)` claimed by tile `index`.
fn ownership(tiles: &[Tile], validity_masks: &[Option<GrayImage>], index: usize, x: i64, y: i64, margin: f64) -> u8 {
	let (xf, yf) = (x as f64, y as f64);
	let mut d_min = f64::INFINITY;
	let mut d_second = f64::INFINITY;
	let mut owner = index;

	for (j, other) in tiles.iter().enumerate() {
		if !other.contains(x, y) {
			continue;
		}
		let u = (x - other.x) as u32;
		let v = (y - other.y) as u32;
		if !is_valid(validity_masks, j, u, v) {
			continue;
		}
		let d = other.distance_to_center(xf, yf);
		if d < d_min {
			d_second = d_min;
			d_min = d;
			owner = j;
		} else if d < d_second {
			d_second = d;
		}
	}

	// signed distance to the Voronoi frontier: positive means the pixel lies
	// inside this tile's cell by that many pixels
	let frontier = (d_second - d_min) / 2.0;
	let offset = if owner == index { frontier } else { -frontier };

	if offset >= margin {
		255
	} else if offset < -margin {
		0
	} else {
		(255.0 * (offset + margin) / (2.0 * margin)).round() as u8
	}
}

fn is_valid(validity_masks: &[Option<GrayImage>], index: usize, u: u32, v: u32) -> bool {
	match &validity_masks[index] {
		Some(mask) => mask.get_pixel(u, v)[0] < INVALID_THRESHOLD,
		None => true,
	}
}
