//! Thin codec wrappers over the [`image`] crate.
//!
//! The codec is picked from the file extension (TIFF for rasters and masks,
//! PNG also accepted for the composite). Read failures carry the
//! `MissingInput` kind, write failures `IOWriteFailure`.

use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use std::path::Path;

/// Loads a raster and converts it to 8-bit RGB.
pub fn read_rgb(path: &Path) -> Result<RgbImage> {
	let image = image::open(path).with_context(|| format!("MissingInput: cannot read raster {}", path.display()))?;
	Ok(image.into_rgb8())
}

/// Loads a mask and converts it to 8-bit grayscale luminance.
pub fn read_gray(path: &Path) -> Result<GrayImage> {
	let image = image::open(path).with_context(|| format!("MissingInput: cannot read mask {}", path.display()))?;
	Ok(image.into_luma8())
}

pub fn write_rgb(path: &Path, image: &RgbImage) -> Result<()> {
	image
		.save(path)
		.with_context(|| format!("IOWriteFailure: cannot write image {}", path.display()))
}

pub fn write_gray(path: &Path, image: &GrayImage) -> Result<()> {
	image
		.save(path)
		.with_context(|| format!("IOWriteFailure: cannot write mask {}", path.display()))
}
