//! Coverage mask building.
//!
//! Turns a loaded mask (or the raster itself, via the magenta fallback) into
//! the 8-bit mask the blender consumes. Two modes: *sharp* keeps a generated
//! gradient untouched, *feathered* binarizes a validity mask and ramps it
//! smoothly away from invalid pixels and the tile border.

use super::INVALID_THRESHOLD;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;

/// Copies the mask luminance verbatim, preserving any gradient it carries.
pub fn sharp_coverage(mask: &GrayImage) -> GrayImage {
	mask.clone()
}

/// Derives a validity mask from the raster itself: pixels of exact magenta
/// (255, 0, 255) are invalid, everything else is valid.
pub fn magenta_validity(raster: &RgbImage) -> GrayImage {
	GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
		if raster.get_pixel(x, y).0 == [255, 0, 255] {
			Luma([255])
		} else {
			Luma([0])
		}
	})
}

/// Builds a feathered coverage mask from an on-disk validity mask.
///
/// The mask is binarized first (luminance below 128 is valid, mapped to
/// 255), then ramped from 0 at invalid pixels and at the tile border up to
/// 255 over `feather_radius` pixels. A radius of at most 1 skips feathering
/// and returns the binary mask. Originally invalid pixels stay exactly 0;
/// the ramp never revives them.
pub fn feathered_coverage(validity: &GrayImage, feather_radius: f64) -> GrayImage {
	let (width, height) = validity.dimensions();
	let binary = GrayImage::from_fn(width, height, |x, y| {
		if validity.get_pixel(x, y)[0] < INVALID_THRESHOLD {
			Luma([255])
		} else {
			Luma([0])
		}
	});
	if feather_radius <= 1.0 {
		return binary;
	}

	// distance to the nearest invalid pixel; without any invalid pixel only
	// the border ramp applies
	let invalid = GrayImage::from_fn(width, height, |x, y| Luma([255 - binary.get_pixel(x, y)[0]]));
	let has_invalid = invalid.pixels().any(|p| p[0] > 0);
	let squared = has_invalid.then(|| euclidean_squared_distance_transform(&invalid));

	GrayImage::from_fn(width, height, |x, y| {
		// the border frame's distance transform collapses to this closed form
		let border = x.min(y).min(width - 1 - x).min(height - 1 - y) as f64;
		let mask_dist = squared
			.as_ref()
			.map_or(f64::INFINITY, |d| d.get_pixel(x, y)[0].sqrt());
		let distance = border.min(mask_dist);
		Luma([((distance / feather_radius).min(1.0) * 255.0).round() as u8])
	})
}
