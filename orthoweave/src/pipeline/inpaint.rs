//! Mean-colour inpainting of blend-masked raster pixels.

use image::{GrayImage, Rgb, RgbImage};

/// Replaces raster pixels where `mask` is zero with the tile's mask-weighted
/// mean colour.
///
/// Pyramids bleed across zero-mask regions unless those regions carry a
/// plausible local colour; painting the mean keeps the Laplacian energy low
/// at mask boundaries. The mean is weighted by the blend mask itself, so it
/// matches the colours that actually survive into the pyramid product.
pub fn fill_masked_with_mean(raster: &mut RgbImage, mask: &GrayImage) {
	let mut sums = [0.0f64; 3];
	let mut total = 0.0f64;
	for (pixel, m) in raster.pixels().zip(mask.pixels()) {
		let weight = f64::from(m[0]);
		for c in 0..3 {
			sums[c] += weight * f64::from(pixel[c]);
		}
		total += weight;
	}
	if total == 0.0 {
		return;
	}

	let mean = Rgb([
		(sums[0] / total).round() as u8,
		(sums[1] / total).round() as u8,
		(sums[2] / total).round() as u8,
	]);
	for (pixel, m) in raster.pixels_mut().zip(mask.pixels()) {
		if m[0] == 0 {
			*pixel = mean;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Luma;

	#[test]
	fn masked_hole_is_filled_with_the_mean() {
		// left half 100, right half 40; the right half is masked out
		let mut raster = RgbImage::from_fn(8, 4, |x, _| if x < 4 { Rgb([100, 100, 100]) } else { Rgb([40, 40, 40]) });
		let mask = GrayImage::from_fn(8, 4, |x, _| if x < 4 { Luma([255]) } else { Luma([0]) });

		fill_masked_with_mean(&mut raster, &mask);

		// the mean ignores masked pixels, so the hole gets the left half's
		// colour and no edge survives at the mask boundary
		assert!(raster.pixels().all(|p| p == &Rgb([100, 100, 100])));
	}

	#[test]
	fn mean_is_weighted_by_the_mask_gradient() {
		let mut raster = RgbImage::from_fn(3, 1, |x, _| match x {
			0 => Rgb([10, 10, 10]),
			1 => Rgb([250, 250, 250]),
			_ => Rgb([77, 77, 77]),
		});
		let mut mask = GrayImage::new(3, 1);
		mask.put_pixel(0, 0, Luma([192]));
		mask.put_pixel(1, 0, Luma([64]));

		fill_masked_with_mean(&mut raster, &mask);

		// (192 * 10 + 64 * 250) / 256 = 70
		assert_eq!(raster.get_pixel(2, 0), &Rgb([70, 70, 70]));
		assert_eq!(raster.get_pixel(0, 0), &Rgb([10, 10, 10]));
	}

	#[test]
	fn all_zero_mask_leaves_the_raster_unchanged() {
		let mut raster = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 9]));
		let expected = raster.clone();
		fill_masked_with_mean(&mut raster, &GrayImage::new(4, 4));
		assert_eq!(raster, expected);
	}
}
