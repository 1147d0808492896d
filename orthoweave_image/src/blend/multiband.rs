use super::WeightType;
use crate::{
	GrayF32Image, GrayI16Image, RgbI16Image,
	pyramid::{self, reflect_edge},
};
use anyhow::{Result, ensure};
use image::{GrayImage, Luma, Rgb};
use orthoweave_core::PixelBBox;

/// Weights below this count as "no coverage" when float weights are used.
pub const WEIGHT_EPS: f32 = 1e-5;

/// Weight accumulator pyramids in the configured numeric type.
#[derive(Debug)]
enum WeightAccumulator {
	F32(Vec<GrayF32Image>),
	I16(Vec<GrayI16Image>),
}

/// Gaussian mask pyramids of a single fed tile.
enum MaskPyramid {
	F32(Vec<GrayF32Image>),
	I16(Vec<GrayI16Image>),
}

/// The support region of a fed tile: an aligned rectangle of the padded
/// canvas, plus the padding widths between region and tile rect.
#[derive(Debug, PartialEq, Eq)]
struct Region {
	x: i64,
	y: i64,
	width: u32,
	height: u32,
	/// Horizontal distance from the region origin to the tile origin.
	/// Negative values crop instead of padding.
	left: i64,
	top: i64,
}

/// Multi-band blender with two masks per tile.
///
/// `feed` accumulates each tile's Laplacian pyramid modulated by its sharp
/// *blend mask*, while the normalization denominator accumulates the smooth
/// *weight mask*. `blend` normalizes, collapses and crops the result.
///
/// Accumulation is order-independent: the output depends only on the set of
/// contributions, not on feed order.
#[derive(Debug)]
pub struct DualMaskBlender {
	weight_type: WeightType,
	/// Effective band count, capped by the canvas size.
	num_bands: u32,
	dst_roi: PixelBBox,
	padded_width: u32,
	padded_height: u32,
	laplace: Vec<RgbI16Image>,
	weights: WeightAccumulator,
	fed_tiles: usize,
}

impl DualMaskBlender {
	/// Allocates accumulator pyramids covering `dst_roi`, padded so that
	/// every level halves exactly.
	pub fn prepare(dst_roi: PixelBBox, num_bands: u32, weight_type: WeightType) -> Result<Self> {
		ensure!(
			num_bands <= 50,
			"InvalidGeometry: band count {num_bands} out of range, maximum is 50"
		);
		ensure!(!dst_roi.is_empty(), "CanvasInvalid: blend target {dst_roi:?} is empty");

		let width = dst_roi.width() as u32;
		let height = dst_roi.height() as u32;
		let effective = num_bands.min(ceil_log2(width.max(height)));
		let align = 1u32 << effective;
		let padded_width = width.next_multiple_of(align);
		let padded_height = height.next_multiple_of(align);
		log::debug!(
			"preparing blender: {effective} bands, padded canvas {padded_width}x{padded_height}, {weight_type} weights"
		);

		let level_sizes = || (0..=effective).map(|i| (padded_width >> i, padded_height >> i));
		let laplace = level_sizes().map(|(w, h)| RgbI16Image::new(w, h)).collect();
		let weights = match weight_type {
			WeightType::Float32 => WeightAccumulator::F32(level_sizes().map(|(w, h)| GrayF32Image::new(w, h)).collect()),
			WeightType::Int16 => WeightAccumulator::I16(level_sizes().map(|(w, h)| GrayI16Image::new(w, h)).collect()),
		};

		Ok(Self {
			weight_type,
			num_bands: effective,
			dst_roi,
			padded_width,
			padded_height,
			laplace,
			weights,
			fed_tiles: 0,
		})
	}

	pub fn num_bands(&self) -> u32 {
		self.num_bands
	}

	/// Accumulates one tile placed at `top_left` (canvas coordinates).
	///
	/// `weight_mask` fills the normalization denominator, `blend_mask`
	/// modulates the Laplacian contribution; both must match the image
	/// dimensions. The raster is reflect-padded into the support region,
	/// the masks are zero-padded.
	pub fn feed(
		&mut self,
		image: &RgbI16Image,
		weight_mask: &GrayImage,
		blend_mask: &GrayImage,
		top_left: (i64, i64),
	) -> Result<()> {
		let (width, height) = image.dimensions();
		ensure!(
			weight_mask.dimensions() == (width, height) && blend_mask.dimensions() == (width, height),
			"TypeMismatch: image is {width}x{height} but masks are {:?} and {:?}",
			weight_mask.dimensions(),
			blend_mask.dimensions()
		);

		let region = self.support_region(top_left, width, height)?;
		let padded = reflect_pad(image, &region);
		let src_laplace = pyramid::build_laplacian(&padded, self.num_bands);
		let w_pyramid = self.mask_pyramid(weight_mask, &region);
		let b_pyramid = self.mask_pyramid(blend_mask, &region);

		// the Laplacian contribution is modulated by the blend mask while
		// the denominator accumulates the weight mask
		match (&mut self.weights, &w_pyramid, &b_pyramid) {
			(WeightAccumulator::F32(wsum), MaskPyramid::F32(wp), MaskPyramid::F32(bp)) => {
				for (level, src) in src_laplace.iter().enumerate() {
					let x0 = (region.x >> level) as u32;
					let y0 = (region.y >> level) as u32;
					accumulate_f32(&mut self.laplace[level], &mut wsum[level], src, &wp[level], &bp[level], x0, y0);
				}
			}
			(WeightAccumulator::I16(wsum), MaskPyramid::I16(wp), MaskPyramid::I16(bp)) => {
				for (level, src) in src_laplace.iter().enumerate() {
					let x0 = (region.x >> level) as u32;
					let y0 = (region.y >> level) as u32;
					accumulate_i16(&mut self.laplace[level], &mut wsum[level], src, &wp[level], &bp[level], x0, y0);
				}
			}
			_ => unreachable!("mask pyramids always match the configured weight type"),
		}

		self.fed_tiles += 1;
		Ok(())
	}

	/// Normalizes and collapses the accumulated pyramids. Returns the int16
	/// composite cropped to the requested region and its coverage mask,
	/// which is white exactly where some weight mask covered the pixel.
	pub fn blend(mut self) -> Result<(RgbI16Image, GrayImage)> {
		ensure!(self.fed_tiles > 0, "BlenderEmpty: no tile was fed");
		log::debug!("blending {} fed tiles", self.fed_tiles);

		match &self.weights {
			WeightAccumulator::F32(wsum) => {
				for (laplace, weights) in self.laplace.iter_mut().zip(wsum) {
					normalize_f32(laplace, weights);
				}
			}
			WeightAccumulator::I16(wsum) => {
				for (laplace, weights) in self.laplace.iter_mut().zip(wsum) {
					normalize_i16(laplace, weights);
				}
			}
		}

		let full = pyramid::collapse_laplacian(std::mem::take(&mut self.laplace));

		let width = self.dst_roi.width() as u32;
		let height = self.dst_roi.height() as u32;
		let coverage = match &self.weights {
			WeightAccumulator::F32(wsum) => GrayImage::from_fn(width, height, |x, y| {
				Luma([if wsum[0].get_pixel(x, y)[0] > WEIGHT_EPS { 255 } else { 0 }])
			}),
			WeightAccumulator::I16(wsum) => GrayImage::from_fn(width, height, |x, y| {
				Luma([if wsum[0].get_pixel(x, y)[0] > 0 { 255 } else { 0 }])
			}),
		};

		// crop the padding away and zero every pixel no tile covered
		let image = RgbI16Image::from_fn(width, height, |x, y| {
			if coverage.get_pixel(x, y)[0] == 0 {
				Rgb([0, 0, 0])
			} else {
				*full.get_pixel(x, y)
			}
		});
		Ok((image, coverage))
	}

	/// Computes the aligned support region of a tile: the tile rect extended
	/// by `3 * 2^bands`, clipped to the padded canvas, snapped to the
	/// pyramid grid and re-expanded to aligned dimensions.
	fn support_region(&self, top_left: (i64, i64), width: u32, height: u32) -> Result<Region> {
		let align = i64::from(1u32 << self.num_bands);
		let gap = 3 * align;
		let lx = top_left.0 - self.dst_roi.x_min;
		let ly = top_left.1 - self.dst_roi.y_min;
		let padded_w = i64::from(self.padded_width);
		let padded_h = i64::from(self.padded_height);

		let mut x0 = (lx - gap).max(0);
		let mut y0 = (ly - gap).max(0);
		let mut x1 = (lx + i64::from(width) + gap).min(padded_w);
		let mut y1 = (ly + i64::from(height) + gap).min(padded_h);
		ensure!(
			x0 < x1 && y0 < y1,
			"IncompatibleLevel: tile at ({}, {}) has no support region inside the canvas",
			top_left.0,
			top_left.1
		);

		x0 -= x0.rem_euclid(align);
		y0 -= y0.rem_euclid(align);
		let region_w = round_up(x1 - x0, align);
		let region_h = round_up(y1 - y0, align);
		x1 = x0 + region_w;
		y1 = y0 + region_h;

		// shift any overhang back inside; alignment is preserved because the
		// padded canvas dimensions are themselves aligned
		x0 -= (x1 - padded_w).max(0);
		y0 -= (y1 - padded_h).max(0);

		Ok(Region {
			x: x0,
			y: y0,
			width: region_w as u32,
			height: region_h as u32,
			left: lx - x0,
			top: ly - y0,
		})
	}

	/// Converts a mask to the working weight type, zero-pads it into the
	/// support region and builds its Gaussian pyramid.
	fn mask_pyramid(&self, mask: &GrayImage, region: &Region) -> MaskPyramid {
		match self.weight_type {
			WeightType::Float32 => {
				let base = GrayF32Image::from_fn(region.width, region.height, |x, y| {
					Luma([f32::from(sample_mask(mask, x, y, region)) / 255.0])
				});
				MaskPyramid::F32(pyramid::build_gaussian(&base, self.num_bands))
			}
			WeightType::Int16 => {
				let base = GrayI16Image::from_fn(region.width, region.height, |x, y| {
					let value = sample_mask(mask, x, y, region);
					Luma([if value == 0 { 0 } else { i16::from(value) + 1 }])
				});
				MaskPyramid::I16(pyramid::build_gaussian(&base, self.num_bands))
			}
		}
	}
}

fn ceil_log2(value: u32) -> u32 {
	value.next_power_of_two().trailing_zeros()
}

fn round_up(value: i64, align: i64) -> i64 {
	value + (align - value.rem_euclid(align)) % align
}

fn sample_mask(mask: &GrayImage, x: u32, y: u32, region: &Region) -> u8 {
	let sx = i64::from(x) - region.left;
	let sy = i64::from(y) - region.top;
	if sx >= 0 && sy >= 0 && sx < i64::from(mask.width()) && sy < i64::from(mask.height()) {
		mask.get_pixel(sx as u32, sy as u32)[0]
	} else {
		0
	}
}

fn reflect_pad(image: &RgbI16Image, region: &Region) -> RgbI16Image {
	let width = i64::from(image.width());
	let height = i64::from(image.height());
	RgbI16Image::from_fn(region.width, region.height, |x, y| {
		let sx = reflect_edge(i64::from(x) - region.left, width) as u32;
		let sy = reflect_edge(i64::from(y) - region.top, height) as u32;
		*image.get_pixel(sx, sy)
	})
}

fn accumulate_f32(
	laplace: &mut RgbI16Image,
	wsum: &mut GrayF32Image,
	src: &RgbI16Image,
	weight: &GrayF32Image,
	blend: &GrayF32Image,
	x0: u32,
	y0: u32,
) {
	for y in 0..src.height() {
		for x in 0..src.width() {
			let b = blend.get_pixel(x, y)[0];
			let s = src.get_pixel(x, y);
			let d = laplace.get_pixel_mut(x0 + x, y0 + y);
			for c in 0..3 {
				d[c] = d[c].saturating_add((f32::from(s[c]) * b).round() as i16);
			}
			wsum.get_pixel_mut(x0 + x, y0 + y)[0] += weight.get_pixel(x, y)[0];
		}
	}
}

fn accumulate_i16(
	laplace: &mut RgbI16Image,
	wsum: &mut GrayI16Image,
	src: &RgbI16Image,
	weight: &GrayI16Image,
	blend: &GrayI16Image,
	x0: u32,
	y0: u32,
) {
	for y in 0..src.height() {
		for x in 0..src.width() {
			let b = i32::from(blend.get_pixel(x, y)[0]);
			let s = src.get_pixel(x, y);
			let d = laplace.get_pixel_mut(x0 + x, y0 + y);
			for c in 0..3 {
				d[c] = d[c].saturating_add(((i32::from(s[c]) * b) >> 8) as i16);
			}
			let w = wsum.get_pixel_mut(x0 + x, y0 + y);
			w[0] = w[0].saturating_add(weight.get_pixel(x, y)[0]);
		}
	}
}

fn normalize_f32(laplace: &mut RgbI16Image, weights: &GrayF32Image) {
	for (pixel, w) in laplace.pixels_mut().zip(weights.pixels()) {
		let denominator = w[0] + WEIGHT_EPS;
		for c in 0..3 {
			pixel[c] = (f32::from(pixel[c]) / denominator).round() as i16;
		}
	}
}

fn normalize_i16(laplace: &mut RgbI16Image, weights: &GrayI16Image) {
	for (pixel, w) in laplace.pixels_mut().zip(weights.pixels()) {
		let denominator = i32::from(w[0]) + 1;
		for c in 0..3 {
			pixel[c] = ((i32::from(pixel[c]) << 8) / denominator).clamp(-32768, 32767) as i16;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mask::generate_voronoi_masks;
	use orthoweave_core::Tile;
	use std::path::PathBuf;

	fn roi(width: i64, height: i64) -> PixelBBox {
		PixelBBox::new(0, 0, width, height)
	}

	fn solid(width: u32, height: u32, value: i16) -> RgbI16Image {
		RgbI16Image::from_pixel(width, height, Rgb([value, value, value]))
	}

	fn full_mask(width: u32, height: u32) -> GrayImage {
		GrayImage::from_pixel(width, height, Luma([255]))
	}

	fn tile(name: &str, x: i64, y: i64, width: u32, height: u32) -> Tile {
		Tile {
			name: name.to_string(),
			image_path: PathBuf::from(format!("{name}.tif")),
			validity_mask_path: None,
			voronoi_mask_path: None,
			x,
			y,
			width,
			height,
		}
	}

	#[test]
	fn effective_band_count_is_capped_by_canvas_size() {
		let blender = DualMaskBlender::prepare(roi(100, 50), 50, WeightType::Float32).unwrap();
		assert_eq!(blender.num_bands(), 7);
		assert_eq!((blender.padded_width, blender.padded_height), (128, 128));
		assert_eq!(blender.laplace.len(), 8);
	}

	#[test]
	fn zero_bands_degenerate_to_a_single_level() {
		let blender = DualMaskBlender::prepare(roi(10, 10), 0, WeightType::Float32).unwrap();
		assert_eq!(blender.num_bands(), 0);
		assert_eq!(blender.laplace.len(), 1);
		assert_eq!((blender.padded_width, blender.padded_height), (10, 10));
	}

	#[test]
	fn support_region_is_snapped_to_the_pyramid_grid() {
		let blender = DualMaskBlender::prepare(roi(16, 10), 2, WeightType::Float32).unwrap();
		// gap 12 around a 4x4 tile at (5, 3) covers the whole padded canvas
		assert_eq!(
			blender.support_region((5, 3), 4, 4).unwrap(),
			Region {
				x: 0,
				y: 0,
				width: 16,
				height: 12,
				left: 5,
				top: 3
			}
		);

		let blender = DualMaskBlender::prepare(roi(10, 10), 0, WeightType::Float32).unwrap();
		assert_eq!(
			blender.support_region((4, 4), 2, 2).unwrap(),
			Region {
				x: 1,
				y: 1,
				width: 8,
				height: 8,
				left: 3,
				top: 3
			}
		);
	}

	#[test]
	fn single_tile_with_full_masks_reproduces_the_input() {
		let image = RgbI16Image::from_fn(16, 16, |x, y| Rgb([(x * 10 + y) as i16, (y * 10) as i16, 77]));
		let mut blender = DualMaskBlender::prepare(roi(16, 16), 2, WeightType::Float32).unwrap();
		blender.feed(&image, &full_mask(16, 16), &full_mask(16, 16), (0, 0)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		assert!(mask.pixels().all(|p| p[0] == 255));
		for (a, b) in out.as_raw().iter().zip(image.as_raw()) {
			assert!((a - b).abs() <= 2, "output off by {}", (a - b).abs());
		}
	}

	#[test]
	fn direct_blend_averages_at_the_voronoi_frontier() {
		// centers (5,5) and (11,5), frontier at x = 8, seam band [6, 10]
		let tiles = [tile("a", 0, 0, 10, 10), tile("b", 6, 0, 10, 10)];
		let masks = generate_voronoi_masks(&tiles, &[None, None], 2.0).unwrap();

		let mut blender = DualMaskBlender::prepare(roi(16, 10), 0, WeightType::Float32).unwrap();
		blender.feed(&solid(10, 10, 100), &masks[0], &masks[0], (0, 0)).unwrap();
		blender.feed(&solid(10, 10, 200), &masks[1], &masks[1], (6, 0)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		assert!(mask.pixels().all(|p| p[0] == 255));
		assert_eq!(out.get_pixel(2, 5)[0], 100);
		assert_eq!(out.get_pixel(14, 5)[0], 200);
		// exact average on the frontier, linear in between
		assert_eq!(out.get_pixel(8, 5)[0], 150);
		assert_eq!(out.get_pixel(7, 5)[0], 125);
		assert_eq!(out.get_pixel(9, 5)[0], 175);
	}

	#[test]
	fn integer_weights_blend_within_rounding_of_the_float_path() {
		let tiles = [tile("a", 0, 0, 10, 10), tile("b", 6, 0, 10, 10)];
		let masks = generate_voronoi_masks(&tiles, &[None, None], 2.0).unwrap();

		let mut blender = DualMaskBlender::prepare(roi(16, 10), 0, WeightType::Int16).unwrap();
		blender.feed(&solid(10, 10, 100), &masks[0], &masks[0], (0, 0)).unwrap();
		blender.feed(&solid(10, 10, 200), &masks[1], &masks[1], (6, 0)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		assert!(mask.pixels().all(|p| p[0] == 255));
		assert!((i32::from(out.get_pixel(2, 5)[0]) - 100).abs() <= 2);
		assert!((i32::from(out.get_pixel(14, 5)[0]) - 200).abs() <= 2);
		assert!((i32::from(out.get_pixel(8, 5)[0]) - 150).abs() <= 3);
	}

	#[test]
	fn blend_mask_gates_contribution_while_weight_mask_sets_coverage() {
		let weight = full_mask(4, 4);
		let blend = GrayImage::from_fn(4, 4, |x, _| if x < 2 { Luma([255]) } else { Luma([0]) });

		let mut blender = DualMaskBlender::prepare(roi(4, 4), 0, WeightType::Float32).unwrap();
		blender.feed(&solid(4, 4, 80), &weight, &blend, (0, 0)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		// the weight mask covers everything, so nothing is masked out...
		assert!(mask.pixels().all(|p| p[0] == 255));
		for y in 0..4 {
			// ...but only blend-masked pixels carry the tile's colour
			assert_eq!(out.get_pixel(0, y)[0], 80);
			assert_eq!(out.get_pixel(1, y)[0], 80);
			assert_eq!(out.get_pixel(2, y)[0], 0);
			assert_eq!(out.get_pixel(3, y)[0], 0);
		}
	}

	#[test]
	fn multiband_blend_transitions_smoothly_between_solid_tiles() {
		let mut blender = DualMaskBlender::prepare(roi(16, 10), 2, WeightType::Float32).unwrap();
		blender.feed(&solid(10, 10, 100), &full_mask(10, 10), &full_mask(10, 10), (0, 0)).unwrap();
		blender.feed(&solid(10, 10, 200), &full_mask(10, 10), &full_mask(10, 10), (6, 0)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		assert!(mask.pixels().all(|p| p[0] == 255));
		// blending two solid values can never leave their range
		assert!(out.pixels().all(|p| (99..=201).contains(&p[0])));
		assert!(out.get_pixel(0, 5)[0] <= 115);
		assert!(out.get_pixel(15, 5)[0] >= 165);
		let seam = out.get_pixel(8, 5)[0];
		assert!((135..=165).contains(&seam), "seam value {seam}");
	}

	#[test]
	fn coverage_mask_equals_weight_support() {
		let mut blender = DualMaskBlender::prepare(roi(10, 10), 2, WeightType::Float32).unwrap();
		blender.feed(&solid(4, 4, 70), &full_mask(4, 4), &full_mask(4, 4), (2, 2)).unwrap();
		let (out, mask) = blender.blend().unwrap();

		for y in 0..10_u32 {
			for x in 0..10_u32 {
				let covered = (2..6).contains(&x) && (2..6).contains(&y);
				assert_eq!(mask.get_pixel(x, y)[0], if covered { 255 } else { 0 }, "at ({x}, {y})");
				if covered {
					assert!((i32::from(out.get_pixel(x, y)[0]) - 70).abs() <= 2);
				} else {
					assert_eq!(out.get_pixel(x, y), &Rgb([0, 0, 0]));
				}
			}
		}
	}

	#[test]
	fn mismatched_mask_dimensions_are_rejected() {
		let mut blender = DualMaskBlender::prepare(roi(8, 8), 1, WeightType::Float32).unwrap();
		let err = blender
			.feed(&solid(4, 4, 1), &full_mask(3, 4), &full_mask(4, 4), (0, 0))
			.unwrap_err()
			.to_string();
		assert!(err.starts_with("TypeMismatch"), "unexpected error: {err}");
	}

	#[test]
	fn tile_outside_the_canvas_is_rejected() {
		let mut blender = DualMaskBlender::prepare(roi(10, 10), 0, WeightType::Float32).unwrap();
		let err = blender
			.feed(&solid(4, 4, 1), &full_mask(4, 4), &full_mask(4, 4), (100, 100))
			.unwrap_err()
			.to_string();
		assert!(err.starts_with("IncompatibleLevel"), "unexpected error: {err}");
	}

	#[test]
	fn blending_without_any_tile_is_rejected() {
		let blender = DualMaskBlender::prepare(roi(8, 8), 1, WeightType::Float32).unwrap();
		let err = blender.blend().unwrap_err().to_string();
		assert!(err.starts_with("BlenderEmpty"), "unexpected error: {err}");
	}

	#[test]
	fn band_count_above_the_limit_is_rejected() {
		let err = DualMaskBlender::prepare(roi(8, 8), 51, WeightType::Float32)
			.unwrap_err()
			.to_string();
		assert!(err.starts_with("InvalidGeometry"), "unexpected error: {err}");
	}
}
