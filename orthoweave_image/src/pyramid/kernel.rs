use image::{ImageBuffer, Pixel};

/// The binomial 5-tap kernel, normalized for the downsampling pass.
const KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Sample types the pyramid kernels operate on. Filtering is accumulated in
/// f32; integer samples round and saturate on store.
pub trait PyramidSample: image::Primitive {
	fn to_f32(self) -> f32;
	fn from_f32(value: f32) -> Self;
}

impl PyramidSample for i16 {
	fn to_f32(self) -> f32 {
		f32::from(self)
	}

	fn from_f32(value: f32) -> Self {
		value.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
	}
}

impl PyramidSample for f32 {
	fn to_f32(self) -> f32 {
		self
	}

	fn from_f32(value: f32) -> Self {
		value
	}
}

/// Mirrors an out-of-range index into `[0, len)` without repeating the edge
/// sample (`dcb|abcd|cba`).
pub fn reflect_inner(index: i64, len: i64) -> usize {
	if len == 1 {
		return 0;
	}
	let period = 2 * (len - 1);
	let mut i = index.rem_euclid(period);
	if i >= len {
		i = period - i;
	}
	i as usize
}

/// Mirrors an out-of-range index into `[0, len)` repeating the edge sample
/// (`cba|abcd|dcb`), matching the blender's reflect padding.
pub fn reflect_edge(index: i64, len: i64) -> usize {
	let period = 2 * len;
	let i = index.rem_euclid(period);
	if i >= len { (period - 1 - i) as usize } else { i as usize }
}

/// Blurs with the binomial kernel and drops every other row and column.
/// Output dimensions are the ceiling halves of the input.
pub fn pyr_down<P, S>(src: &ImageBuffer<P, Vec<S>>) -> ImageBuffer<P, Vec<S>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	let channels = P::CHANNEL_COUNT as usize;
	let (w, h) = (src.width() as usize, src.height() as usize);
	let (dw, dh) = (w.div_ceil(2), h.div_ceil(2));
	let samples = src.as_raw();

	// horizontal blur + decimation
	let mut tmp = vec![0.0f32; dw * h * channels];
	for y in 0..h {
		for x in 0..dw {
			for c in 0..channels {
				let mut acc = 0.0;
				for (k, weight) in KERNEL.iter().enumerate() {
					let sx = reflect_inner(2 * x as i64 + k as i64 - 2, w as i64);
					acc += weight * samples[(y * w + sx) * channels + c].to_f32();
				}
				tmp[(y * dw + x) * channels + c] = acc;
			}
		}
	}

	// vertical blur + decimation
	let mut out = Vec::with_capacity(dw * dh * channels);
	for y in 0..dh {
		for x in 0..dw {
			for c in 0..channels {
				let mut acc = 0.0;
				for (k, weight) in KERNEL.iter().enumerate() {
					let sy = reflect_inner(2 * y as i64 + k as i64 - 2, h as i64);
					acc += weight * tmp[(sy * dw + x) * channels + c];
				}
				out.push(S::from_f32(acc));
			}
		}
	}
	ImageBuffer::from_raw(dw as u32, dh as u32, out).unwrap()
}

/// Doubles both dimensions, interpolating with the kernel of [`pyr_down`]
/// scaled to preserve intensity.
pub fn pyr_up<P, S>(src: &ImageBuffer<P, Vec<S>>) -> ImageBuffer<P, Vec<S>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	let channels = P::CHANNEL_COUNT as usize;
	let (w, h) = (src.width() as usize, src.height() as usize);
	let samples = src.as_raw();

	// horizontal polyphase upsampling: even taps (1 6 1)/8, odd taps (4 4)/8
	let mut tmp = vec![0.0f32; 2 * w * h * channels];
	for y in 0..h {
		for x in 0..w {
			let prev = reflect_inner(x as i64 - 1, w as i64);
			let next = reflect_inner(x as i64 + 1, w as i64);
			for c in 0..channels {
				let row = y * w;
				let a = samples[(row + prev) * channels + c].to_f32();
				let b = samples[(row + x) * channels + c].to_f32();
				let d = samples[(row + next) * channels + c].to_f32();
				tmp[(y * 2 * w + 2 * x) * channels + c] = (a + 6.0 * b + d) / 8.0;
				tmp[(y * 2 * w + 2 * x + 1) * channels + c] = (b + d) / 2.0;
			}
		}
	}

	// vertical polyphase upsampling
	let dw = 2 * w;
	let mut out = vec![S::from_f32(0.0); dw * 2 * h * channels];
	for y in 0..h {
		let prev = reflect_inner(y as i64 - 1, h as i64);
		let next = reflect_inner(y as i64 + 1, h as i64);
		for x in 0..dw {
			for c in 0..channels {
				let a = tmp[(prev * dw + x) * channels + c];
				let b = tmp[(y * dw + x) * channels + c];
				let d = tmp[(next * dw + x) * channels + c];
				out[(2 * y * dw + x) * channels + c] = S::from_f32((a + 6.0 * b + d) / 8.0);
				out[((2 * y + 1) * dw + x) * channels + c] = S::from_f32((b + d) / 2.0);
			}
		}
	}
	ImageBuffer::from_raw(dw as u32, 2 * h as u32, out).unwrap()
}

/// Elementwise `a - b`; both buffers must have equal dimensions.
pub fn subtract<P, S>(a: &ImageBuffer<P, Vec<S>>, b: &ImageBuffer<P, Vec<S>>) -> ImageBuffer<P, Vec<S>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	assert_eq!(a.dimensions(), b.dimensions());
	let samples = a
		.as_raw()
		.iter()
		.zip(b.as_raw())
		.map(|(&x, &y)| S::from_f32(x.to_f32() - y.to_f32()))
		.collect();
	ImageBuffer::from_raw(a.width(), a.height(), samples).unwrap()
}

/// Elementwise `dst += src`; both buffers must have equal dimensions.
pub fn add_assign<P, S>(dst: &mut ImageBuffer<P, Vec<S>>, src: &ImageBuffer<P, Vec<S>>)
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	assert_eq!(dst.dimensions(), src.dimensions());
	for (d, s) in dst.iter_mut().zip(src.as_raw()) {
		*d = S::from_f32(PyramidSample::to_f32(*d) + PyramidSample::to_f32(*s));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{GrayF32Image, RgbI16Image};
	use image::Rgb;
	use rstest::rstest;

	#[rstest]
	#[case::start(0, 0)]
	#[case::end(3, 3)]
	#[case::minus_one(-1, 1)]
	#[case::minus_two(-2, 2)]
	#[case::past_end(4, 2)]
	#[case::far_past_end(5, 1)]
	fn inner_reflection_skips_the_edge_sample(#[case] index: i64, #[case] expected: usize) {
		assert_eq!(reflect_inner(index, 4), expected);
	}

	#[rstest]
	#[case::start(0, 0)]
	#[case::minus_one(-1, 0)]
	#[case::minus_two(-2, 1)]
	#[case::past_end(4, 3)]
	#[case::far_past_end(6, 1)]
	fn edge_reflection_repeats_the_edge_sample(#[case] index: i64, #[case] expected: usize) {
		assert_eq!(reflect_edge(index, 4), expected);
	}

	#[test]
	fn single_sample_lines_reflect_to_themselves() {
		assert_eq!(reflect_inner(-2, 1), 0);
		assert_eq!(reflect_inner(3, 1), 0);
	}

	#[rstest]
	#[case::even(10, 6, 5, 3)]
	#[case::odd(9, 5, 5, 3)]
	#[case::tiny(2, 2, 1, 1)]
	fn pyr_down_halves_dimensions_rounding_up(#[case] w: u32, #[case] h: u32, #[case] dw: u32, #[case] dh: u32) {
		let src = RgbI16Image::from_pixel(w, h, Rgb([100, -50, 3000]));
		let down = pyr_down(&src);
		assert_eq!(down.dimensions(), (dw, dh));
		// a constant image stays constant under the normalized kernel
		assert!(down.pixels().all(|p| p == &Rgb([100, -50, 3000])));
	}

	#[test]
	fn pyr_up_doubles_dimensions_and_preserves_constants() {
		let src = GrayF32Image::from_pixel(3, 2, image::Luma([0.25]));
		let up = pyr_up(&src);
		assert_eq!(up.dimensions(), (6, 4));
		assert!(up.pixels().all(|p| (p[0] - 0.25).abs() < 1e-6));
	}

	#[test]
	fn subtract_and_add_are_inverses() {
		let a = RgbI16Image::from_fn(4, 4, |x, y| Rgb([(x * y) as i16, x as i16, -(y as i16)]));
		let b = RgbI16Image::from_pixel(4, 4, Rgb([7, -3, 11]));
		let mut diff = subtract(&a, &b);
		add_assign(&mut diff, &b);
		assert_eq!(diff, a);
	}
}
