use super::{PyramidSample, add_assign, pyr_down, pyr_up, subtract};
use image::{ImageBuffer, Pixel};

/// Builds a Gaussian pyramid with `levels + 1` entries; entry 0 is the
/// unfiltered input.
pub fn build_gaussian<P, S>(image: &ImageBuffer<P, Vec<S>>, levels: u32) -> Vec<ImageBuffer<P, Vec<S>>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	let mut pyramid = vec![image.clone()];
	for _ in 0..levels {
		pyramid.push(pyr_down(pyramid.last().unwrap()));
	}
	pyramid
}

/// Builds a Laplacian pyramid with `levels + 1` entries: `levels` band-pass
/// images followed by the low-pass residual.
pub fn build_laplacian<P, S>(image: &ImageBuffer<P, Vec<S>>, levels: u32) -> Vec<ImageBuffer<P, Vec<S>>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	let gaussian = build_gaussian(image, levels);
	let mut pyramid = Vec::with_capacity(gaussian.len());
	for i in 0..levels as usize {
		pyramid.push(subtract(&gaussian[i], &pyr_up(&gaussian[i + 1])));
	}
	pyramid.push(gaussian.into_iter().last().unwrap());
	pyramid
}

/// Collapses a Laplacian pyramid bottom-up into the reconstructed image.
/// Every level must be exactly half the size of the level below it.
pub fn collapse_laplacian<P, S>(mut pyramid: Vec<ImageBuffer<P, Vec<S>>>) -> ImageBuffer<P, Vec<S>>
where
	P: Pixel<Subpixel = S>,
	S: PyramidSample,
{
	let mut acc = pyramid.pop().expect("pyramid must not be empty");
	while let Some(mut level) = pyramid.pop() {
		add_assign(&mut level, &pyr_up(&acc));
		acc = level;
	}
	acc
}
