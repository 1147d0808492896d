//! Conversions between the 8-bit disk formats and the blender's int16
//! working format.

use crate::RgbI16Image;
use image::{Rgb, RgbImage};

pub fn rgb8_to_i16(image: &RgbImage) -> RgbI16Image {
	RgbI16Image::from_fn(image.width(), image.height(), |x, y| {
		let p = image.get_pixel(x, y);
		Rgb([i16::from(p[0]), i16::from(p[1]), i16::from(p[2])])
	})
}

/// Clamps each channel to the 8-bit range.
pub fn i16_to_rgb8(image: &RgbI16Image) -> RgbImage {
	RgbImage::from_fn(image.width(), image.height(), |x, y| {
		let p = image.get_pixel(x, y);
		Rgb([
			p[0].clamp(0, 255) as u8,
			p[1].clamp(0, 255) as u8,
			p[2].clamp(0, 255) as u8,
		])
	})
}
