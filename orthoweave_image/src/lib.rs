//! Orthoweave image processing crate.
//!
//! Everything that touches pixels lives here:
//! - `mask`: Voronoi ownership masks and coverage mask building
//! - `pyramid`: Gaussian/Laplacian pyramid kernels
//! - `blend`: the dual-mask multi-band blender
//! - `format`: thin codec wrappers over the [`image`] crate
//!
//! Color rasters travel through the blender as 3-channel int16 buffers;
//! masks are 8-bit grayscale on disk and float32 or int16 inside the
//! blender, depending on its configured weight type.

pub mod blend;
pub mod convert;
pub mod format;
pub mod mask;
pub mod pyramid;

pub use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// 3-channel int16 raster, the blender's working color format.
pub type RgbI16Image = ImageBuffer<Rgb<i16>, Vec<i16>>;

/// Single-channel float32 plane, used for float weight accumulation.
pub type GrayF32Image = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Single-channel int16 plane, used for integer weight accumulation.
pub type GrayI16Image = ImageBuffer<Luma<i16>, Vec<i16>>;
