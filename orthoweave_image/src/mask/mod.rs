//! Mask construction: generated Voronoi ownership masks and the coverage
//! masks derived from them (or from validity masks) for blending.

mod coverage;
pub use coverage::*;

mod voronoi;
pub use voronoi::*;

/// On-disk validity convention: luminance at or above this marks a pixel
/// invalid (white = invalid, black = valid).
pub const INVALID_THRESHOLD: u8 = 128;
