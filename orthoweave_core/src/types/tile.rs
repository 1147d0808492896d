use super::PixelBBox;
use std::path::PathBuf;

/// One input raster with a rectangular placement on the canvas.
///
/// Tiles are constructed by the resolver, shifted once during finalization
/// and immutable afterwards. Pixel data is not held here; rasters and masks
/// are loaded transiently right before they are needed.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
	/// Short human identifier, derived from the raster file stem.
	pub name: String,
	/// Path to the raster data, lazy-loaded.
	pub image_path: PathBuf,
	/// Optional preauthored validity mask (on disk: black = valid).
	pub validity_mask_path: Option<PathBuf>,
	/// Generated Voronoi ownership mask, recorded after mask generation.
	pub voronoi_mask_path: Option<PathBuf>,
	/// Top-left offset in canvas pixel coordinates.
	pub x: i64,
	/// Top-left offset in canvas pixel coordinates.
	pub y: i64,
	pub width: u32,
	pub height: u32,
}

impl Tile {
	/// Tile center in real-valued canvas coordinates.
	pub fn center(&self) -> (f64, f64) {
		(
			self.x as f64 + f64::from(self.width) / 2.0,
			self.y as f64 + f64::from(self.height) / 2.0,
		)
	}

	/// Whether the canvas pixel `(x, y)` lies inside the tile bounds.
	pub fn contains(&self, x: i64, y: i64) -> bool {
		x >= self.x && y >= self.y && x < self.x + i64::from(self.width) && y < self.y + i64::from(self.height)
	}

	pub fn bbox(&self) -> PixelBBox {
		PixelBBox::new(
			self.x,
			self.y,
			self.x + i64::from(self.width),
			self.y + i64::from(self.height),
		)
	}

	/// Euclidean distance from a canvas point to the tile center.
	pub fn distance_to_center(&self, x: f64, y: f64) -> f64 {
		let (cx, cy) = self.center();
		((x - cx).powi(2) + (y - cy).powi(2)).sqrt()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tile(x: i64, y: i64, width: u32, height: u32) -> Tile {
		Tile {
			name: "test".to_string(),
			image_path: PathBuf::from("test.tif"),
			validity_mask_path: None,
			voronoi_mask_path: None,
			x,
			y,
			width,
			height,
		}
	}

	#[test]
	fn center_is_half_size_from_origin() {
		assert_eq!(tile(0, 0, 10, 10).center(), (5.0, 5.0));
		assert_eq!(tile(6, 0, 9, 10).center(), (10.5, 5.0));
	}

	#[test]
	fn contains_is_inclusive_min_exclusive_max() {
		let t = tile(2, 3, 4, 5);
		assert!(t.contains(2, 3));
		assert!(t.contains(5, 7));
		assert!(!t.contains(6, 3));
		assert!(!t.contains(2, 8));
		assert!(!t.contains(1, 3));
	}

	#[test]
	fn bbox_covers_tile_rect() {
		assert_eq!(tile(5, 5, 4, 4).bbox(), PixelBBox::new(5, 5, 9, 9));
	}

	#[test]
	fn distance_to_center_is_euclidean() {
		let t = tile(0, 0, 10, 10);
		assert_eq!(t.distance_to_center(5.0, 5.0), 0.0);
		assert_eq!(t.distance_to_center(8.0, 9.0), 5.0);
	}
}
