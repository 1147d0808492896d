use anyhow::{Context, Result, bail, ensure};
use std::{fmt, fs, path::Path};

/// The six-parameter affine georeference of a raster, as stored in a world
/// file (`.tfw`): one decimal number per line, in the order
/// scale X, rotation Y, rotation X, scale Y, translate X, translate Y.
///
/// Only axis-aligned geometries are supported; the rotation terms must be
/// exactly zero and both scales nonzero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldFile {
	pub scale_x: f64,
	pub rot_y: f64,
	pub rot_x: f64,
	pub scale_y: f64,
	pub translate_x: f64,
	pub translate_y: f64,
}

impl WorldFile {
	/// Reads and parses a world file from disk.
	pub fn read(path: &Path) -> Result<Self> {
		let text = fs::read_to_string(path)
			.with_context(|| format!("MetadataMalformed: cannot read world file {}", path.display()))?;
		Self::try_from(text.as_str()).with_context(|| format!("MetadataMalformed: in world file {}", path.display()))
	}

	/// Fails with `UnsupportedGeometry` unless the geometry is axis-aligned
	/// with nonzero scales. Rotation is checked against exact zero.
	pub fn ensure_axis_aligned(&self) -> Result<()> {
		ensure!(
			self.rot_x == 0.0 && self.rot_y == 0.0,
			"UnsupportedGeometry: rotation terms must be exactly zero, found ({}, {})",
			self.rot_x,
			self.rot_y
		);
		ensure!(
			self.scale_x != 0.0 && self.scale_y != 0.0,
			"UnsupportedGeometry: pixel scales must be nonzero, found ({}, {})",
			self.scale_x,
			self.scale_y
		);
		Ok(())
	}

	/// Absolute pixel scale, used for cross-tile consistency checks.
	pub fn pixel_scale(&self) -> (f64, f64) {
		(self.scale_x.abs(), self.scale_y.abs())
	}

	/// Horizontal pixel offset of the raster origin.
	pub fn pixel_x(&self) -> i64 {
		(self.translate_x / self.scale_x.abs()).round() as i64
	}

	/// Vertical pixel offset of the raster origin. The sign inverts because
	/// world coordinates grow northward while image rows grow downward.
	pub fn pixel_y(&self) -> i64 {
		(-self.translate_y / self.scale_y.abs()).round() as i64
	}
}

impl TryFrom<&str> for WorldFile {
	type Error = anyhow::Error;

	fn try_from(text: &str) -> Result<Self> {
		let mut values = [0.0; 6];
		let mut count = 0;
		for token in text.split_whitespace() {
			ensure!(count < 6, "MetadataMalformed: expected six numbers, found more");
			values[count] = token
				.parse::<f64>()
				.map_err(|_| anyhow::anyhow!("MetadataMalformed: non-numeric token {token:?}"))?;
			count += 1;
		}
		if count < 6 {
			bail!("MetadataMalformed: expected six numbers, found {count}");
		}
		Ok(Self {
			scale_x: values[0],
			rot_y: values[1],
			rot_x: values[2],
			scale_y: values[3],
			translate_x: values[4],
			translate_y: values[5],
		})
	}
}

impl fmt::Display for WorldFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.scale_x)?;
		writeln!(f, "{}", self.rot_y)?;
		writeln!(f, "{}", self.rot_x)?;
		writeln!(f, "{}", self.scale_y)?;
		writeln!(f, "{}", self.translate_x)?;
		writeln!(f, "{}", self.translate_y)
	}
}
