use anyhow::Result;
use itertools::Itertools;
use orthoweave_core::resolve_mosaic;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory containing world files, rasters and optional validity masks
	#[arg()]
	input_directory: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mosaic = resolve_mosaic(&arguments.input_directory)?;

	println!(
		"canvas: {}x{} px, pixel scale ({}, {})",
		mosaic.canvas_width, mosaic.canvas_height, mosaic.pixel_scale.0, mosaic.pixel_scale.1
	);
	println!(
		"{}",
		mosaic
			.tiles
			.iter()
			.map(|tile| {
				format!(
					"{}: ({}, {}) {}x{} px{}",
					tile.name,
					tile.x,
					tile.y,
					tile.width,
					tile.height,
					if tile.validity_mask_path.is_some() {
						", validity mask"
					} else {
						""
					}
				)
			})
			.join("\n")
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use anyhow::Result;
	use assert_fs::{TempDir, prelude::*};
	use image::RgbImage;

	#[test]
	fn probe_resolves_the_layout() -> Result<()> {
		let dir = TempDir::new()?;
		for (name, x) in [("a", 3), ("b", 9)] {
			dir.child(format!("{name}.tfw")).write_str(&format!("1\n0\n0\n-1\n{x}\n0\n"))?;
			RgbImage::new(8, 4).save(dir.child(format!("{name}.tif")).path())?;
		}

		run_command(vec!["orthoweave", "probe", dir.path().to_str().unwrap()])?;
		Ok(())
	}

	#[test]
	fn probe_fails_on_an_empty_directory() -> Result<()> {
		let dir = TempDir::new()?;
		let err = run_command(vec!["orthoweave", "probe", dir.path().to_str().unwrap()])
			.unwrap_err()
			.to_string();
		assert!(err.starts_with("CanvasInvalid"), "unexpected error: {err}");
		Ok(())
	}
}
