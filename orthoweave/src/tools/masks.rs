use anyhow::Result;
use orthoweave::pipeline::generate_masks;
use orthoweave_core::resolve_mosaic;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory containing world files, rasters and optional validity masks
	#[arg()]
	input_directory: PathBuf,

	/// half-width of the Voronoi seam band in pixels
	#[arg(long, value_name = "px", default_value_t = 20.0)]
	overlap_margin: f64,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mut mosaic = resolve_mosaic(&arguments.input_directory)?;
	generate_masks(&mut mosaic.tiles, arguments.overlap_margin)?;
	log::info!("wrote {} voronoi masks", mosaic.tiles.len());
	Ok(())
}
