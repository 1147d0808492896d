use anyhow::Result;
use orthoweave::pipeline::{BlendParameters, run_pipeline};
use orthoweave_image::blend::WeightType;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory containing world files, rasters and optional validity masks
	#[arg()]
	input_directory: PathBuf,

	/// path of the composite to write (*.tif or *.png)
	#[arg()]
	output_file: PathBuf,

	/// number of pyramid bands; 0 blends directly without pyramids
	#[arg(long, value_name = "int", default_value_t = 14, display_order = 1)]
	num_bands: u32,

	/// distance in pixels over which weight masks ramp up from invalid pixels and tile borders
	#[arg(long, value_name = "px", default_value_t = 512.0, display_order = 1)]
	feather_radius: f64,

	/// half-width of the Voronoi seam band in pixels
	#[arg(long, value_name = "px", default_value_t = 20.0, display_order = 1)]
	overlap_margin: f64,

	/// disable Voronoi masks and blend with the weight masks only
	#[arg(long, display_order = 2)]
	no_voronoi: bool,

	/// numeric type of the weight accumulators: float32 or int16
	#[arg(long, value_name = "type", default_value = "float32", display_order = 2)]
	weight_type: String,

	/// write per-tile weight/blend masks next to the composite
	#[arg(long, display_order = 3)]
	debug: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	log::info!(
		"blending {} into {}",
		arguments.input_directory.display(),
		arguments.output_file.display()
	);

	let parameters = BlendParameters {
		num_bands: arguments.num_bands,
		feather_radius: arguments.feather_radius,
		overlap_margin: arguments.overlap_margin,
		use_voronoi: !arguments.no_voronoi,
		weight_type: WeightType::try_from(arguments.weight_type.as_str())?,
		debug: arguments.debug,
	};
	run_pipeline(&arguments.input_directory, &arguments.output_file, &parameters)
}
