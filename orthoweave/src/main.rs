mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Blend a directory of georeferenced tiles into one composite
	Blend(tools::blend::Subcommand),

	/// Generate per-tile Voronoi ownership masks
	Masks(tools::masks::Subcommand),

	/// Show the resolved tile layout and canvas
	Probe(tools::probe::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Blend(arguments) => tools::blend::run(arguments),
		Commands::Masks(arguments) => tools::masks::run(arguments),
		Commands::Probe(arguments) => tools::probe::run(arguments),
	}
}
