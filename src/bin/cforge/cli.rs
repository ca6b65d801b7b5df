use std::path::PathBuf;

use clap::{Args, Parser};

use conf_forge::pipeline::config::DEFAULT_SEED;

#[derive(Parser)]
#[command(
    name = "cforge",
    about = "Small-molecule conformer ensemble generation",
    version,
    author,
    before_help = crate::display::banner_for_help()
)]
pub struct Cli {
    /// Input SDF file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output SDF file (default: input stem + "_conf.sdf")
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print run details (paths, counts, formula) to stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub generation: GenerationOptions,
}

/// Knobs controlling the conformer pipeline itself.
#[derive(Args)]
#[command(next_help_heading = "Generation")]
pub struct GenerationOptions {
    /// Number of conformers to embed
    #[arg(
        short = 'n',
        long = "num-confs",
        value_name = "N",
        default_value_t = 100
    )]
    pub num_conformers: usize,

    /// Iteration cap for each force-field optimization
    #[arg(long = "max-iter", value_name = "N", default_value_t = 200)]
    pub max_iterations: usize,

    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long = "threads", value_name = "N", default_value_t = 0)]
    pub threads: usize,

    /// Base random seed for reproducible embedding
    #[arg(long, value_name = "SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

pub fn parse() -> Cli {
    Cli::parse()
}
