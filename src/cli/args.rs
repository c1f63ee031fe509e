use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_FILE: &str = "STAR_mapping_summary.xlsx";

#[derive(Parser, Debug)]
#[command(
    name = "star-map-summary",
    version,
    about = "Parse STAR Log.final.out files, save a summary Excel file, and optionally plot mapping statistics."
)]
pub struct Cli {
    /// Directory containing STAR *_Log.final.out files to process.
    pub input_dir: PathBuf,

    /// Name of the Excel file to save the summary, written inside input_dir.
    #[arg(long = "output_file", default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Full path including filename to save the plot (.png, .svg or .pdf).
    #[arg(long = "plot_file")]
    pub plot_file: Option<PathBuf>,

    /// Display the plot in the default image viewer.
    #[arg(long = "show_plot", default_value_t = false)]
    pub show_plot: bool,
}
