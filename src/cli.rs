//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::crop::Margins;

/// Crop surrounding whitespace from PDF pages and images.
#[derive(Debug, Parser)]
#[command(name = "figcrop", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crop whitespace from PDF and image files
    Crop(CropArgs),
    /// Show environment and configuration information
    Info,
}

/// Arguments for the `crop` subcommand.
#[derive(Debug, Args)]
pub struct CropArgs {
    /// Input files or directories (PDF, jpg, jpeg, png, bmp, tiff, tif, gif)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Overwrite the input files in place
    #[arg(long, conflicts_with = "output_dir")]
    pub in_place: bool,

    /// Write "<name>_cropped" files into this directory instead
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Margin kept on every side of the detected content (page units)
    #[arg(long, value_name = "N", value_parser = margin_value)]
    pub margin: Option<u32>,

    /// Left margin, overrides --margin
    #[arg(long, value_name = "N", value_parser = margin_value)]
    pub margin_left: Option<u32>,

    /// Top margin, overrides --margin
    #[arg(long, value_name = "N", value_parser = margin_value)]
    pub margin_top: Option<u32>,

    /// Right margin, overrides --margin
    #[arg(long, value_name = "N", value_parser = margin_value)]
    pub margin_right: Option<u32>,

    /// Bottom margin, overrides --margin
    #[arg(long, value_name = "N", value_parser = margin_value)]
    pub margin_bottom: Option<u32>,

    /// Brightness threshold; pixels darker than this count as content
    #[arg(long, value_name = "0-255")]
    pub threshold: Option<u8>,

    /// Minimum content span in pixels; smaller detections are noise
    #[arg(long, value_name = "PX")]
    pub min_size: Option<u32>,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Settings file to load instead of the default locations
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Persist the effective settings to the user config file
    #[arg(long)]
    pub save_config: bool,

    /// List files and settings without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output and the summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn margin_value(s: &str) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if value > Margins::MAX {
        return Err(format!("margin must be between 0 and {}", Margins::MAX));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_crop_command() {
        let cli = Cli::try_parse_from([
            "figcrop",
            "crop",
            "figure.pdf",
            "--output-dir",
            "/tmp/out",
            "--margin",
            "5",
            "--margin-left",
            "10",
            "-j",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Crop(args) => {
                assert_eq!(args.inputs, vec![PathBuf::from("figure.pdf")]);
                assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
                assert_eq!(args.margin, Some(5));
                assert_eq!(args.margin_left, Some(10));
                assert_eq!(args.threads, Some(4));
                assert!(!args.in_place);
            }
            Commands::Info => panic!("expected crop command"),
        }
    }

    #[test]
    fn test_cli_rejects_margin_out_of_range() {
        let result = Cli::try_parse_from(["figcrop", "crop", "a.png", "--margin", "51"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_in_place_with_output_dir() {
        let result = Cli::try_parse_from([
            "figcrop",
            "crop",
            "a.png",
            "--in-place",
            "--output-dir",
            "/tmp",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_inputs() {
        let result = Cli::try_parse_from(["figcrop", "crop"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_info_command() {
        let cli = Cli::try_parse_from(["figcrop", "info"]).unwrap();
        assert!(matches!(cli.command, Commands::Info));
    }
}
