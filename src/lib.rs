//! figcrop - batch whitespace cropper for academic figures
//!
//! Detects the non-background content region of PDF pages and raster
//! images and produces cropped output with optional per-side margins.
//! The detection and geometry core is shared between both input kinds;
//! the PDF and image paths only differ in their adapters.
//!
//! # Example
//!
//! ```rust,no_run
//! use figcrop::{crop_file, Settings};
//! use std::path::Path;
//!
//! let settings = Settings::default();
//! let report = crop_file(Path::new("figure.png"), &settings, None).unwrap();
//! println!("wrote {}", report.output.display());
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod crop;
pub mod output;
pub mod pdf;
pub mod progress;
pub mod raster;

// Re-export public API
pub use batch::{
    collect_inputs, crop_file, input_kind, run_batch, validate_batch, BatchSummary, CropError,
    InputKind, JobDetail, JobReport, JobResult, IMAGE_EXTENSIONS,
};
pub use cli::{Cli, Commands, CropArgs};
pub use config::{CliOverrides, ConfigError, Settings};
pub use crop::{correct, detect, CropOptions, CropOptionsBuilder, CropOutcome, Margins, PixelRect, Rect};
pub use output::{format_for_path, write_artifact, OutputArtifact, WriteError};
pub use pdf::{PageRenderer, PdfCropReport, PdfCropper, PdfError, PopplerRenderer, RenderError};
pub use progress::{ConsoleProgress, OutputMode, ProgressCallback, SilentProgress};
pub use raster::{ImageCropReport, ImageCropper, ImageError};

/// Process exit codes used by the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
}
