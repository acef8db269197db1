//! Batch processing.
//!
//! A batch is a set of independent, order-preserving single-file jobs.
//! Each job owns its buffers and rectangles; the only shared state is the
//! read-only settings. One corrupt or unreadable file reports its own
//! failure and the batch continues, so the caller always gets a full
//! success/failure accounting.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigError, Settings};
use crate::output::{self, OutputArtifact, WriteError};
use crate::pdf::{PageRenderer, PdfCropper, PdfError, RenderError};
use crate::progress::ProgressCallback;
use crate::raster::{ImageCropper, ImageError};

// ============================================================
// Constants
// ============================================================

/// File extensions accepted as raster images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif"];

// ============================================================
// Error Types
// ============================================================

/// Top-level crop error, one per failed job.
#[derive(Debug, Error)]
pub enum CropError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("unsupported file type: {0}")]
    Unsupported(PathBuf),
}

// ============================================================
// Types
// ============================================================

/// Kind of input a path holds, judged by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

/// Classify a path by extension; `None` for unsupported files.
pub fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == "pdf" {
        Some(InputKind::Pdf)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(InputKind::Image)
    } else {
        None
    }
}

/// What one finished job produced.
#[derive(Debug, Clone)]
pub enum JobDetail {
    Pdf {
        page_count: usize,
        cropped_pages: usize,
    },
    Image {
        original_size: (u32, u32),
        output_size: (u32, u32),
    },
}

/// Successful result of one job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub detail: JobDetail,
}

/// Per-job outcome, success or isolated failure.
#[derive(Debug)]
pub struct JobResult {
    pub input: PathBuf,
    pub outcome: Result<JobReport, CropError>,
}

/// All job results of a batch, in input order.
#[derive(Debug)]
pub struct BatchSummary {
    pub results: Vec<JobResult>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Iterate over the failures with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &CropError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.input.as_path(), e)))
    }
}

// ============================================================
// Input collection
// ============================================================

/// Expand the user's inputs into a flat, ordered job list.
///
/// Explicitly listed files are kept when their extension is supported
/// (a missing file fails later as its own job); directories are scanned
/// one level deep for supported files, sorted for determinism.
pub fn collect_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && input_kind(p).is_some())
                .collect();
            found.sort();
            inputs.extend(found);
        } else if input_kind(path).is_some() {
            inputs.push(path.clone());
        } else {
            warn!(path = %path.display(), "skipping unsupported file");
        }
    }
    Ok(inputs)
}

/// Pre-batch validation: settings plus destination collisions.
///
/// Runs before any job starts so a bad configuration never yields a
/// partial batch.
pub fn validate_batch(settings: &Settings, inputs: &[PathBuf]) -> Result<(), ConfigError> {
    settings.validate()?;
    let mut seen = HashSet::new();
    for input in inputs {
        let destination = settings.output_path(input);
        if !seen.insert(destination.clone()) {
            return Err(ConfigError::DuplicateDestination(destination));
        }
    }
    Ok(())
}

// ============================================================
// Jobs
// ============================================================

/// Crop one file and persist the result.
///
/// Dispatches on the input kind; `renderer` is only consulted for PDFs, so
/// image-only callers may pass `None`.
pub fn crop_file(
    input: &Path,
    settings: &Settings,
    renderer: Option<&dyn PageRenderer>,
) -> Result<JobReport, CropError> {
    let destination = settings.output_path(input);

    match input_kind(input) {
        Some(InputKind::Pdf) => {
            let renderer = renderer.ok_or(PdfError::Render(RenderError::ToolNotFound))?;
            let cropper = PdfCropper::new(renderer, settings.crop_options(), settings.margins);
            let (doc, report) = cropper.crop_document(input)?;
            output::write_artifact(OutputArtifact::Pdf(doc), input, &destination)?;
            Ok(JobReport {
                input: input.to_path_buf(),
                output: destination,
                detail: JobDetail::Pdf {
                    page_count: report.page_count,
                    cropped_pages: report.cropped_pages,
                },
            })
        }
        Some(InputKind::Image) => {
            let cropper = ImageCropper::new(settings.crop_options(), settings.margins);
            let (image, report) = cropper.crop_image(input)?;
            // an in-place run with nothing to trim leaves the file alone
            // instead of re-encoding it
            let unchanged = report.output_size == report.original_size;
            if !(unchanged && destination == input) {
                let format = output::format_for_path(&destination);
                output::write_artifact(
                    OutputArtifact::Image { image, format },
                    input,
                    &destination,
                )?;
            }
            Ok(JobReport {
                input: input.to_path_buf(),
                output: destination,
                detail: JobDetail::Image {
                    original_size: report.original_size,
                    output_size: report.output_size,
                },
            })
        }
        None => Err(CropError::Unsupported(input.to_path_buf())),
    }
}

/// Run every job, sequentially or on a thread pool, preserving input
/// order in the summary. Progress events are funneled through the single
/// `progress` callback.
pub fn run_batch(
    inputs: &[PathBuf],
    settings: &Settings,
    renderer: Option<&dyn PageRenderer>,
    threads: usize,
    progress: &dyn ProgressCallback,
) -> BatchSummary {
    let total = inputs.len();
    let run = |(index, input): (usize, &PathBuf)| -> JobResult {
        progress.on_file_start(index + 1, total, input);
        let outcome = crop_file(input, settings, renderer);
        progress.on_file_done(input, outcome.is_ok());
        JobResult {
            input: input.clone(),
            outcome,
        }
    };

    let results = if threads <= 1 {
        inputs.iter().enumerate().map(run).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| inputs.par_iter().enumerate().map(run).collect()),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, running sequentially");
                inputs.iter().enumerate().map(run).collect()
            }
        }
    };

    BatchSummary { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use image::{DynamicImage, Rgb, RgbImage};

    fn write_figure(path: &Path) {
        let mut img = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        for y in 100..200 {
            for x in 100..200 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    fn settings_for(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.overwrite_original = false;
        settings.output_dir = Some(dir.to_path_buf());
        settings
    }

    #[test]
    fn test_input_kind_by_extension() {
        assert_eq!(input_kind(Path::new("a.pdf")), Some(InputKind::Pdf));
        assert_eq!(input_kind(Path::new("a.PDF")), Some(InputKind::Pdf));
        assert_eq!(input_kind(Path::new("a.jpeg")), Some(InputKind::Image));
        assert_eq!(input_kind(Path::new("a.gif")), Some(InputKind::Image));
        assert_eq!(input_kind(Path::new("a.docx")), None);
        assert_eq!(input_kind(Path::new("noext")), None);
    }

    #[test]
    fn test_collect_inputs_scans_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_figure(&dir.path().join("b.png"));
        write_figure(&dir.path().join("a.png"));
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(inputs.len(), 2);
        // sorted for determinism
        assert!(inputs[0].ends_with("a.png"));
        assert!(inputs[1].ends_with("b.png"));
    }

    #[test]
    fn test_validate_batch_rejects_duplicate_destinations() {
        let out = tempfile::tempdir().unwrap();
        let settings = settings_for(out.path());

        let inputs = vec![PathBuf::from("/a/fig.png"), PathBuf::from("/b/fig.png")];
        assert!(matches!(
            validate_batch(&settings, &inputs),
            Err(ConfigError::DuplicateDestination(_))
        ));
    }

    #[test]
    fn test_batch_isolates_per_file_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.png");
        write_figure(&good);
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let inputs = vec![good.clone(), bad.clone()];
        let settings = settings_for(out.path());
        let summary = run_batch(&inputs, &settings, None, 1, &SilentProgress);

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        // input order preserved
        assert_eq!(summary.results[0].input, good);
        assert_eq!(summary.results[1].input, bad);
        assert!(out.path().join("good_cropped.png").exists());

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, bad.as_path());
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let inputs: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = dir.path().join(format!("fig_{i}.png"));
                write_figure(&path);
                path
            })
            .collect();

        let settings = settings_for(out.path());
        let summary = run_batch(&inputs, &settings, None, 2, &SilentProgress);

        assert_eq!(summary.succeeded(), 4);
        for (i, result) in summary.results.iter().enumerate() {
            assert!(result.input.ends_with(format!("fig_{i}.png")));
        }
    }

    #[test]
    fn test_crop_file_writes_cropped_image() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let input = dir.path().join("figure.png");
        write_figure(&input);

        let settings = settings_for(out.path());
        let report = crop_file(&input, &settings, None).unwrap();

        match report.detail {
            JobDetail::Image {
                original_size,
                output_size,
            } => {
                assert_eq!(original_size, (300, 300));
                assert_eq!(output_size, (100, 100));
            }
            JobDetail::Pdf { .. } => panic!("expected image detail"),
        }
        let back = image::open(&report.output).unwrap();
        assert_eq!((back.width(), back.height()), (100, 100));
    }

    #[test]
    fn test_pdf_without_renderer_fails_cleanly() {
        let settings = Settings::default();
        let result = crop_file(Path::new("document.pdf"), &settings, None);
        assert!(matches!(result, Err(CropError::Pdf(_))));
    }

    #[test]
    fn test_in_place_unchanged_image_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blank.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 300, Rgb([255, 255, 255])))
            .save(&input)
            .unwrap();
        let before = std::fs::read(&input).unwrap();

        let settings = Settings::default();
        let report = crop_file(&input, &settings, None).unwrap();

        assert_eq!(std::fs::read(&input).unwrap(), before);
        match report.detail {
            JobDetail::Image {
                original_size,
                output_size,
            } => assert_eq!(original_size, output_size),
            JobDetail::Pdf { .. } => panic!("expected image detail"),
        }
    }

    #[test]
    fn test_unsupported_input_rejected() {
        let settings = Settings::default();
        let result = crop_file(Path::new("notes.txt"), &settings, None);
        assert!(matches!(result, Err(CropError::Unsupported(_))));
    }

    #[test]
    fn test_in_place_batch_overwrites_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("figure.png");
        write_figure(&input);

        let settings = Settings::default();
        assert!(settings.overwrite_original);
        let summary = run_batch(
            &[input.clone()],
            &settings,
            None,
            1,
            &SilentProgress,
        );

        assert_eq!(summary.succeeded(), 1);
        let back = image::open(&input).unwrap();
        assert_eq!((back.width(), back.height()), (100, 100));
    }
}
