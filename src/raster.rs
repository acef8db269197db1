//! Raster-image cropping.
//!
//! The image-file counterpart of [`crate::pdf`]: decode, detect, correct,
//! then slice the decoded buffer. Pixel space and output space coincide
//! here, so no coordinate conversion is involved.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use crate::crop::{correct, detect, CropOptions, CropOutcome, Margins, Rect};

// ============================================================
// Error Types
// ============================================================

/// Image cropping error types.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to decode image: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ImageError>;

// ============================================================
// Types
// ============================================================

/// Summary of one cropped image.
#[derive(Debug, Clone, Copy)]
pub struct ImageCropReport {
    pub original_size: (u32, u32),
    pub output_size: (u32, u32),
}

// ============================================================
// Cropper
// ============================================================

/// Crops a decoded image to its detected content region.
pub struct ImageCropper {
    options: CropOptions,
    margins: Margins,
}

impl ImageCropper {
    pub fn new(options: CropOptions, margins: Margins) -> Self {
        Self { options, margins }
    }

    /// Decode `input` and crop it.
    pub fn crop_image(&self, input: &Path) -> Result<(DynamicImage, ImageCropReport)> {
        if !input.exists() {
            return Err(ImageError::NotFound(input.to_path_buf()));
        }
        let img = image::open(input).map_err(|e| ImageError::Decode(e.to_string()))?;

        let original_size = (img.width(), img.height());
        let (out, outcome) = self.crop_buffer(img);
        debug!(path = %input.display(), ?outcome, "image processed");

        let report = ImageCropReport {
            original_size,
            output_size: (out.width(), out.height()),
        };
        Ok((out, report))
    }

    /// Crop an already-decoded buffer, returning the result and the
    /// geometry decision it was based on.
    ///
    /// Backgrounds are judged on brightness alone, so the buffer is
    /// normalized to RGB first; the output is always an RGB image.
    pub fn crop_buffer(&self, image: DynamicImage) -> (DynamicImage, CropOutcome) {
        let rgb = match image {
            DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        let (w, h) = (rgb.width(), rgb.height());
        let page = Rect::from_size(f64::from(w), f64::from(h));
        let detected = detect(&rgb, &self.options)
            .map(|px| Rect::from_pixels(px, (w, h), (page.width(), page.height())));

        let outcome = correct(detected, page, &self.margins);
        match outcome {
            CropOutcome::Unchanged => (rgb, outcome),
            CropOutcome::Cropped(r) => {
                let x0 = r.x0.round().max(0.0) as u32;
                let y0 = r.y0.round().max(0.0) as u32;
                let x1 = (r.x1.round() as u32).min(w);
                let y1 = (r.y1.round() as u32).min(h);
                (rgb.crop_imm(x0, y0, x1 - x0, y1 - y0), outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn canvas_with_block(
        size: (u32, u32),
        block_origin: (u32, u32),
        block_side: u32,
    ) -> DynamicImage {
        let mut img = RgbImage::from_pixel(size.0, size.1, Rgb([255, 255, 255]));
        for y in block_origin.1..block_origin.1 + block_side {
            for x in block_origin.0..block_origin.0 + block_side {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_offset_square_crops_exactly() {
        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let img = canvas_with_block((1000, 1000), (400, 400), 200);

        let (out, outcome) = cropper.crop_buffer(img);
        assert_eq!((out.width(), out.height()), (200, 200));
        match outcome {
            CropOutcome::Cropped(r) => assert_eq!(r, Rect::new(400.0, 400.0, 600.0, 600.0)),
            CropOutcome::Unchanged => panic!("expected a crop"),
        }
        // every output pixel came from the block
        let rgb = out.to_rgb8();
        assert!(rgb.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_blank_image_passes_through() {
        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 300, Rgb([255, 255, 255])));

        let (out, outcome) = cropper.crop_buffer(img);
        assert_eq!(outcome, CropOutcome::Unchanged);
        assert_eq!((out.width(), out.height()), (300, 300));
    }

    #[test]
    fn test_recrop_is_noop() {
        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let img = canvas_with_block((800, 800), (100, 100), 400);

        let (first, _) = cropper.crop_buffer(img);
        assert_eq!((first.width(), first.height()), (400, 400));

        let (second, outcome) = cropper.crop_buffer(first.clone());
        assert_eq!(outcome, CropOutcome::Unchanged);
        assert_eq!((second.width(), second.height()), (400, 400));
    }

    #[test]
    fn test_margins_kept_around_content() {
        let cropper = ImageCropper::new(CropOptions::default(), Margins::uniform(10));
        let img = canvas_with_block((500, 500), (200, 200), 100);

        let (out, _) = cropper.crop_buffer(img);
        assert_eq!((out.width(), out.height()), (120, 120));
        let rgb = out.to_rgb8();
        // corners are background, center is content
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(60, 60).0, [0, 0, 0]);
    }

    #[test]
    fn test_missing_file_error() {
        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let result = cropper.crop_image(Path::new("/nonexistent/figure.png"));
        assert!(matches!(result, Err(ImageError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let result = cropper.crop_image(&path);
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_crop_image_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.png");
        canvas_with_block((400, 400), (100, 100), 150)
            .save(&path)
            .unwrap();

        let cropper = ImageCropper::new(CropOptions::default(), Margins::default());
        let (out, report) = cropper.crop_image(&path).unwrap();
        assert_eq!(report.original_size, (400, 400));
        assert_eq!(report.output_size, (150, 150));
        assert_eq!((out.width(), out.height()), (150, 150));
    }
}
