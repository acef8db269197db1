//! Content detection and crop geometry.
//!
//! The shared core behind both input kinds: the detector finds the tight
//! bounding box of non-background pixels in a rasterized page or decoded
//! image, and the corrector turns that box into the final crop rectangle.
//! Both are pure functions of pixel data and coordinate metadata; only the
//! adapters in [`crate::pdf`] and [`crate::raster`] differ per input kind.
//!
//! # Example
//!
//! ```rust,no_run
//! use figcrop::{correct, detect, CropOptions, Margins, Rect};
//!
//! let img = image::open("figure.png").unwrap();
//! let options = CropOptions::default();
//! let page = Rect::from_size(f64::from(img.width()), f64::from(img.height()));
//!
//! let detected = detect(&img, &options).map(|px| {
//!     Rect::from_pixels(px, (img.width(), img.height()), (page.width(), page.height()))
//! });
//! let outcome = correct(detected, page, &Margins::uniform(5));
//! println!("{outcome:?}");
//! ```

mod detect;
mod geometry;

pub use detect::{detect, PixelRect};
pub use geometry::{correct, CropOutcome, Margins, Rect};

// ============================================================
// Constants
// ============================================================

/// Default brightness threshold; pixels darker than this are content.
const DEFAULT_THRESHOLD: u8 = 225;

/// Default minimum content span in pixels; smaller boxes are noise.
const DEFAULT_MIN_CONTENT_SIZE: u32 = 10;

// ============================================================
// Options
// ============================================================

/// Content detection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropOptions {
    /// Brightness threshold (0-255); luminance below it counts as content.
    pub threshold: u8,
    /// Minimum content span in pixels; detections at or below it are
    /// rejected as noise.
    pub min_content_size: u32,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_content_size: DEFAULT_MIN_CONTENT_SIZE,
        }
    }
}

impl CropOptions {
    /// Create a new options builder.
    pub fn builder() -> CropOptionsBuilder {
        CropOptionsBuilder::default()
    }
}

/// Builder for [`CropOptions`].
#[derive(Debug, Default)]
pub struct CropOptionsBuilder {
    options: CropOptions,
}

impl CropOptionsBuilder {
    /// Set the brightness threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Set the minimum content span in pixels.
    #[must_use]
    pub fn min_content_size(mut self, size: u32) -> Self {
        self.options.min_content_size = size;
        self
    }

    /// Build the options.
    #[must_use]
    pub fn build(self) -> CropOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CropOptions::default();
        assert_eq!(opts.threshold, 225);
        assert_eq!(opts.min_content_size, 10);
    }

    #[test]
    fn test_builder() {
        let opts = CropOptions::builder()
            .threshold(200)
            .min_content_size(4)
            .build();
        assert_eq!(opts.threshold, 200);
        assert_eq!(opts.min_content_size, 4);
    }
}
