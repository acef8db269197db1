//! Crop-geometry correction.
//!
//! Turns a raw detected rectangle into the final crop rectangle: guards
//! against degenerate detections, applies the user's margins, and clips to
//! the page. All math happens in page units with a top-down y axis; the
//! PDF applier performs the flip into PDF user space itself.

use serde::{Deserialize, Serialize};

use super::PixelRect;

// ============================================================
// Constants
// ============================================================

/// Fraction of a page dimension below which a detection is considered
/// unreliable and the full page is kept instead.
const MIN_COVERAGE: f64 = 0.10;

/// Fraction of a page dimension above which a detection counts as
/// effectively full-page.
const MAX_COVERAGE: f64 = 0.98;

/// Inset per side when a near-full-page detection is replaced by a
/// nominal crop.
const FORCED_INSET: f64 = 0.02;

/// Tolerance when comparing a rectangle against the exact page bounds.
const COVERAGE_EPSILON: f64 = 1e-6;

// ============================================================
// Types
// ============================================================

/// Axis-aligned rectangle in page units, exclusive upper bounds,
/// top-down y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: width,
            y1: height,
        }
    }

    /// Convert an inclusive pixel-space box to page units.
    ///
    /// The exclusive upper edges are `max + 1` in pixel space; each
    /// coordinate is then scaled by `page_dim / pixel_dim` per axis.
    pub fn from_pixels(px: PixelRect, pixel_size: (u32, u32), page_size: (f64, f64)) -> Self {
        let sx = page_size.0 / f64::from(pixel_size.0);
        let sy = page_size.1 / f64::from(pixel_size.1);
        Self {
            x0: f64::from(px.min_x) * sx,
            y0: f64::from(px.min_y) * sy,
            x1: f64::from(px.max_x + 1) * sx,
            y1: f64::from(px.max_y + 1) * sy,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Intersection with `other`.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Whether `other` lies fully inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    fn approx_eq(&self, other: &Rect) -> bool {
        (self.x0 - other.x0).abs() < COVERAGE_EPSILON
            && (self.y0 - other.y0).abs() < COVERAGE_EPSILON
            && (self.x1 - other.x1).abs() < COVERAGE_EPSILON
            && (self.y1 - other.y1).abs() < COVERAGE_EPSILON
    }
}

/// Per-side crop margins in page units, kept in user configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margins {
    /// Largest accepted value per side.
    pub const MAX: u32 = 50;

    /// Same margin on every side.
    pub fn uniform(value: u32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// Whether every side is within [0, `Margins::MAX`].
    pub fn in_range(&self) -> bool {
        self.left <= Self::MAX
            && self.top <= Self::MAX
            && self.right <= Self::MAX
            && self.bottom <= Self::MAX
    }
}

/// Outcome of geometry correction, consumed by the crop appliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropOutcome {
    /// Write a page/image cut to the given rectangle.
    Cropped(Rect),
    /// Pass the original through unmodified.
    Unchanged,
}

// ============================================================
// Correction
// ============================================================

/// Apply degenerate-detection policy and margins to a raw content
/// rectangle, producing the final crop rectangle clipped to `page`.
///
/// A missing rectangle (blank page) and a rectangle that already covers
/// the page exactly both come back as [`CropOutcome::Unchanged`]; the
/// latter is what makes cropping idempotent. An implausibly small
/// detection keeps the full page, an implausibly large one is forced to
/// a nominal inset so the user still sees a visible crop.
pub fn correct(rect: Option<Rect>, page: Rect, margins: &Margins) -> CropOutcome {
    let Some(detected) = rect else {
        return CropOutcome::Unchanged;
    };

    let mut rect = detected;

    if rect.width() < MIN_COVERAGE * page.width() || rect.height() < MIN_COVERAGE * page.height() {
        // implausibly small: detection is likely a stray speck
        rect = page;
    } else if rect.approx_eq(&page) {
        return CropOutcome::Unchanged;
    } else if rect.width() > MAX_COVERAGE * page.width()
        || rect.height() > MAX_COVERAGE * page.height()
    {
        let inset_x = FORCED_INSET * page.width();
        let inset_y = FORCED_INSET * page.height();
        rect = Rect {
            x0: page.x0 + inset_x,
            y0: page.y0 + inset_y,
            x1: page.x1 - inset_x,
            y1: page.y1 - inset_y,
        };
    }

    let expanded = Rect {
        x0: rect.x0 - f64::from(margins.left),
        y0: rect.y0 - f64::from(margins.top),
        x1: rect.x1 + f64::from(margins.right),
        y1: rect.y1 + f64::from(margins.bottom),
    };

    CropOutcome::Cropped(expanded.intersect(&page))
}
