//! Content bounding-box detection.
//!
//! Finds the tightest axis-aligned rectangle enclosing every pixel darker
//! than a brightness threshold. Operates purely on decoded pixel data, so
//! the PDF and raster-image front ends share a single code path.

use image::DynamicImage;

use super::CropOptions;

/// Inclusive pixel-space bounding box of detected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRect {
    /// Horizontal extent as `max − min` (inclusive bounds).
    pub fn span_x(&self) -> u32 {
        self.max_x - self.min_x
    }

    /// Vertical extent as `max − min` (inclusive bounds).
    pub fn span_y(&self) -> u32 {
        self.max_y - self.min_y
    }
}

/// Detect the content bounding box of a pixel buffer.
///
/// A pixel counts as content when its luminance falls below
/// `options.threshold`. Luminance is the mean of the first three channels
/// for color buffers and the raw sample for grayscale; alpha is ignored.
/// Returns `None` for a blank buffer, or when the detected box spans no
/// more than `options.min_content_size` pixels in either dimension and is
/// therefore treated as scanner noise or anti-aliasing specks.
pub fn detect(buffer: &DynamicImage, options: &CropOptions) -> Option<PixelRect> {
    let bbox = match buffer {
        DynamicImage::ImageLuma8(gray) => scan_gray(gray.as_raw(), gray.width(), options.threshold),
        DynamicImage::ImageRgb8(rgb) => scan_color(rgb.as_raw(), rgb.width(), 3, options.threshold),
        DynamicImage::ImageRgba8(rgba) => {
            scan_color(rgba.as_raw(), rgba.width(), 4, options.threshold)
        }
        other => {
            let rgb = other.to_rgb8();
            scan_color(rgb.as_raw(), rgb.width(), 3, options.threshold)
        }
    }?;

    if bbox.span_x() <= options.min_content_size || bbox.span_y() <= options.min_content_size {
        return None;
    }

    Some(bbox)
}

fn grow(bounds: &mut Option<PixelRect>, x: u32, y: u32) {
    match bounds {
        None => {
            *bounds = Some(PixelRect {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            })
        }
        Some(b) => {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
    }
}

fn scan_gray(samples: &[u8], width: u32, threshold: u8) -> Option<PixelRect> {
    let mut bounds = None;
    for (y, row) in samples.chunks_exact(width as usize).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            if value < threshold {
                grow(&mut bounds, x as u32, y as u32);
            }
        }
    }
    bounds
}

fn scan_color(samples: &[u8], width: u32, channels: usize, threshold: u8) -> Option<PixelRect> {
    // mean(r,g,b) < threshold, kept in integer form
    let limit = 3 * u16::from(threshold);
    let mut bounds = None;
    let row_len = width as usize * channels;
    for (y, row) in samples.chunks_exact(row_len).enumerate() {
        for (x, px) in row.chunks_exact(channels).enumerate() {
            let sum = u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2]);
            if sum < limit {
                grow(&mut bounds, x as u32, y as u32);
            }
        }
    }
    bounds
}
