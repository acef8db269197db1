//! PDF document cropping.
//!
//! A document is rebuilt page-by-page: each page is rasterized, the
//! content box detected in pixel space, converted to page units, corrected,
//! and the page's MediaBox/CropBox rewritten to the final rectangle. A page
//! whose boxes equal the crop rectangle displays at exactly that size with
//! the original content clipped to it at 1:1 scale, so no content stream is
//! touched. Pages that cannot be processed keep their original size; a
//! single bad page never fails the document.

mod render;

pub use render::{PageRenderer, PopplerRenderer, RenderError};

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::crop::{correct, detect, CropOptions, CropOutcome, Margins, Rect};

// ============================================================
// Error Types
// ============================================================

/// PDF cropping error types.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to load PDF: {0}")]
    Load(#[from] lopdf::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("page {page}: {message}")]
    Page { page: u32, message: String },
}

pub type Result<T> = std::result::Result<T, PdfError>;

// ============================================================
// Types
// ============================================================

/// Summary of one cropped document.
#[derive(Debug, Clone, Copy)]
pub struct PdfCropReport {
    /// Total pages in the document.
    pub page_count: usize,
    /// Pages whose boxes were rewritten.
    pub cropped_pages: usize,
}

// ============================================================
// Cropper
// ============================================================

/// Crops every page of a PDF document to its detected content region.
pub struct PdfCropper<'a> {
    renderer: &'a dyn PageRenderer,
    options: CropOptions,
    margins: Margins,
}

impl<'a> PdfCropper<'a> {
    pub fn new(renderer: &'a dyn PageRenderer, options: CropOptions, margins: Margins) -> Self {
        Self {
            renderer,
            options,
            margins,
        }
    }

    /// Load `input` and crop each page in order.
    ///
    /// Returns the modified in-memory document together with a report.
    /// Per-page failures are logged and leave that page at full size.
    pub fn crop_document(&self, input: &Path) -> Result<(Document, PdfCropReport)> {
        let mut doc = Document::load(input)?;
        let pages = doc.get_pages();

        let mut cropped_pages = 0;
        for (&page_number, &page_id) in &pages {
            match self.crop_page(&mut doc, input, page_number, page_id) {
                Ok(true) => cropped_pages += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(page = page_number, error = %e, "page left at full size");
                }
            }
        }

        Ok((
            doc,
            PdfCropReport {
                page_count: pages.len(),
                cropped_pages,
            },
        ))
    }

    /// Crop a single page. Returns whether its boxes were rewritten.
    fn crop_page(
        &self,
        doc: &mut Document,
        input: &Path,
        page_number: u32,
        page_id: ObjectId,
    ) -> Result<bool> {
        let mb = media_box(doc, page_id).ok_or_else(|| PdfError::Page {
            page: page_number,
            message: "missing or invalid MediaBox".to_string(),
        })?;

        let (page_w, page_h) = (mb[2] - mb[0], mb[3] - mb[1]);
        if page_w <= 0.0 || page_h <= 0.0 {
            return Err(PdfError::Page {
                page: page_number,
                message: "degenerate page size".to_string(),
            });
        }

        if rotation(doc, page_id) % 180 != 0 {
            // pixel and page axes disagree on rotated pages
            warn!(page = page_number, "rotated page skipped");
            return Ok(false);
        }

        let buffer = self.renderer.render_page(input, page_number)?;
        let detected = detect(&buffer, &self.options).map(|px| {
            Rect::from_pixels(px, (buffer.width(), buffer.height()), (page_w, page_h))
        });

        match correct(detected, Rect::from_size(page_w, page_h), &self.margins) {
            CropOutcome::Unchanged => Ok(false),
            CropOutcome::Cropped(r) => {
                debug!(
                    page = page_number,
                    x0 = r.x0,
                    y0 = r.y0,
                    x1 = r.x1,
                    y1 = r.y1,
                    "cropping page"
                );
                // flip the top-down rectangle into PDF user space
                let bbox = [mb[0] + r.x0, mb[3] - r.y1, mb[0] + r.x1, mb[3] - r.y0];
                if set_page_boxes(doc, page_id, bbox) {
                    Ok(true)
                } else {
                    Err(PdfError::Page {
                        page: page_number,
                        message: "page object is not a dictionary".to_string(),
                    })
                }
            }
        }
    }
}

// ============================================================
// Page-tree helpers
// ============================================================

/// Follow a reference to its target object, if any.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up an inheritable page attribute, walking the Parent chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut id = page_id;
    // depth cap guards against cyclic page trees
    for _ in 0..32 {
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => id = *parent,
            _ => return None,
        }
    }
    None
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Resolve the page's MediaBox, normalized so `x0 < x1` and `y0 < y1`.
fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    let arr = inherited(doc, page_id, b"MediaBox")?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let v: Vec<f64> = arr
        .iter()
        .map(|o| number(resolve(doc, o)))
        .collect::<Option<_>>()?;
    Some([
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ])
}

/// Resolve the page's rotation, normalized to [0, 360).
fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(number)
        .map(|r| (r as i64).rem_euclid(360))
        .unwrap_or(0)
}

/// Rewrite MediaBox and CropBox on the page dictionary.
fn set_page_boxes(doc: &mut Document, page_id: ObjectId, bbox: [f64; 4]) -> bool {
    let values: Vec<Object> = bbox.iter().map(|&v| Object::Real(v as f32)).collect();
    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => {
            dict.set("MediaBox", Object::Array(values.clone()));
            dict.set("CropBox", Object::Array(values));
            true
        }
        _ => false,
    }
}
