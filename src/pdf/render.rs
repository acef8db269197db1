//! PDF page rasterization via Poppler.
//!
//! Pages are rendered with `pdftoppm` at a fixed oversampling factor above
//! the 72 DPI page grid, giving the detector sub-point edge precision. The
//! [`PageRenderer`] trait is the seam that lets the document pipeline run
//! against a stub in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Oversampling factor relative to the page's native 72 DPI grid.
const OVERSAMPLE_FACTOR: u32 = 3;

/// PDF user-space resolution in dots per inch.
const BASE_DPI: u32 = 72;

// ============================================================
// Error Types
// ============================================================

/// Page rasterization error types.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdftoppm not found in PATH (install poppler-utils)")]
    ToolNotFound,

    #[error("pdftoppm failed on page {page}: {stderr}")]
    Rasterize { page: u32, stderr: String },

    #[error("failed to decode rasterized page {page}: {message}")]
    Decode { page: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================
// Renderer
// ============================================================

/// Renders single PDF pages to pixel buffers.
pub trait PageRenderer: Send + Sync {
    /// Render one page (1-based) at the oversampled resolution.
    fn render_page(&self, pdf: &Path, page_number: u32) -> Result<DynamicImage>;
}

/// [`PageRenderer`] backed by Poppler's `pdftoppm`.
pub struct PopplerRenderer {
    tool: PathBuf,
}

impl PopplerRenderer {
    /// Locate `pdftoppm` in the PATH.
    pub fn locate() -> Result<Self> {
        let tool = which::which("pdftoppm").map_err(|_| RenderError::ToolNotFound)?;
        Ok(Self { tool })
    }

    /// Rendering resolution in DPI.
    pub fn dpi() -> u32 {
        BASE_DPI * OVERSAMPLE_FACTOR
    }
}

impl PageRenderer for PopplerRenderer {
    fn render_page(&self, pdf: &Path, page_number: u32) -> Result<DynamicImage> {
        let dir = tempfile::tempdir()?;
        let prefix = dir.path().join("page");

        let page_arg = page_number.to_string();
        let output = Command::new(&self.tool)
            .arg("-png")
            .arg("-r")
            .arg(Self::dpi().to_string())
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            return Err(RenderError::Rasterize {
                page: page_number,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        image::open(prefix.with_extension("png")).map_err(|e| RenderError::Decode {
            page: page_number,
            message: e.to_string(),
        })
    }
}
