//! Output persistence.
//!
//! Writes a finished crop artifact to disk. In-place overwrites never touch
//! the original directly: bytes go to a temp sibling first and replace the
//! source atomically only once the write has fully succeeded, so a failure
//! mid-write leaves the original file intact.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Output writing error types.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {message}")]
    Failed { path: PathBuf, message: String },

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WriteError>;

// ============================================================
// Types
// ============================================================

/// A finished crop result awaiting persistence.
pub enum OutputArtifact {
    /// A rebuilt PDF document.
    Pdf(lopdf::Document),
    /// A cropped (or passed-through) image and its target encoder.
    Image {
        image: DynamicImage,
        format: ImageFormat,
    },
}

// ============================================================
// Format selection
// ============================================================

/// Map a destination extension to the encoder used for image output.
/// Unknown extensions fall back to PNG.
pub fn format_for_path(path: &Path) -> ImageFormat {
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => ImageFormat::Jpeg,
        Some("tif" | "tiff") => ImageFormat::Tiff,
        Some("bmp") => ImageFormat::Bmp,
        Some("gif") => ImageFormat::Gif,
        _ => ImageFormat::Png,
    }
}

// ============================================================
// Writing
// ============================================================

/// Persist `artifact` at `destination`.
///
/// When the destination equals the source path (in-place overwrite) the
/// write is routed through [`replace_atomically`].
pub fn write_artifact(artifact: OutputArtifact, source: &Path, destination: &Path) -> Result<()> {
    if source == destination {
        replace_atomically(destination, |file| encode(artifact, file))
    } else {
        let file = File::create(destination).map_err(|e| WriteError::Failed {
            path: destination.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);
        encode(artifact, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Run `write_fn` against a temp sibling of `destination`, then atomically
/// rename it over `destination`. On any failure the temp file is discarded
/// and the destination is left byte-identical to before the call.
pub fn replace_atomically<F>(destination: &Path, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write_fn(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(destination).map_err(|e| WriteError::Io(e.error))?;
    Ok(())
}

fn encode<W: Write + Seek>(artifact: OutputArtifact, writer: &mut W) -> Result<()> {
    match artifact {
        OutputArtifact::Pdf(mut doc) => doc
            .save_to(writer)
            .map_err(|e| WriteError::Encode(e.to_string())),
        OutputArtifact::Image { image, format } => image
            .write_to(writer, format)
            .map_err(|e| WriteError::Encode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_format_mapping() {
        assert_eq!(format_for_path(Path::new("a.jpg")), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.JPEG")), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.tif")), ImageFormat::Tiff);
        assert_eq!(format_for_path(Path::new("a.tiff")), ImageFormat::Tiff);
        assert_eq!(format_for_path(Path::new("a.bmp")), ImageFormat::Bmp);
        assert_eq!(format_for_path(Path::new("a.gif")), ImageFormat::Gif);
        assert_eq!(format_for_path(Path::new("a.png")), ImageFormat::Png);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_png() {
        assert_eq!(format_for_path(Path::new("a.webp")), ImageFormat::Png);
        assert_eq!(format_for_path(Path::new("noext")), ImageFormat::Png);
    }

    #[test]
    fn test_failed_replace_leaves_original_intact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("original.png");
        let before = b"original bytes that must survive".to_vec();
        std::fs::write(&target, &before).unwrap();

        let result = replace_atomically(&target, |file| {
            // partial write, then the simulated disk error
            file.write_all(b"partial garbage").unwrap();
            Err(WriteError::Failed {
                path: target.clone(),
                message: "disk full".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), before);
        // no stray temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_successful_replace_swaps_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("original.txt");
        std::fs::write(&target, b"old").unwrap();

        replace_atomically(&target, |file| {
            file.write_all(b"new content")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new content");
    }

    #[test]
    fn test_write_image_artifact_to_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        let dest = dir.path().join("out.png");

        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([1, 2, 3])));
        write_artifact(
            OutputArtifact::Image {
                image,
                format: ImageFormat::Png,
            },
            &source,
            &dest,
        )
        .unwrap();

        let back = image::open(&dest).unwrap();
        assert_eq!((back.width(), back.height()), (20, 10));
    }

    #[test]
    fn test_in_place_image_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])))
            .save(&path)
            .unwrap();

        let cropped = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        write_artifact(
            OutputArtifact::Image {
                image: cropped,
                format: ImageFormat::Png,
            },
            &path,
            &path,
        )
        .unwrap();

        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn test_unwritable_destination_errors() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, Rgb([0, 0, 0])));
        let result = write_artifact(
            OutputArtifact::Image {
                image,
                format: ImageFormat::Png,
            },
            Path::new("in.png"),
            Path::new("/nonexistent-dir/out.png"),
        );
        assert!(matches!(result, Err(WriteError::Failed { .. })));
    }
}
