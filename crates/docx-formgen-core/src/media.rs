//! Image resource loading for embed operations.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};

use crate::error::{Error, Result};

/// EMU per inch, per OOXML drawing measurements.
const EMU_PER_INCH: f64 = 914_400.0;

/// An image payload probed for format and pixel size.
pub(crate) struct LoadedImage {
    pub bytes: Vec<u8>,
    pub ext: &'static str,
    pub content_type: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Extent in EMU for a target display width in inches, height scaled by
    /// the source aspect ratio.
    pub fn extent_emu(&self, width_in: f32) -> (u64, u64) {
        let cx = (f64::from(width_in) * EMU_PER_INCH).round() as u64;
        let w = self.width_px.max(1);
        let cy = (cx as f64 * f64::from(self.height_px) / f64::from(w)).round() as u64;
        (cx, cy)
    }
}

pub(crate) fn load_image(path: &Path) -> Result<LoadedImage> {
    let io_err = |source: std::io::Error| Error::Image {
        path: path.to_path_buf(),
        source: image::ImageError::IoError(source),
    };
    let bytes = fs::read(path).map_err(io_err)?;
    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(io_err)?;
    let format = reader
        .format()
        .ok_or_else(|| Error::UnsupportedImage(path.to_path_buf()))?;
    let (ext, content_type) = match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpeg", "image/jpeg"),
        ImageFormat::Gif => ("gif", "image/gif"),
        ImageFormat::Bmp => ("bmp", "image/bmp"),
        _ => return Err(Error::UnsupportedImage(path.to_path_buf())),
    };
    let (width_px, height_px) = reader.into_dimensions().map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedImage {
        bytes,
        ext,
        content_type,
        width_px,
        height_px,
    })
}
