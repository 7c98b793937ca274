//! Screen capture domain — public API.
//!
//! This module owns the geometry and raster side of a snip: the data model
//! shared by the mapper and transformer, plus the display primitive.
//! External code should only use the items exported here.

mod region;
mod screenshot;
mod transform;

pub use region::map_selection_to_pixels;
pub use screenshot::{CaptureError, DisplaySource, PrimaryMonitorSource};
pub use transform::{transform, TransformError};

use serde::{Deserialize, Serialize};

/// Width:height ratio the selection widget locks rectangles to.
pub const SELECTION_ASPECT: f64 = 16.0 / 9.0;

/// Snapshot of the live display's logical size and pixel density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetrics {
    pub logical_width: f64,
    pub logical_height: f64,
    pub device_pixel_ratio: f64,
}

/// A user-drawn rectangle in logical display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a selection whose height follows [`SELECTION_ASPECT`].
    pub fn aspect_locked(x: f64, y: f64, width: f64) -> Self {
        Self {
            x,
            y,
            width,
            height: width / SELECTION_ASPECT,
        }
    }
}

/// Unprocessed full-surface raster, tightly packed RGBA8.
#[derive(Clone)]
pub struct RawCapture {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixels: Vec<u8>,
}

impl RawCapture {
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (pixel_width, pixel_height) = image.dimensions();
        Self {
            pixel_width,
            pixel_height,
            pixels: image.into_raw(),
        }
    }
}

impl std::fmt::Debug for RawCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCapture")
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Crop rectangle in raw-capture pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Encoding used for the normalized output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Size, format and quality of the normalized output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    pub width: u32,
    pub height: u32,
    /// 0.0–1.0, only used for JPEG.
    pub quality: f32,
    pub format: OutputFormat,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            width: 560,
            height: 315,
            quality: 0.9,
            format: OutputFormat::Jpeg,
        }
    }
}

/// The fixed-resolution encoded output, produced before compression.
#[derive(Clone, PartialEq)]
pub struct TargetImage {
    pub encoded: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl TargetImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

impl std::fmt::Debug for TargetImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.encoded.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_locked_selection_is_sixteen_by_nine() {
        let sel = SelectionBounds::aspect_locked(10.0, 20.0, 320.0);
        assert_eq!(sel.height, 180.0);
        assert_eq!((sel.x, sel.y), (10.0, 20.0));
    }

    #[test]
    fn output_format_mime_and_extension() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::from_mime(" IMAGE/PNG "), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_mime("image/jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_mime("image/webp"), None);
    }

    #[test]
    fn default_output_is_560_by_315_jpeg() {
        let settings = OutputSettings::default();
        assert_eq!((settings.width, settings.height), (560, 315));
        assert_eq!(settings.format, OutputFormat::Jpeg);
    }
}
