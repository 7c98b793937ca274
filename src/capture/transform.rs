//! Crop, resize and encode — turns a raw capture into the fixed-size output.
//!
//! Pure apart from the raster decode/encode; no I/O.

use super::{OutputFormat, OutputSettings, PixelCropRegion, RawCapture, TargetImage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Crops `raw` to `region` and resizes the crop to exactly the target size.
///
/// The crop is stretched to fit; aspect ratio is the selection widget's job.
/// Resampling uses Catmull-Rom (bicubic).
pub fn transform(
    raw: &RawCapture,
    region: &PixelCropRegion,
    settings: &OutputSettings,
) -> Result<TargetImage, TransformError> {
    if settings.width == 0 || settings.height == 0 {
        return Err(TransformError::InvalidTarget {
            width: settings.width,
            height: settings.height,
        });
    }
    if region.width == 0 || region.height == 0 {
        return Err(TransformError::EmptyRegion);
    }

    let start = std::time::Instant::now();

    let right = u64::from(region.x) + u64::from(region.width);
    let bottom = u64::from(region.y) + u64::from(region.height);
    if right > u64::from(raw.pixel_width) || bottom > u64::from(raw.pixel_height) {
        return Err(TransformError::RegionOutOfBounds {
            region: *region,
            image_size: (raw.pixel_width, raw.pixel_height),
        });
    }

    let expected = raw.pixel_width as usize * raw.pixel_height as usize * 4;
    let full = (raw.pixels.len() == expected)
        .then(|| RgbaImage::from_raw(raw.pixel_width, raw.pixel_height, raw.pixels.clone()))
        .flatten()
        .ok_or(TransformError::InvalidRaster {
            width: raw.pixel_width,
            height: raw.pixel_height,
            len: raw.pixels.len(),
        })?;

    let cropped =
        image::imageops::crop_imm(&full, region.x, region.y, region.width, region.height).to_image();
    let resized = image::imageops::resize(
        &cropped,
        settings.width,
        settings.height,
        FilterType::CatmullRom,
    );

    let encoded = encode(DynamicImage::ImageRgba8(resized), settings)?;

    log::info!(
        "[TRANSFORM] {}x{} at {},{} -> {}x{} {} in {}ms ({} bytes)",
        region.width,
        region.height,
        region.x,
        region.y,
        settings.width,
        settings.height,
        settings.format.mime_type(),
        start.elapsed().as_millis(),
        encoded.len()
    );

    Ok(TargetImage {
        encoded,
        format: settings.format,
        width: settings.width,
        height: settings.height,
    })
}

fn encode(image: DynamicImage, settings: &OutputSettings) -> Result<Vec<u8>, TransformError> {
    let mut bytes: Vec<u8> = Vec::new();
    match settings.format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(settings.quality));
            rgb.write_with_encoder(encoder)
                .map_err(|e| TransformError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|e| TransformError::Encode(e.to_string()))?;
        }
    }
    Ok(bytes)
}

/// Maps a 0.0–1.0 quality factor onto the encoder's 1–100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 90;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Target dimensions must be positive, got {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    #[error("Crop region has zero width or height")]
    EmptyRegion,

    #[error("Raw capture of {width}x{height} cannot be decoded from {len} bytes")]
    InvalidRaster { width: u32, height: u32, len: usize },

    #[error(
        "Crop region ({},{},{},{}) exceeds capture bounds ({}x{})",
        region.x, region.y, region.width, region.height,
        image_size.0, image_size.1
    )]
    RegionOutOfBounds {
        region: PixelCropRegion,
        image_size: (u32, u32),
    },

    #[error("Image encoding failed: {0}")]
    Encode(String),
}
