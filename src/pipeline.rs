//! Capture pipeline — selection in, downloadable asset out.
//!
//! map → transform → compress, each stage feeding the next. Geometry and
//! encoding errors abort the capture; compression is best-effort and only
//! ever shows up as an annotation on the result.

use crate::capture::{
    self, CaptureError, DisplaySource, OutputFormat, OutputSettings, RawCapture,
    SelectionBounds, TransformError, ViewportMetrics,
};
use crate::compress::{self, CancellationToken, CompressionClient, CompressionOutcome};
use crate::config::Config;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The terminal artifact of one capture.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub filename: String,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub compression: CompressionOutcome,
}

impl CaptureResult {
    /// Compressed bytes when compression succeeded, the original encoding
    /// otherwise.
    pub fn final_buffer(&self) -> &[u8] {
        &self.compression.final_buffer
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(self.final_buffer())
        )
    }

    /// Writes the image into `dir` under its filename.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .filter(|name| name.to_str() == Some(self.filename.as_str()))
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{:?} is not a plain file name", self.filename),
                )
            })?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        std::fs::write(&path, self.final_buffer())?;
        log::info!(
            "[PIPELINE] Saved {} ({} bytes)",
            path.display(),
            self.final_buffer().len()
        );
        Ok(path)
    }

    /// Writes the image into the user's download directory.
    pub fn save_to_downloads(&self) -> std::io::Result<PathBuf> {
        let dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        self.save_to(&dir)
    }
}

pub struct CapturePipeline {
    output: OutputSettings,
    compressor: Option<Arc<CompressionClient>>,
}

impl CapturePipeline {
    pub fn new(output: OutputSettings, compressor: Arc<CompressionClient>) -> Self {
        Self {
            output,
            compressor: Some(compressor),
        }
    }

    pub fn without_compression(output: OutputSettings) -> Self {
        Self {
            output,
            compressor: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = CompressionClient::new(config.compression.clone());
        Self::new(config.output, Arc::new(client))
    }

    pub fn output(&self) -> &OutputSettings {
        &self.output
    }

    /// Grabs the display through `source` and runs [`capture`](Self::capture).
    ///
    /// An uncapturable surface fails the request before any pipeline work.
    pub async fn capture_display(
        &self,
        source: Arc<dyn DisplaySource>,
        selection: SelectionBounds,
        template_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CaptureResult, PipelineError> {
        let (viewport, raw) = tokio::task::spawn_blocking(move || {
            let viewport = source.viewport()?;
            let raw = source.capture()?;
            Ok::<_, CaptureError>((viewport, raw))
        })
        .await
        .map_err(|e| PipelineError::TaskJoin(e.to_string()))??;

        self.capture(selection, viewport, raw, template_id, cancel).await
    }

    /// Crops, normalizes and (optionally) compresses one selection.
    pub async fn capture(
        &self,
        selection: SelectionBounds,
        viewport: ViewportMetrics,
        raw: RawCapture,
        template_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CaptureResult, PipelineError> {
        let start = std::time::Instant::now();

        let region = capture::map_selection_to_pixels(&selection, &viewport, &raw);
        log::info!(
            "[PIPELINE] Selection {:?} on {}x{} logical -> {:?} on {}x{} raw",
            selection,
            viewport.logical_width,
            viewport.logical_height,
            region,
            raw.pixel_width,
            raw.pixel_height
        );

        let settings = self.output;
        let image = tokio::task::spawn_blocking(move || capture::transform(&raw, &region, &settings))
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))??;

        let compression = match &self.compressor {
            Some(client) => client.compress_with_cancel(&image, cancel).await,
            None => CompressionOutcome::skipped(image.encoded.clone()),
        };

        let filename = build_filename(template_id, settings.format, compress::now_ms());
        log::info!(
            "[PIPELINE] {} ready in {}ms — {}",
            filename,
            start.elapsed().as_millis(),
            compression.summary()
        );

        Ok(CaptureResult {
            filename,
            format: image.format,
            width: image.width,
            height: image.height,
            compression,
        })
    }
}

/// `<template>.<ext>` for a non-blank template id, otherwise
/// `thumbnail-<epoch ms>.<ext>`.
///
/// Only the last path component of the id is used, without leading dots,
/// so the name always stays inside the directory it is saved into.
pub fn build_filename(template_id: Option<&str>, format: OutputFormat, now_ms: u64) -> String {
    match template_id.map(file_stem).filter(|id| !id.is_empty()) {
        Some(id) => format!("{}.{}", id, format.extension()),
        None => format!("thumbnail-{}.{}", now_ms, format.extension()),
    }
}

fn file_stem(template_id: &str) -> &str {
    template_id
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.')
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Background task failed: {0}")]
    TaskJoin(String),
}
