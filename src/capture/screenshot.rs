//! Display capture using the `xcap` crate.
//!
//! This is the infrastructure layer — it talks to the OS. Everything
//! downstream consumes it through [`DisplaySource`] so the pipeline can run
//! against canned rasters in tests.

use super::{RawCapture, ViewportMetrics};
use xcap::Monitor;

/// The host's screenshot and viewport-metrics primitives.
///
/// Both calls block; async callers should run them on a blocking thread.
pub trait DisplaySource: Send + Sync {
    /// Full visible surface, in physical pixels.
    fn capture(&self) -> Result<RawCapture, CaptureError>;

    /// Logical size and pixel density of the surface `capture` returns.
    fn viewport(&self) -> Result<ViewportMetrics, CaptureError>;
}

/// Captures the primary monitor, or the first monitor if none reports
/// itself as primary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryMonitorSource;

impl PrimaryMonitorSource {
    fn monitor(&self) -> Result<Monitor, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

        let primary = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);

        monitors
            .into_iter()
            .nth(primary)
            .ok_or(CaptureError::NoDisplay)
    }
}

impl DisplaySource for PrimaryMonitorSource {
    fn capture(&self) -> Result<RawCapture, CaptureError> {
        let start = std::time::Instant::now();
        let image = self
            .monitor()?
            .capture_image()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        log::info!(
            "[CAPTURE] Primary monitor captured {}x{} in {}ms",
            image.width(),
            image.height(),
            start.elapsed().as_millis()
        );
        Ok(RawCapture::from_rgba(image))
    }

    fn viewport(&self) -> Result<ViewportMetrics, CaptureError> {
        let monitor = self.monitor()?;
        let metric = |e: xcap::XCapError| CaptureError::Metrics(e.to_string());

        Ok(ViewportMetrics {
            logical_width: monitor.width().map_err(metric)? as f64,
            logical_height: monitor.height().map_err(metric)? as f64,
            device_pixel_ratio: monitor.scale_factor().map_err(metric)? as f64,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No display available to capture")]
    NoDisplay,

    #[error("Surface is not capturable: {0}")]
    Unavailable(String),

    #[error("Failed to read viewport metrics: {0}")]
    Metrics(String),
}
