//! Wire payloads for the compression service and the outcome handed back
//! to the pipeline.

use super::workflow::WorkflowStep;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub public_key: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartResponse {
    pub server: String,
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub server_filename: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProcessRequest<'a> {
    pub task: &'a str,
    pub tool: &'a str,
    pub files: Vec<ProcessFile<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProcessFile<'a> {
    pub server_filename: &'a str,
    pub filename: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Process-step status the service reports on success.
pub(crate) const TASK_SUCCESS: &str = "TaskSuccess";

/// Byte sizes before and after compression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeDetails {
    pub original_size: usize,
    pub compressed_size: usize,
    /// `(1 - compressed/original) * 100`, one decimal place.
    pub reduction_percent: f64,
}

impl SizeDetails {
    pub fn new(original_size: usize, compressed_size: usize) -> Self {
        let reduction_percent = if original_size == 0 {
            0.0
        } else {
            let ratio = compressed_size as f64 / original_size as f64;
            ((1.0 - ratio) * 1000.0).round() / 10.0
        };
        Self {
            original_size,
            compressed_size,
            reduction_percent,
        }
    }
}

/// Result of one compression attempt. Always carries a usable image:
/// the original encoding whenever `compressed` is false.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionOutcome {
    #[serde(skip)]
    pub final_buffer: Vec<u8>,
    pub compressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<WorkflowStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_details: Option<SizeDetails>,
}

impl CompressionOutcome {
    pub(crate) fn compressed(original_size: usize, buffer: Vec<u8>) -> Self {
        let size_details = SizeDetails::new(original_size, buffer.len());
        Self {
            final_buffer: buffer,
            compressed: true,
            error_message: None,
            failed_step: None,
            size_details: Some(size_details),
        }
    }

    /// Compression was never attempted.
    pub fn skipped(original: Vec<u8>) -> Self {
        Self {
            final_buffer: original,
            compressed: false,
            error_message: None,
            failed_step: None,
            size_details: None,
        }
    }

    pub(crate) fn fallback(original: Vec<u8>, step: WorkflowStep, message: String) -> Self {
        Self {
            final_buffer: original,
            compressed: false,
            error_message: Some(message),
            failed_step: Some(step),
            size_details: None,
        }
    }

    /// One-line annotation for the user; compression failure is never an
    /// error from their point of view.
    pub fn summary(&self) -> String {
        match (&self.size_details, &self.error_message) {
            (Some(size), _) if self.compressed => format!(
                "Compressed {} → {} ({:.1}% smaller)",
                format_bytes(size.original_size),
                format_bytes(size.compressed_size),
                size.reduction_percent
            ),
            (_, Some(error)) => format!("Not compressed: {}", error),
            _ => "Not compressed".to_string(),
        }
    }
}

impl std::fmt::Debug for CompressionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionOutcome")
            .field("bytes", &self.final_buffer.len())
            .field("compressed", &self.compressed)
            .field("error_message", &self.error_message)
            .field("failed_step", &self.failed_step)
            .field("size_details", &self.size_details)
            .finish()
    }
}

fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_is_rounded_to_one_decimal() {
        assert_eq!(SizeDetails::new(50_000, 12_000).reduction_percent, 76.0);
        assert_eq!(SizeDetails::new(3, 1).reduction_percent, 66.7);
        assert_eq!(SizeDetails::new(100, 100).reduction_percent, 0.0);
    }

    #[test]
    fn larger_output_gives_negative_reduction() {
        assert_eq!(SizeDetails::new(1000, 1500).reduction_percent, -50.0);
    }

    #[test]
    fn zero_original_size_does_not_divide() {
        assert_eq!(SizeDetails::new(0, 10).reduction_percent, 0.0);
    }

    #[test]
    fn summary_describes_outcome() {
        let ok = CompressionOutcome::compressed(50_000, vec![0; 12_000]);
        assert_eq!(ok.summary(), "Compressed 48.8 KB → 11.7 KB (76.0% smaller)");

        let failed = CompressionOutcome::fallback(
            vec![1, 2, 3],
            WorkflowStep::Process,
            "Processing failed: TaskError".to_string(),
        );
        assert_eq!(failed.summary(), "Not compressed: Processing failed: TaskError");

        assert_eq!(CompressionOutcome::skipped(vec![]).summary(), "Not compressed");
    }

    #[test]
    fn process_response_tolerates_missing_fields() {
        let parsed: ProcessResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.status.is_none());
        let parsed: ProcessResponse =
            serde_json::from_str(r#"{"status":"TaskSuccess","status_message":"ok"}"#).unwrap();
        assert_eq!(parsed.status.as_deref(), Some(TASK_SUCCESS));
    }
}
