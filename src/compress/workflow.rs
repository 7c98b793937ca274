//! The five remote steps and the structured failure each one can produce.
//!
//! Steps never log; they return a [`WorkflowError`] carrying the status and
//! body the service sent, and the client decides what to do with it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    Authenticate,
    StartTask,
    Upload,
    Process,
    Download,
}

impl WorkflowStep {
    /// Every step, in workflow order. Used for reporting and iteration;
    /// the client sequences its calls itself.
    pub const ALL: [WorkflowStep; 5] = [
        WorkflowStep::Authenticate,
        WorkflowStep::StartTask,
        WorkflowStep::Upload,
        WorkflowStep::Process,
        WorkflowStep::Download,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WorkflowStep::Authenticate => "Authentication",
            WorkflowStep::StartTask => "Task start",
            WorkflowStep::Upload => "Upload",
            WorkflowStep::Process => "Processing",
            WorkflowStep::Download => "Download",
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a step failed, with whatever the service said about it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{step} failed: {reason}")]
pub struct WorkflowError {
    pub step: WorkflowStep,
    pub status: Option<u16>,
    pub body: Option<String>,
    pub reason: String,
}

impl WorkflowError {
    pub fn new(step: WorkflowStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            status: None,
            body: None,
            reason: reason.into(),
        }
    }

    /// Non-success HTTP status.
    pub fn http(step: WorkflowStep, status: reqwest::StatusCode, body: String) -> Self {
        Self {
            step,
            status: Some(status.as_u16()),
            reason: format!("HTTP {}", status),
            body: Some(body),
        }
    }

    /// Connection, timeout or body-read failure.
    pub fn transport(step: WorkflowStep, error: reqwest::Error) -> Self {
        Self {
            step,
            status: error.status().map(|s| s.as_u16()),
            body: None,
            reason: error.to_string(),
        }
    }

    /// 2xx response whose body is not what the step needs.
    pub fn malformed(step: WorkflowStep, reason: impl Into<String>, body: String) -> Self {
        Self {
            step,
            status: None,
            body: Some(body),
            reason: reason.into(),
        }
    }

    pub fn cancelled(step: WorkflowStep) -> Self {
        Self::new(step, "cancelled")
    }

    /// Body trimmed for log lines.
    pub fn body_excerpt(&self) -> &str {
        match &self.body {
            Some(body) => truncate(body, 200),
            None => "",
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
