//! Drives the remote compression workflow for one image.
//!
//! Authenticate → StartTask → Upload → Process → Download, strictly in
//! order. Each step takes the previous step's context and returns the next
//! one or a [`WorkflowError`]; the first error ends the run and the caller
//! gets the original image back.

use super::session::{AuthError, CompressionSession};
use super::types::{
    CompressionOutcome, ProcessFile, ProcessRequest, ProcessResponse, StartResponse,
    UploadResponse, TASK_SUCCESS,
};
use super::workflow::{WorkflowError, WorkflowStep};
use crate::capture::TargetImage;
use crate::config::CompressionConfig;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A task assigned by the service, plus the token that authorizes it.
struct TaskContext {
    token: String,
    server: String,
    task: String,
}

struct UploadedFile {
    task: TaskContext,
    server_filename: String,
    filename: String,
}

pub struct CompressionClient {
    http: reqwest::Client,
    session: Arc<CompressionSession>,
    config: CompressionConfig,
}

impl CompressionClient {
    pub fn new(config: CompressionConfig) -> Self {
        let http = reqwest::Client::new();
        let session = Arc::new(CompressionSession::new(http.clone(), &config));
        Self::with_session(http, session, config)
    }

    /// Shares an existing session, so several clients reuse one token.
    pub fn with_session(
        http: reqwest::Client,
        session: Arc<CompressionSession>,
        config: CompressionConfig,
    ) -> Self {
        Self {
            http,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Arc<CompressionSession> {
        &self.session
    }

    /// Runs the workflow once. Never fails: any step failure returns the
    /// input encoding with `compressed: false`.
    pub async fn compress(&self, image: &TargetImage) -> CompressionOutcome {
        self.compress_with_cancel(image, &CancellationToken::new()).await
    }

    /// Like [`compress`](Self::compress), aborting the in-flight request
    /// when `cancel` fires.
    pub async fn compress_with_cancel(
        &self,
        image: &TargetImage,
        cancel: &CancellationToken,
    ) -> CompressionOutcome {
        let start = std::time::Instant::now();
        let original_size = image.encoded.len();

        match self.run(image, cancel).await {
            Ok(bytes) => {
                let outcome = CompressionOutcome::compressed(original_size, bytes);
                log::info!(
                    "[COMPRESS] {} in {}ms",
                    outcome.summary(),
                    start.elapsed().as_millis()
                );
                outcome
            }
            Err(err) => {
                log::warn!(
                    "[COMPRESS] {} (status={:?}) after {}ms — body: {}",
                    err,
                    err.status,
                    start.elapsed().as_millis(),
                    err.body_excerpt()
                );
                CompressionOutcome::fallback(image.encoded.clone(), err.step, err.to_string())
            }
        }
    }

    async fn run(
        &self,
        image: &TargetImage,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, WorkflowError> {
        let token = guarded(WorkflowStep::Authenticate, cancel, self.authenticate()).await?;
        let task = guarded(WorkflowStep::StartTask, cancel, self.start_task(token)).await?;
        let uploaded = guarded(WorkflowStep::Upload, cancel, self.upload(task, image)).await?;
        let processed = guarded(WorkflowStep::Process, cancel, self.process(uploaded)).await?;
        guarded(WorkflowStep::Download, cancel, self.download(processed)).await
    }

    async fn authenticate(&self) -> Result<String, WorkflowError> {
        let step = WorkflowStep::Authenticate;
        match self.session.get_credential().await {
            Ok(credential) => Ok(credential.token().to_string()),
            Err(AuthError::NotConfigured) => Err(WorkflowError::new(
                step,
                AuthError::NotConfigured.to_string(),
            )),
            Err(AuthError::Request {
                status,
                body,
                reason,
            }) => Err(WorkflowError {
                step,
                status,
                body,
                reason,
            }),
        }
    }

    async fn start_task(&self, token: String) -> Result<TaskContext, WorkflowError> {
        let step = WorkflowStep::StartTask;
        let url = format!(
            "{}/v1/start/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.tool
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(step, e))?;
        let started: StartResponse = read_json(step, response).await?;

        if started.server.trim().is_empty() || started.task.trim().is_empty() {
            return Err(WorkflowError::new(step, "response is missing server or task"));
        }

        log::debug!("[COMPRESS] Task {} assigned to {}", started.task, started.server);
        Ok(TaskContext {
            token,
            server: started.server,
            task: started.task,
        })
    }

    async fn upload(
        &self,
        task: TaskContext,
        image: &TargetImage,
    ) -> Result<UploadedFile, WorkflowError> {
        let step = WorkflowStep::Upload;
        let filename = format!("thumbnail.{}", image.format.extension());

        let file = Part::bytes(image.encoded.clone())
            .file_name(filename.clone())
            .mime_str(image.mime_type())
            .map_err(|e| WorkflowError::new(step, e.to_string()))?;
        let form = Form::new().text("task", task.task.clone()).part("file", file);

        let response = self
            .http
            .post(self.config.server_url(&task.server, "/v1/upload"))
            .bearer_auth(&task.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(step, e))?;
        let uploaded: UploadResponse = read_json(step, response).await?;

        if uploaded.server_filename.trim().is_empty() {
            return Err(WorkflowError::new(step, "response is missing server_filename"));
        }

        Ok(UploadedFile {
            task,
            server_filename: uploaded.server_filename,
            filename,
        })
    }

    async fn process(&self, uploaded: UploadedFile) -> Result<TaskContext, WorkflowError> {
        let step = WorkflowStep::Process;
        let task = uploaded.task;
        let request = ProcessRequest {
            task: &task.task,
            tool: &self.config.tool,
            files: vec![ProcessFile {
                server_filename: &uploaded.server_filename,
                filename: &uploaded.filename,
            }],
        };

        let response = self
            .http
            .post(self.config.server_url(&task.server, "/v1/process"))
            .bearer_auth(&task.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(step, e))?;
        let processed: ProcessResponse = read_json(step, response).await?;

        match processed.status.as_deref() {
            Some(TASK_SUCCESS) => Ok(task),
            status => {
                let status = status.unwrap_or("no status");
                let reason = match processed.status_message.as_deref() {
                    Some(message) if !message.is_empty() => format!("{} ({})", status, message),
                    _ => status.to_string(),
                };
                Err(WorkflowError::new(step, reason))
            }
        }
    }

    async fn download(&self, task: TaskContext) -> Result<Vec<u8>, WorkflowError> {
        let step = WorkflowStep::Download;
        let url = self
            .config
            .server_url(&task.server, &format!("/v1/download/{}", task.task));

        let response = self
            .http
            .get(url)
            .bearer_auth(&task.token)
            .send()
            .await
            .map_err(|e| WorkflowError::transport(step, e))?;

        if !response.status().is_success() {
            return Err(http_error(step, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::transport(step, e))?;
        if bytes.is_empty() {
            return Err(WorkflowError::new(step, "empty download"));
        }
        image::guess_format(&bytes)
            .map_err(|_| WorkflowError::new(step, "downloaded bytes are not an image"))?;

        Ok(bytes.to_vec())
    }
}

/// Races a step against cancellation.
async fn guarded<T>(
    step: WorkflowStep,
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, WorkflowError>>,
) -> Result<T, WorkflowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkflowError::cancelled(step)),
        result = work => result,
    }
}

/// Rejects non-2xx statuses, then reads the body and decodes it as JSON.
async fn read_json<T: DeserializeOwned>(
    step: WorkflowStep,
    response: reqwest::Response,
) -> Result<T, WorkflowError> {
    if !response.status().is_success() {
        return Err(http_error(step, response).await);
    }

    let body = response
        .text()
        .await
        .map_err(|e| WorkflowError::transport(step, e))?;

    serde_json::from_str(&body)
        .map_err(|e| WorkflowError::malformed(step, format!("unexpected response: {}", e), body))
}

/// Error for a non-2xx response. The status survives a failed body read.
async fn http_error(step: WorkflowStep, response: reqwest::Response) -> WorkflowError {
    let status = response.status();
    match response.text().await {
        Ok(body) => WorkflowError::http(step, status, body),
        Err(e) => WorkflowError {
            step,
            status: Some(status.as_u16()),
            body: None,
            reason: format!("HTTP {} (body unreadable: {})", status, e),
        },
    }
}
