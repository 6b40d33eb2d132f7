//! File upload job
//!
//! Posts one file as a multipart form to the upload endpoint and reports a
//! single [`UploadOutcome`] when done. At most one upload runs at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use url::Url;

use parley_protocol::{UploadAccepted, UploadErrorBody, UPLOAD_ACCEPTED_STATUS, UPLOAD_FIELD};
use parley_utils::{ParleyError, Result};

/// Reason shown for any transport-level failure
pub const NETWORK_ERROR: &str = "Network error";

/// Reason shown when an accepted upload carries an unreadable body
pub const UNEXPECTED_RESPONSE: &str = "Unexpected server response";

/// How an upload ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Accepted for processing; `label` names the file as the server saw it
    Succeeded { label: String },
    Failed { reason: String },
}

impl UploadOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Runs uploads against one endpoint
#[derive(Debug, Clone)]
pub struct UploadJob {
    client: reqwest::Client,
    endpoint: Url,
    running: Arc<AtomicBool>,
}

impl UploadJob {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start uploading `file` in the background
    ///
    /// `on_complete` is called exactly once, after the busy flag is cleared.
    pub fn start<F>(&self, file: PathBuf, on_complete: F) -> Result<()>
    where
        F: FnOnce(UploadOutcome) + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ParleyError::UploadBusy);
        }

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let outcome = run_upload(&client, &endpoint, &file).await;
            running.store(false, Ordering::SeqCst);
            on_complete(outcome);
        });

        Ok(())
    }
}

async fn run_upload(client: &reqwest::Client, endpoint: &Url, file: &Path) -> UploadOutcome {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let bytes = match tokio::fs::read(file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %file.display(), "Failed to read upload file: {}", e);
            return UploadOutcome::failed(format!("Could not read {}", name));
        }
    };

    tracing::info!(file = %name, size = bytes.len(), url = %endpoint, "Uploading file");

    let form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(name));
    let response = match client.post(endpoint.clone()).multipart(form).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Upload request failed: {}", e);
            return UploadOutcome::failed(NETWORK_ERROR);
        }
    };

    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => interpret_response(status, &body),
        Err(e) => {
            tracing::warn!(status, "Failed to read upload response: {}", e);
            if status == UPLOAD_ACCEPTED_STATUS {
                UploadOutcome::failed(UNEXPECTED_RESPONSE)
            } else {
                UploadOutcome::failed(format!("Server error {}", status))
            }
        }
    }
}

/// Map an HTTP status and body to an outcome
pub fn interpret_response(status: u16, body: &str) -> UploadOutcome {
    if status == UPLOAD_ACCEPTED_STATUS {
        return match serde_json::from_str::<UploadAccepted>(body) {
            Ok(accepted) => {
                if let Some(message) = accepted.message.as_deref() {
                    tracing::debug!(message, "Upload accepted by server");
                }
                UploadOutcome::Succeeded {
                    label: accepted.filename,
                }
            }
            Err(e) => {
                tracing::warn!("Unreadable upload acceptance body: {}", e);
                UploadOutcome::failed(UNEXPECTED_RESPONSE)
            }
        };
    }

    let detail = serde_json::from_str::<UploadErrorBody>(body)
        .ok()
        .and_then(|b| b.detail_text());

    UploadOutcome::failed(detail.unwrap_or_else(|| format!("Server error {}", status)))
}
