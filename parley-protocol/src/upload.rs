//! Upload endpoint vocabulary
//!
//! Uploads are a single-field multipart `POST`. The server answers
//! `202 Accepted` with an [`UploadAccepted`] body once the file is queued for
//! processing; every other answer is a failure, usually carrying an
//! [`UploadErrorBody`].

use serde::{Deserialize, Serialize};

/// Path of the upload endpoint relative to the server root
pub const UPLOAD_PATH: &str = "/data/upload";

/// Name of the multipart field carrying the file
pub const UPLOAD_FIELD: &str = "file";

/// Status code signalling the file was accepted
pub const UPLOAD_ACCEPTED_STATUS: u16 = 202;

/// Body of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAccepted {
    /// Display-safe name the server stored the file under
    pub filename: String,
    /// Human-readable confirmation
    #[serde(default)]
    pub message: Option<String>,
    /// Server-side staging path, informational only
    #[serde(default)]
    pub temp_path: Option<String>,
}

/// Body of a rejected upload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadErrorBody {
    /// Either a plain message or a structured validation report
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl UploadErrorBody {
    /// Human-readable detail, if the server provided one
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
