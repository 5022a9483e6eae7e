//! Client side of the asynchronous compression service.
//!
//! The server compresses a batch of product files in the background. A
//! client starts a job, polls its progress, and downloads the archive once
//! the job reports completion:
//!
//! ```text
//! start ──▶ JobHandle ──▶ progress (every 2 s, ≤ 10 times) ──▶ download
//! POST /async_compression/start/      GET …/progress/?task_id=   POST …/download/
//! ```
//!
//! [`CompressionService`] is the seam between the flow logic in
//! [`poller`] and the wire protocol in [`client`]. The HTTP implementation
//! is [`HttpCompressionClient`]; tests substitute an in-memory service.

pub mod client;
pub mod poller;

use crate::config::Language;
use crate::error::DocstampError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub use client::HttpCompressionClient;
pub use poller::{check_progress, download_when_ready, probe_progress, start_and_download};

/// Server paths of the compression endpoints.
pub const START_PATH: &str = "/async_compression/start/";
pub const PROGRESS_PATH: &str = "/async_compression/progress/";
pub const DOWNLOAD_PATH: &str = "/async_compression/download/";

// ── Domain types ─────────────────────────────────────────────────────────

/// Opaque server-issued identifier of a compression job.
///
/// The format is never inspected. Once obtained the handle cannot be
/// changed, only cloned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which product files the server should put in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Step,
    Bmp,
    /// PDF and STEP files together.
    Both,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Step => "step",
            FileType::Bmp => "bmp",
            FileType::Both => "both",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = DocstampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "step" | "stp" => Ok(FileType::Step),
            "bmp" => Ok(FileType::Bmp),
            "both" => Ok(FileType::Both),
            other => Err(DocstampError::InvalidInput {
                input: other.to_string(),
                reason: "file type must be one of pdf, step, bmp, both".into(),
            }),
        }
    }
}

/// Parameters of a new compression job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub product_ids: Vec<String>,
    pub file_type: FileType,
    pub language: Language,
}

impl StartRequest {
    pub fn new<I, T>(product_ids: I, file_type: FileType, language: Language) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            product_ids: product_ids
                .into_iter()
                .map(|id| id.to_string().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            file_type,
            language,
        }
    }

    /// The comma-joined id list the server expects.
    pub fn joined_ids(&self) -> String {
        self.product_ids.join(",")
    }
}

/// Lifecycle state reported by the server alongside the percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown(String),
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }
}

/// One fresh answer to a progress request. Never cached or merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Percentage complete, 0–100.
    pub progress: f64,
    pub is_completed: bool,
    pub status: Option<JobStatus>,
    pub error_message: Option<String>,
}

impl ProgressSnapshot {
    pub fn new(progress: f64, is_completed: bool) -> Self {
        Self {
            progress,
            is_completed,
            status: None,
            error_message: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(JobStatus::Failed)
    }
}

/// Result of a single status request, failures included.
///
/// `Unknown` keeps "the server could not be asked" apart from a job that is
/// genuinely at 0 %. [`ProgressProbe::reported`] collapses it back to the
/// `(0, false)` pair the callback contract uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressProbe {
    Known(ProgressSnapshot),
    Unknown { reason: String },
}

impl ProgressProbe {
    /// `(progress, is_completed)` with failures reported as `(0.0, false)`.
    pub fn reported(&self) -> (f64, bool) {
        match self {
            ProgressProbe::Known(s) => (s.progress, s.is_completed),
            ProgressProbe::Unknown { .. } => (0.0, false),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.reported().1
    }
}

/// A downloaded archive, held in memory.
#[derive(Debug, Clone)]
pub struct DownloadedArchive {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl DownloadedArchive {
    /// Write the archive into `dir` under its server-provided name.
    ///
    /// Uses atomic write (temp file + rename) so a partial archive never
    /// appears under the final name.
    pub async fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DocstampError> {
        let dir = dir.as_ref();
        let path = dir.join(&self.filename);
        let write_err = |source| DocstampError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        let tmp_path = dir.join(format!(".{}.part", self.filename));
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(write_err)?;

        info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

// ── Service seam ─────────────────────────────────────────────────────────

/// The three requests of the compression protocol.
///
/// Each call is a single request/response; retry policy lives in
/// [`poller`], not here.
pub trait CompressionService: Send + Sync {
    /// Ask the server to start compressing.
    fn start(
        &self,
        request: &StartRequest,
    ) -> impl Future<Output = Result<JobHandle, DocstampError>> + Send;

    /// Fetch the current progress of a job.
    fn progress(
        &self,
        handle: &JobHandle,
    ) -> impl Future<Output = Result<ProgressSnapshot, DocstampError>> + Send;

    /// Fetch the finished archive.
    fn download(
        &self,
        handle: &JobHandle,
        file_type: FileType,
    ) -> impl Future<Output = Result<DownloadedArchive, DocstampError>> + Send;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct StartBody<'a> {
    pub product_ids: String,
    pub file_type: FileType,
    pub language: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "opaque_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StartResponse {
    pub fn into_handle(self) -> Result<JobHandle, DocstampError> {
        if !self.success {
            return Err(DocstampError::JobRejected {
                message: self
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            });
        }
        match self.task_id {
            Some(id) if !id.is_empty() => Ok(JobHandle::new(id)),
            _ => Err(DocstampError::ProtocolError {
                endpoint: START_PATH.to_string(),
                detail: "success response without task_id".into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProgressResponse {
    pub fn into_snapshot(self) -> Result<ProgressSnapshot, DocstampError> {
        if self.success == Some(false) {
            return Err(DocstampError::ProtocolError {
                endpoint: PROGRESS_PATH.to_string(),
                detail: self
                    .message
                    .unwrap_or_else(|| "server reported failure".into()),
            });
        }
        Ok(ProgressSnapshot {
            progress: self.progress.unwrap_or(0.0).clamp(0.0, 100.0),
            is_completed: self.is_completed.unwrap_or(false),
            status: self.status.as_deref().map(JobStatus::from),
            error_message: self.error_message.filter(|m| !m.is_empty()),
        })
    }
}

/// Refusal body the download endpoint sends instead of a file.
#[derive(Debug, Deserialize)]
pub(crate) struct RefusalResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Accept a task id sent either as a JSON string or a number.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_trims_and_joins_ids() {
        let req = StartRequest::new([" 12", "7 ", ""], FileType::Pdf, Language::En);
        assert_eq!(req.product_ids, vec!["12", "7"]);
        assert_eq!(req.joined_ids(), "12,7");
    }

    #[test]
    fn start_body_matches_wire_format() {
        let body = StartBody {
            product_ids: "1,2".into(),
            file_type: FileType::Both,
            language: "zh",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product_ids": "1,2", "file_type": "both", "language": "zh"})
        );
    }

    #[test]
    fn start_response_success_yields_handle() {
        let r: StartResponse =
            serde_json::from_str(r#"{"success":true,"task_id":"9f1c","message":"ok"}"#).unwrap();
        assert_eq!(r.into_handle().unwrap(), JobHandle::new("9f1c"));
    }

    #[test]
    fn start_response_accepts_numeric_task_id() {
        let r: StartResponse = serde_json::from_str(r#"{"success":true,"task_id":42}"#).unwrap();
        assert_eq!(r.into_handle().unwrap().as_str(), "42");
    }

    #[test]
    fn start_response_failure_is_rejection() {
        let r: StartResponse =
            serde_json::from_str(r#"{"success":false,"message":"no products"}"#).unwrap();
        match r.into_handle() {
            Err(DocstampError::JobRejected { message }) => assert_eq!(message, "no products"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn start_response_without_id_is_protocol_error() {
        let r: StartResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(
            r.into_handle(),
            Err(DocstampError::ProtocolError { .. })
        ));
    }

    #[test]
    fn progress_response_defaults_missing_fields() {
        let r: ProgressResponse = serde_json::from_str("{}").unwrap();
        let s = r.into_snapshot().unwrap();
        assert_eq!(s.progress, 0.0);
        assert!(!s.is_completed);
        assert_eq!(s.status, None);
    }

    #[test]
    fn progress_response_reads_status_fields() {
        let r: ProgressResponse = serde_json::from_str(
            r#"{"success":true,"progress":55,"status":"processing","is_completed":false,"error_message":""}"#,
        )
        .unwrap();
        let s = r.into_snapshot().unwrap();
        assert_eq!(s.progress, 55.0);
        assert_eq!(s.status, Some(JobStatus::Processing));
        assert_eq!(s.error_message, None);
    }

    #[test]
    fn progress_response_unknown_task_is_error() {
        let r: ProgressResponse =
            serde_json::from_str(r#"{"success":false,"message":"任务不存在"}"#).unwrap();
        assert!(r.into_snapshot().is_err());
    }

    #[test]
    fn unknown_probe_reports_zero_not_complete() {
        let probe = ProgressProbe::Unknown {
            reason: "connection refused".into(),
        };
        assert_eq!(probe.reported(), (0.0, false));
        assert!(!probe.is_completed());
    }

    #[test]
    fn file_type_parses() {
        assert_eq!("PDF".parse::<FileType>().unwrap(), FileType::Pdf);
        assert_eq!("stp".parse::<FileType>().unwrap(), FileType::Step);
        assert!("zip".parse::<FileType>().is_err());
    }

    #[tokio::test]
    async fn save_to_dir_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DownloadedArchive {
            filename: "A123_PDF.ZIP".into(),
            bytes: b"PK\x03\x04".to_vec(),
            content_type: Some("application/zip".into()),
        };
        let path = archive.save_to_dir(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("A123_PDF.ZIP"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        assert!(!dir.path().join(".A123_PDF.ZIP.part").exists());
    }
}
