//! Input resolution: turn a user-supplied path or URL into a local PDF.
//!
//! pdfium opens documents from the file system, so a URL input is first
//! downloaded into a `TempDir` that lives as long as the [`ResolvedInput`].
//! The `%PDF` magic bytes are checked up front so a wrong file gives a
//! clear error instead of a pdfium failure.

use crate::error::DocstampError;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A PDF that can be handed to pdfium by path.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL or an in-memory buffer, written to a temp directory.
    /// The `TempDir` is held so the file outlives processing.
    Temporary { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Temporary { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DocstampError> {
    if input.trim().is_empty() {
        return Err(DocstampError::InvalidInput {
            input: input.to_string(),
            reason: "empty path".into(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Park an in-memory PDF in a temp directory so pdfium can open it.
pub async fn stage_bytes(bytes: &[u8]) -> Result<ResolvedInput, DocstampError> {
    let path_hint = PathBuf::from("<memory>");
    check_magic(bytes, &path_hint)?;

    let temp_dir = TempDir::new().map_err(|e| DocstampError::Internal(e.to_string()))?;
    let path = temp_dir.path().join("input.pdf");
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| DocstampError::Internal(format!("Failed to write temp file: {}", e)))?;

    debug!("Staged {} bytes at {}", bytes.len(), path.display());
    Ok(ResolvedInput::Temporary {
        path,
        _temp_dir: temp_dir,
    })
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, DocstampError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(DocstampError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(DocstampError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocstampError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocstampError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DocstampError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocstampError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocstampError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocstampError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocstampError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| DocstampError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocstampError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&bytes, &file_path)?;
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DocstampError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());
    Ok(ResolvedInput::Temporary {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), DocstampError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(DocstampError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last path segment of a URL, percent-decoded, if it looks like a file name.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                let decoded = percent_decode_str(last).decode_utf8_lossy();
                // An encoded separator must not smuggle in a directory.
                let name = decoded.rsplit(['/', '\\']).next().unwrap_or("").trim();
                if !name.is_empty() && name.contains('.') {
                    return name.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
