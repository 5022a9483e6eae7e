//! Error types for the docstamp library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocstampError`] — **Fatal**: the operation is abandoned (bad input
//!   file, server refused the job, poll loop timed out, no usable font).
//!   Returned as `Err(DocstampError)` from every public entry point.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be rendered or
//!   stamped while `skip_failed_pages` is enabled. Stored in
//!   [`crate::output::WatermarkOutput`] so callers can see which pages were
//!   left out of the assembled document.
//!
//! Status polling is the one place where failures are *not* surfaced as
//! errors: a failed probe is reported as a value (see
//! [`crate::compression::ProgressProbe`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docstamp library.
#[derive(Debug, Error)]
pub enum DocstampError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL, or a request was
    /// built from unusable arguments.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Writing the output document failed.
    #[error("Failed to assemble output PDF: {0}")]
    AssemblyFailed(String),

    // ── Watermark errors ──────────────────────────────────────────────────
    /// No font file could be loaded for drawing the watermark label.
    #[error(
        "No usable font for the watermark label (tried: {tried}).\n\
Pass --font /path/to/font.ttf or set DOCSTAMP_FONT."
    )]
    FontUnavailable { tried: String },

    /// A font file was found but could not be parsed.
    #[error("Font '{path}' could not be parsed: {detail}")]
    InvalidFont { path: PathBuf, detail: String },

    // ── Compression service errors ────────────────────────────────────────
    /// The server declined to start the compression job.
    #[error("Compression job was rejected by the server: {message}")]
    JobRejected { message: String },

    /// The server reported that the job failed.
    #[error("Compression job failed on the server: {message}")]
    JobFailed { message: String },

    /// The job did not complete within the bounded number of re-polls.
    #[error("Compression job did not complete after {attempts} status checks.\nTry again later.")]
    PollTimedOut { attempts: u32 },

    /// The download endpoint answered with a JSON refusal instead of a file.
    #[error("Download refused by the server: {message}")]
    DownloadRejected { message: String },

    /// A request could not be sent or its response could not be read.
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// A request exceeded the configured timeout.
    #[error("Request to {endpoint} timed out after {secs}s")]
    RequestTimeout { endpoint: String, secs: u64 },

    /// The server answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The server answered with a body that does not match the protocol.
    #[error("Unexpected response from {endpoint}: {detail}")]
    ProtocolError { endpoint: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
(prebuilt binaries: https://github.com/bblanchon/pdfium-binaries/releases)."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Only produced when [`crate::config::WatermarkConfig::skip_failed_pages`]
/// is set; otherwise the first page failure aborts the whole document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Painting the watermark onto the raster failed.
    #[error("Page {page}: stamping failed: {detail}")]
    StampFailed { page: usize, detail: String },

    /// Turning the stamped raster into an embedded image failed.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The encoded image could not be added as an output page.
    #[error("Page {page}: could not be added to the output: {detail}")]
    EmbedFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed source page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::StampFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::EmbedFailed { page, .. } => *page,
        }
    }
}
