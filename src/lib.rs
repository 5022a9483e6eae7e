//! # docstamp
//!
//! Client-side tooling for a product-document server: fetch compressed
//! document bundles and stamp PDFs with a visible reference watermark.
//!
//! ## Two flows
//!
//! ```text
//! Compression download
//!  ├─ start     POST /async_compression/start/      → job handle
//!  ├─ poll      GET  /async_compression/progress/   every 2 s, ≤ 10 re-polls
//!  └─ download  POST /async_compression/download/   → archive bytes
//!
//! Watermark
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    rasterise each page at 2× via pdfium (spawn_blocking)
//!  ├─ 3. Stamp     tile a rotated two-line label over the raster
//!  ├─ 4. Encode    raster → Flate or JPEG image XObject
//!  └─ 5. Assemble  one full-bleed image per page in a fresh PDF
//! ```
//!
//! The two flows share nothing but the error type and the language enum.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docstamp::{watermark_to_file, Language, WatermarkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WatermarkConfig::builder()
//!         .language(Language::En)
//!         .user("j.doe")
//!         .build()?;
//!     let stats = watermark_to_file("drawing.pdf", "drawing_watermarked.pdf", &config).await?;
//!     eprintln!("{} pages stamped", stats.stamped_pages);
//!     Ok(())
//! }
//! ```
//!
//! ```rust,no_run
//! use docstamp::{
//!     start_and_download, CompressionConfig, FileType, HttpCompressionClient, Language,
//!     NoopProgressCallback, StartRequest,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompressionConfig::builder("https://parts.example.com")
//!     .csrf_token("token-from-the-login-page")
//!     .session_cookie("sessionid-value")
//!     .build()?;
//! let client = HttpCompressionClient::new(config.clone())?;
//! let request = StartRequest::new(["101", "102"], FileType::Pdf, Language::En);
//! let (_job, archive) =
//!     start_and_download(&client, &request, config.poll, &NoopProgressCallback).await?;
//! archive.save_to_dir(".").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docstamp` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Runtime requirements
//!
//! * A pdfium shared library, found through `PDFIUM_LIB_PATH` or the system
//!   library path.
//! * A TrueType/OpenType font for the label: `WatermarkConfig::font_path`,
//!   `DOCSTAMP_FONT`, or one of the common system fonts. Chinese labels need
//!   a CJK-capable font.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compression;
pub mod config;
pub mod error;
pub mod font;
pub mod label;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod watermark;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compression::{
    check_progress, download_when_ready, probe_progress, start_and_download, CompressionService,
    DownloadedArchive, FileType, HttpCompressionClient, JobHandle, JobStatus, ProgressProbe,
    ProgressSnapshot, StartRequest,
};
pub use config::{
    CompressionConfig, CompressionConfigBuilder, ImageEncoding, Language, PageSelection,
    PollPolicy, WatermarkConfig, WatermarkConfigBuilder,
};
pub use error::{DocstampError, PageError};
pub use label::WatermarkLabel;
pub use output::{PageSummary, WatermarkOutput, WatermarkStats};
pub use progress::{
    DownloadObserver, NoopProgressCallback, WatermarkCallback, WatermarkProgressCallback,
};
pub use watermark::{
    default_output_name, watermark_from_bytes, watermark_pdf, watermark_sync, watermark_to_file,
};
