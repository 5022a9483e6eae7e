//! Watermark entry points.
//!
//! Every selected page goes through the same steps, strictly one page at a
//! time inside a single blocking task:
//!
//! ```text
//! render (2×) ──▶ stamp tiles ──▶ encode XObject ──▶ append page
//! ```
//!
//! The output is a flattened raster PDF: each page is one image sized to
//! the source page's 2× viewport.

use crate::config::{ImageEncoding, WatermarkConfig};
use crate::error::{DocstampError, PageError};
use crate::font::LabelFont;
use crate::label::WatermarkLabel;
use crate::output::{PageSummary, WatermarkOutput, WatermarkStats};
use crate::pipeline::assemble::PdfAssembler;
use crate::pipeline::encode::encode_page;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::pdfium::bind_pdfium;
use crate::pipeline::render::{render_each_page, viewport_size, PageEvent, RenderedPage};
use crate::pipeline::stamp::Stamper;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Stamp a PDF file or URL and return the result in memory.
///
/// # Errors
/// Any page failure is fatal unless `config.skip_failed_pages` is set, in
/// which case the page is left out and listed in
/// [`WatermarkOutput::errors`]. A document where no page survives is
/// always an error.
pub async fn watermark_pdf(
    input_str: impl AsRef<str>,
    config: &WatermarkConfig,
) -> Result<WatermarkOutput, DocstampError> {
    let input_str = input_str.as_ref();
    info!("Watermarking: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(resolved, config).await
}

/// Stamp PDF bytes already in memory.
pub async fn watermark_from_bytes(
    bytes: &[u8],
    config: &WatermarkConfig,
) -> Result<WatermarkOutput, DocstampError> {
    let staged = input::stage_bytes(bytes).await?;
    run(staged, config).await
}

/// Stamp a PDF and write the result to `output_path`.
///
/// Uses atomic write (temp file + rename) so a half-written PDF never
/// appears under the final name.
pub async fn watermark_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &WatermarkConfig,
) -> Result<WatermarkStats, DocstampError> {
    let output = watermark_pdf(input_str, config).await?;
    let path = output_path.as_ref();
    let write_err = |source| DocstampError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), output.pdf.len());
    Ok(output.stats)
}

/// Synchronous wrapper around [`watermark_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn watermark_sync(
    input_str: impl AsRef<str>,
    config: &WatermarkConfig,
) -> Result<WatermarkOutput, DocstampError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocstampError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(watermark_pdf(input_str, config))
}

/// File name for the stamped copy of `input_str`: `<stem>_watermarked.pdf`.
///
/// URLs use their last path segment.
pub fn default_output_name(input_str: &str) -> String {
    let name = if input::is_url(input_str) {
        input::filename_from_url(input_str)
    } else {
        input_str.to_string()
    };
    let stem = Path::new(&name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{stem}_watermarked.pdf")
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    resolved: ResolvedInput,
    config: &WatermarkConfig,
) -> Result<WatermarkOutput, DocstampError> {
    let total_start = Instant::now();
    let label = match config.timestamp {
        Some(ts) => WatermarkLabel::new(config.language, config.user.as_deref(), ts),
        None => WatermarkLabel::now(config.language, config.user.as_deref()),
    };

    let path = resolved.path().to_path_buf();
    let cfg = config.clone();
    let mut output = tokio::task::spawn_blocking(move || stamp_document(&path, &cfg, &label))
        .await
        .map_err(|e| DocstampError::Internal(format!("Watermark task panicked: {}", e)))??;
    // The temp copy of a URL or byte input lives until here.
    drop(resolved);

    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Watermark complete: {}/{} pages, {} bytes, {}ms total",
        output.stats.stamped_pages,
        output.stats.total_pages,
        output.stats.output_bytes,
        output.stats.total_duration_ms
    );
    Ok(output)
}

/// Blocking body of the pipeline. Runs inside `spawn_blocking`.
fn stamp_document(
    pdf_path: &Path,
    config: &WatermarkConfig,
    label: &WatermarkLabel,
) -> Result<WatermarkOutput, DocstampError> {
    let font = LabelFont::resolve(config.font_path.as_deref(), config.language)?;
    let stamper = Stamper::new(&font, label);
    let pdfium = bind_pdfium()?;

    let render_start = Instant::now();
    let callback = config.progress_callback.as_ref();
    let mut assembler = PdfAssembler::new();
    let mut pages: Vec<PageSummary> = Vec::new();
    let mut errors: Vec<PageError> = Vec::new();
    let mut total_pages = 0;
    let mut selected = 0;

    render_each_page(
        &pdfium,
        pdf_path,
        config.password.as_deref(),
        &config.pages,
        |event| match event {
            PageEvent::Opened {
                total_pages: total,
                selected: count,
            } => {
                total_pages = total;
                selected = count;
                if count == 0 {
                    return Err(DocstampError::PageOutOfRange { page: 0, total });
                }
                if let Some(cb) = callback {
                    cb.on_document_start(count);
                }
                Ok(())
            }
            PageEvent::Rendered(page) => {
                let page_num = page.page_num;
                match stamp_page(&stamper, &mut assembler, page, config.encoding) {
                    Ok(summary) => {
                        pages.push(summary);
                        if let Some(cb) = callback {
                            cb.on_page_complete(page_num, selected);
                        }
                        Ok(())
                    }
                    Err(err) => skip_or_abort(config, err, selected, &mut errors),
                }
            }
            PageEvent::Failed { page_num, error } => {
                let err = PageError::RenderFailed {
                    page: page_num,
                    detail: error.to_string(),
                };
                if !config.skip_failed_pages {
                    return Err(error);
                }
                skip_or_abort(config, err, selected, &mut errors)
            }
        },
    )?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if let Some(cb) = callback {
        cb.on_document_complete(selected, pages.len());
    }
    if pages.is_empty() {
        return Err(DocstampError::AssemblyFailed(format!(
            "all {} selected pages failed",
            selected
        )));
    }

    let pdf = assembler.finish()?;
    let stats = WatermarkStats {
        total_pages,
        stamped_pages: pages.len(),
        failed_pages: errors.len(),
        render_duration_ms,
        total_duration_ms: 0,
        output_bytes: pdf.len(),
    };

    Ok(WatermarkOutput {
        pdf,
        pages,
        errors,
        stats,
    })
}

/// Stamp one rendered page, encode it and append it to the output.
///
/// Nothing is added to `assembler` unless every step succeeds.
fn stamp_page(
    stamper: &Stamper,
    assembler: &mut PdfAssembler,
    page: RenderedPage,
    encoding: ImageEncoding,
) -> Result<PageSummary, PageError> {
    let page_num = page.page_num;
    let (raster_width, raster_height) = page.image.dimensions();

    let (stamped, tiles) = stamper
        .stamp(page.image)
        .map_err(|e| PageError::StampFailed {
            page: page_num,
            detail: e.to_string(),
        })?;
    let stream = encode_page(&stamped, encoding).map_err(|e| PageError::EncodeFailed {
        page: page_num,
        detail: e.to_string(),
    })?;
    drop(stamped);

    let (width_pt, height_pt) = viewport_size(page.width_pt, page.height_pt);
    assembler
        .add_image_page(stream, width_pt, height_pt)
        .map_err(|e| PageError::EmbedFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

    Ok(PageSummary {
        page_num,
        width_pt,
        height_pt,
        raster_width,
        raster_height,
        tiles,
    })
}

/// Record a failed page and carry on, or turn it into a fatal error.
fn skip_or_abort(
    config: &WatermarkConfig,
    err: PageError,
    selected: usize,
    errors: &mut Vec<PageError>,
) -> Result<(), DocstampError> {
    let page = err.page();
    if !config.skip_failed_pages {
        return Err(DocstampError::AssemblyFailed(err.to_string()));
    }
    warn!("Skipping page {}: {}", page, err);
    if let Some(cb) = config.progress_callback.as_ref() {
        cb.on_page_error(page, selected, &err.to_string());
    }
    errors.push(err);
    Ok(())
}
