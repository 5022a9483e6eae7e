//! PDF rasterisation via pdfium, one page at a time.
//!
//! pdfium is not async-safe, so everything here is blocking and meant to be
//! called from inside `tokio::task::spawn_blocking`. Pages are handed to a
//! sink as soon as they are rendered and dropped before the next page is
//! rendered, so at most one raster is alive at a time.

use crate::config::PageSelection;
use crate::error::DocstampError;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Fixed rasterisation scale: 1 pt → 2 px.
pub const RENDER_SCALE: f32 = 2.0;

/// A rendered page, owned by the sink until it drops it.
#[derive(Debug)]
pub struct RenderedPage {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Source page size in points.
    pub width_pt: f32,
    pub height_pt: f32,
    pub image: RgbaImage,
}

/// Events delivered to the page sink, in document order.
#[derive(Debug)]
pub enum PageEvent {
    /// The document opened. `selected` pages will follow.
    Opened { total_pages: usize, selected: usize },
    Rendered(RenderedPage),
    /// A selected page could not be rendered.
    Failed { page_num: usize, error: DocstampError },
}

/// Open `pdf_path` and feed every selected page to `sink`.
///
/// The sink's first error stops rendering and is returned as-is.
pub fn render_each_page<F>(
    pdfium: &Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
    mut sink: F,
) -> Result<(), DocstampError>
where
    F: FnMut(PageEvent) -> Result<(), DocstampError>,
{
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let indices = selection.to_indices(total_pages);
    info!("PDF loaded: {} pages, {} selected", total_pages, indices.len());

    sink(PageEvent::Opened {
        total_pages,
        selected: indices.len(),
    })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);

    for idx in indices {
        let page_num = idx + 1;
        let rendered = pages
            .get(idx as u16)
            .map_err(|e| DocstampError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })
            .and_then(|page| {
                let width_pt = page.width().value;
                let height_pt = page.height().value;
                let bitmap = page.render_with_config(&render_config).map_err(|e| {
                    DocstampError::RasterisationFailed {
                        page: page_num,
                        detail: format!("{:?}", e),
                    }
                })?;
                Ok(RenderedPage {
                    page_num,
                    width_pt,
                    height_pt,
                    image: bitmap.as_image().into_rgba8(),
                })
            });

        match rendered {
            Ok(page) => {
                debug!(
                    "Rendered page {} ({}x{} pt) → {}x{} px",
                    page_num,
                    page.width_pt,
                    page.height_pt,
                    page.image.width(),
                    page.image.height()
                );
                sink(PageEvent::Rendered(page))?;
            }
            Err(error) => sink(PageEvent::Failed { page_num, error })?,
        }
    }

    Ok(())
}

/// Expected raster size of a page at [`RENDER_SCALE`].
pub fn raster_size(width_pt: f32, height_pt: f32) -> (u32, u32) {
    (
        (width_pt * RENDER_SCALE).round().max(1.0) as u32,
        (height_pt * RENDER_SCALE).round().max(1.0) as u32,
    )
}

/// Size in points of a page's 2× viewport, which is also the output page size.
pub fn viewport_size(width_pt: f32, height_pt: f32) -> (f32, f32) {
    (width_pt * RENDER_SCALE, height_pt * RENDER_SCALE)
}

fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> DocstampError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            DocstampError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            DocstampError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        DocstampError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}
