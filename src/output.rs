//! Result types of the watermark flow.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// A stamped document held in memory.
#[derive(Debug, Clone)]
pub struct WatermarkOutput {
    /// The assembled PDF.
    pub pdf: Vec<u8>,
    /// One entry per page that made it into the output, in page order.
    pub pages: Vec<PageSummary>,
    /// Pages left out because they failed (only with `skip_failed_pages`).
    pub errors: Vec<PageError>,
    pub stats: WatermarkStats,
}

/// What happened to one source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Output page size in points (source size × 2).
    pub width_pt: f32,
    pub height_pt: f32,
    pub raster_width: u32,
    pub raster_height: u32,
    /// Number of label tiles painted on the page.
    pub tiles: usize,
}

/// Summary numbers for a stamped document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkStats {
    /// Pages in the source document.
    pub total_pages: usize,
    pub stamped_pages: usize,
    pub failed_pages: usize,
    /// Time spent rendering, stamping and encoding pages.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    pub output_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialise_for_json_output() {
        let stats = WatermarkStats {
            total_pages: 3,
            stamped_pages: 3,
            output_bytes: 1024,
            ..Default::default()
        };
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["stamped_pages"], 3);
        assert_eq!(v["failed_pages"], 0);
    }
}
