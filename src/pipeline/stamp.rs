//! Paint the tiled watermark onto a page raster.

use crate::error::DocstampError;
use crate::font::LabelFont;
use crate::label::WatermarkLabel;
use crate::pipeline::tile::{
    label_width, TileLayout, FILL_RGBA, FONT_SIZE_PX, LINE_HEIGHT_PX, ROTATION_RADIANS,
};
use image::RgbaImage;
use tiny_skia::{FillRule, IntSize, Paint, Path, Pixmap, Transform};
use tracing::{debug, warn};

/// Pre-built label outlines, reused for every page of a document.
pub struct Stamper {
    lines: Vec<Option<Path>>,
    text_width: f32,
    paint: Paint<'static>,
}

impl Stamper {
    pub fn new(font: &LabelFont, label: &WatermarkLabel) -> Self {
        let lines = label.lines();
        let missing: Vec<char> = lines.iter().flat_map(|l| font.missing_chars(l)).collect();
        if !missing.is_empty() {
            warn!(
                "Font {} has no glyphs for {:?}; they will be left blank",
                font.path().display(),
                missing
            );
        }

        let text_width = label_width(font, &lines);
        let paths = lines
            .iter()
            .map(|l| font.centred_line_path(l, FONT_SIZE_PX))
            .collect();
        Self::from_paths(paths, text_width)
    }

    /// Build from ready-made line outlines centred on the origin.
    pub fn from_paths(lines: Vec<Option<Path>>, text_width: f32) -> Self {
        let (r, g, b, a) = FILL_RGBA;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, (a * 255.0).round() as u8);
        paint.anti_alias = true;
        Self {
            lines,
            text_width,
            paint,
        }
    }

    /// Widest label line in pixels.
    pub fn text_width(&self) -> f32 {
        self.text_width
    }

    /// Stamp `image` and hand it back with the number of tiles painted.
    pub fn stamp(&self, image: RgbaImage) -> Result<(RgbaImage, usize), DocstampError> {
        let (width, height) = image.dimensions();
        let layout = TileLayout::compute(width as f32, height as f32, self.text_width);

        let mut pixmap = to_pixmap(image)?;
        let rotation = Transform::from_rotate(ROTATION_RADIANS.to_degrees());

        for anchor in &layout.anchors {
            for (i, line) in self.lines.iter().enumerate() {
                let Some(path) = line else { continue };
                let ts = rotation.pre_translate(anchor.x, anchor.y + i as f32 * LINE_HEIGHT_PX);
                pixmap.fill_path(path, &self.paint, FillRule::Winding, ts, None);
            }
        }

        debug!(
            "Stamped {}x{} raster with {} tiles (step {:.1})",
            width,
            height,
            layout.anchors.len(),
            layout.step_x
        );
        Ok((from_pixmap(pixmap)?, layout.anchors.len()))
    }
}

/// Straight RGBA → premultiplied pixmap.
fn to_pixmap(image: RgbaImage) -> Result<Pixmap, DocstampError> {
    let (w, h) = image.dimensions();
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| DocstampError::Internal(format!("empty raster {w}x{h}")))?;
    let mut data = image.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a != 255 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
    }
    Pixmap::from_vec(data, size)
        .ok_or_else(|| DocstampError::Internal(format!("pixmap rejected {w}x{h} buffer")))
}

/// Premultiplied pixmap → straight RGBA.
fn from_pixmap(pixmap: Pixmap) -> Result<RgbaImage, DocstampError> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut data = pixmap.take();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a != 0 && a != 255 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
            }
        }
    }
    RgbaImage::from_raw(w, h, data)
        .ok_or_else(|| DocstampError::Internal("raster buffer size mismatch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tiny_skia::{PathBuilder, Rect};

    fn bar(w: f32, h: f32) -> Option<Path> {
        Rect::from_xywh(-w / 2.0, -h / 2.0, w, h).map(PathBuilder::from_rect)
    }

    #[test]
    fn stamping_tints_white_page_red() {
        let stamper = Stamper::from_paths(vec![bar(200.0, 20.0), bar(260.0, 20.0)], 260.0);
        let page = RgbaImage::from_pixel(600, 800, Rgba([255, 255, 255, 255]));

        let (out, tiles) = stamper.stamp(page).unwrap();
        assert!(tiles > 0);
        assert_eq!(out.dimensions(), (600, 800));

        let tinted = out
            .pixels()
            .filter(|p| p[0] >= 250 && p[1] < 200 && p[1] == p[2])
            .count();
        assert!(tinted > 1_000, "only {tinted} tinted pixels");
        // Translucent: never fully red.
        assert!(out.pixels().all(|p| p[1] > 150 && p[3] == 255));
    }

    #[test]
    fn missing_outlines_leave_page_untouched() {
        let stamper = Stamper::from_paths(vec![None, None], 0.0);
        let page = RgbaImage::from_pixel(50, 50, Rgba([10, 20, 30, 255]));
        let (out, _) = stamper.stamp(page.clone()).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn premultiply_round_trip_is_close() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 100, 50, 128]));
        img.put_pixel(1, 0, Rgba([1, 2, 3, 0]));
        let back = from_pixmap(to_pixmap(img).unwrap()).unwrap();
        let p = back.get_pixel(0, 0);
        assert!((p[0] as i16 - 200).abs() <= 2);
        assert!((p[1] as i16 - 100).abs() <= 2);
        assert_eq!(p[3], 128);
        assert_eq!(back.get_pixel(1, 0)[3], 0);
    }

    #[test]
    fn zero_sized_raster_is_an_error() {
        let stamper = Stamper::from_paths(vec![], 0.0);
        assert!(stamper.stamp(RgbaImage::new(0, 0)).is_err());
    }
}
