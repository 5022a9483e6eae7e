//! Watermark tile geometry.
//!
//! The label is painted in a rotated frame: the raster is rotated by
//! [`ROTATION_RADIANS`] and text is laid out on an axis-aligned grid in that
//! frame. The horizontal step grows with the label so rotated tiles never
//! overlap; the vertical step is fixed.
//!
//! Everything here is pure arithmetic over `f32` so it can be tested
//! without a font or a raster.

use std::f32::consts::FRAC_PI_6;

/// Canvas-convention rotation of the label frame (−30°).
pub const ROTATION_RADIANS: f32 = -FRAC_PI_6;
pub const FONT_SIZE_PX: f32 = 24.0;
pub const LINE_HEIGHT_PX: f32 = 50.0;
pub const MIN_STEP_X: f32 = 300.0;
pub const STEP_Y: f32 = 250.0;
pub const PAD_X: f32 = 200.0;
pub const PAD_TOP: f32 = 100.0;
pub const PAD_BOTTOM: f32 = 200.0;
/// Label colour, straight (non-premultiplied) RGBA.
pub const FILL_RGBA: (u8, u8, u8, f32) = (255, 0, 0, 0.3);

/// Measures rendered text. Implemented by the loaded font; tests use a
/// fixed-width stand-in.
pub trait TextMeasure {
    /// Horizontal advance of `text` at `px` pixels per em.
    fn advance_width(&self, text: &str, px: f32) -> f32;
}

/// Widest line of the label at the watermark font size.
pub fn label_width<M: TextMeasure + ?Sized>(measure: &M, lines: &[String]) -> f32 {
    lines
        .iter()
        .map(|l| measure.advance_width(l, FONT_SIZE_PX))
        .fold(0.0, f32::max)
}

/// Horizontal grid step for a label `text_width` pixels wide.
///
/// The width is projected onto the rotated axis (`w / cos 30°`) and given
/// 20 % breathing room. Never below [`MIN_STEP_X`]. Negative or NaN widths
/// count as zero.
pub fn tile_step_x(text_width: f32) -> f32 {
    let w = if text_width.is_finite() {
        text_width.max(0.0)
    } else if text_width == f32::INFINITY {
        return f32::INFINITY;
    } else {
        0.0
    };
    let rotated = w / FRAC_PI_6.cos();
    MIN_STEP_X.max(rotated * 1.2)
}

/// A grid point in the rotated frame. Line `i` of the label is centred on
/// `(x, y + i × LINE_HEIGHT_PX)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Anchor grid for one raster.
#[derive(Debug, Clone)]
pub struct TileLayout {
    pub step_x: f32,
    pub step_y: f32,
    /// Half-open `[start, end)` extent of the grid along x in the rotated frame.
    pub x_range: (f32, f32),
    /// Half-open `[start, end)` extent of the grid along y in the rotated frame.
    pub y_range: (f32, f32),
    pub anchors: Vec<Anchor>,
}

impl TileLayout {
    /// Lay out anchors for a `width` × `height` raster.
    ///
    /// The grid spans `[-PAD_X, width + PAD_X)` by
    /// `[-PAD_TOP, height + PAD_BOTTOM)`, widened where needed so it also
    /// covers the raster's corners as seen from the rotated frame. The
    /// widened grid keeps the same phase, so every anchor of the narrow
    /// grid is still present.
    pub fn compute(width: f32, height: f32, text_width: f32) -> Self {
        let step_x = tile_step_x(text_width);
        let step_y = STEP_Y;
        let (bx0, by0, bx1, by1) = rotated_frame_bounds(width, height);

        let x_range = (
            phase_aligned_start(-PAD_X, bx0 - PAD_X, step_x),
            (width + PAD_X).max(bx1 + PAD_X),
        );
        let y_range = (
            phase_aligned_start(-PAD_TOP, by0 - PAD_TOP, step_y),
            (height + PAD_BOTTOM).max(by1 + PAD_BOTTOM),
        );

        let mut anchors = Vec::new();
        if step_x.is_finite() {
            let mut x = x_range.0;
            while x < x_range.1 {
                let mut y = y_range.0;
                while y < y_range.1 {
                    anchors.push(Anchor { x, y });
                    y += step_y;
                }
                x += step_x;
            }
        }

        Self {
            step_x,
            step_y,
            x_range,
            y_range,
            anchors,
        }
    }
}

/// Bounding box of the raster `[0, w] × [0, h]` expressed in the rotated
/// frame, as `(min_x, min_y, max_x, max_y)`.
fn rotated_frame_bounds(width: f32, height: f32) -> (f32, f32, f32, f32) {
    // Device = R(θ)·frame, so frame = R(−θ)·device.
    let (sin, cos) = (-ROTATION_RADIANS).sin_cos();
    let corners = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)];
    corners.iter().fold(
        (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
        |(x0, y0, x1, y1), &(x, y)| {
            let fx = x * cos - y * sin;
            let fy = x * sin + y * cos;
            (x0.min(fx), y0.min(fy), x1.max(fx), y1.max(fy))
        },
    )
}

/// First grid coordinate at or below `wanted` that lies on the lattice
/// through `origin` with spacing `step`.
fn phase_aligned_start(origin: f32, wanted: f32, step: f32) -> f32 {
    if wanted >= origin || !step.is_finite() {
        return origin;
    }
    let steps_back = ((origin - wanted) / step).ceil();
    origin - steps_back * step
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Monospace(f32);

    impl TextMeasure for Monospace {
        fn advance_width(&self, text: &str, px: f32) -> f32 {
            text.chars().count() as f32 * px * self.0
        }
    }

    #[test]
    fn step_never_below_minimum() {
        for w in [0.0, 1.0, 50.0, 100.0, 216.0, -5.0, f32::NAN] {
            assert!(tile_step_x(w) >= MIN_STEP_X, "width {w}");
        }
    }

    #[test]
    fn step_covers_rotated_width() {
        let cos30 = (30f32).to_radians().cos();
        for w in [0.0, 150.0, 216.5, 217.0, 400.0, 1_000.0, 12_345.6] {
            let step = tile_step_x(w);
            assert!(step >= MIN_STEP_X);
            let needed = 1.2 * w / cos30;
            assert!(step >= needed * (1.0 - 1e-5), "width {w} step {step}");
        }
    }

    #[test]
    fn wide_label_drives_step() {
        // 400 / cos30 * 1.2 ≈ 554.3
        let step = tile_step_x(400.0);
        assert!((step - 554.26).abs() < 0.1, "{step}");
    }

    #[test]
    fn label_width_takes_widest_line() {
        let m = Monospace(0.5);
        let lines = ["abcd".to_string(), "abcdefgh".to_string()];
        assert_eq!(label_width(&m, &lines), 8.0 * FONT_SIZE_PX * 0.5);
    }

    #[test]
    fn anchors_stay_within_padded_range() {
        let layout = TileLayout::compute(1190.0, 1684.0, 300.0);
        assert!(!layout.anchors.is_empty());
        for a in &layout.anchors {
            assert!(a.x >= layout.x_range.0 && a.x < layout.x_range.1);
            assert!(a.y >= layout.y_range.0 && a.y < layout.y_range.1);
        }
        assert!(layout.x_range.0 <= -PAD_X);
        assert!(layout.x_range.1 >= 1190.0 + PAD_X);
        assert!(layout.y_range.0 <= -PAD_TOP);
        assert!(layout.y_range.1 >= 1684.0 + PAD_BOTTOM);
    }

    #[test]
    fn narrow_grid_anchors_are_kept() {
        let (w, h) = (800.0, 600.0);
        let layout = TileLayout::compute(w, h, 100.0);
        let mut x = -PAD_X;
        while x < w + PAD_X {
            let mut y = -PAD_TOP;
            while y < h + PAD_BOTTOM {
                assert!(
                    layout
                        .anchors
                        .iter()
                        .any(|a| (a.x - x).abs() < 1e-2 && (a.y - y).abs() < 1e-2),
                    "missing ({x}, {y})"
                );
                y += STEP_Y;
            }
            x += MIN_STEP_X;
        }
    }

    #[test]
    fn every_raster_corner_is_inside_grid() {
        let (w, h) = (1190.0, 1684.0);
        let layout = TileLayout::compute(w, h, 0.0);
        let (bx0, by0, bx1, by1) = rotated_frame_bounds(w, h);
        assert!(layout.x_range.0 <= bx0 && layout.x_range.1 >= bx1);
        assert!(layout.y_range.0 <= by0 && layout.y_range.1 >= by1);
    }

    #[test]
    fn consecutive_anchors_use_the_steps() {
        let layout = TileLayout::compute(500.0, 500.0, 0.0);
        let a = layout.anchors[0];
        let b = layout.anchors[1];
        assert_eq!(a.x, b.x);
        assert!((b.y - a.y - STEP_Y).abs() < 1e-3);
    }
}
