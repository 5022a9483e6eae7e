//! Font loading and glyph outlines for the watermark label.
//!
//! Text is drawn as filled glyph outlines, not through a text renderer:
//! ttf-parser walks each glyph's contours into a tiny-skia path. There is
//! no shaping; each character maps to one glyph and advances by its
//! horizontal metric. That is enough for the fixed Latin and CJK labels.

use crate::config::Language;
use crate::error::DocstampError;
use crate::pipeline::tile::TextMeasure;
use std::path::{Path, PathBuf};
use tiny_skia::{Path as SkPath, PathBuilder};
use ttf_parser::{Face, GlyphId, OutlineBuilder};
use tracing::{debug, warn};

/// Environment variable naming a font file for the label.
pub const FONT_ENV: &str = "DOCSTAMP_FONT";

const LATIN_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    r"C:\Windows\Fonts\arial.ttf",
];

const CJK_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wqy-microhei/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    r"C:\Windows\Fonts\msyh.ttc",
    r"C:\Windows\Fonts\simhei.ttf",
];

/// A parsed-once, owned font file.
#[derive(Clone)]
pub struct LabelFont {
    data: Vec<u8>,
    path: PathBuf,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl LabelFont {
    /// Load a font file and check that it parses.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocstampError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|_| DocstampError::FontUnavailable {
            tried: path.display().to_string(),
        })?;
        Self::from_bytes(data, path.to_path_buf())
    }

    /// Wrap font bytes already in memory. `origin` is only used in messages.
    pub fn from_bytes(data: Vec<u8>, origin: PathBuf) -> Result<Self, DocstampError> {
        Face::parse(&data, 0).map_err(|e| DocstampError::InvalidFont {
            path: origin.clone(),
            detail: e.to_string(),
        })?;
        Ok(Self { data, path: origin })
    }

    /// Find a font for `language`: the explicit path, then `DOCSTAMP_FONT`,
    /// then well-known system fonts.
    pub fn resolve(explicit: Option<&Path>, language: Language) -> Result<Self, DocstampError> {
        let from_env = std::env::var_os(FONT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        resolve_from(explicit, from_env.as_deref(), &system_candidates(language))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// Outline of one line of text as a single path, centred on `(0, 0)`
    /// both horizontally and on the em box vertically (y grows downward).
    ///
    /// Returns `None` when no character of `text` has an outline.
    pub fn centred_line_path(&self, text: &str, px: f32) -> Option<SkPath> {
        let face = self.face()?;
        let scale = px / face.units_per_em().max(1) as f32;
        let width = advance_with(&face, text, px);

        // Baseline sits so the em box is centred on y = 0.
        let ascender = face.ascender() as f32 * scale;
        let descender = face.descender() as f32 * scale;
        let baseline_y = (ascender + descender) / 2.0;

        let mut builder = GlyphPathBuilder::new(scale);
        let mut pen_x = -width / 2.0;
        for ch in text.chars() {
            let gid = face.glyph_index(ch).unwrap_or(GlyphId(0));
            if gid.0 == 0 {
                pen_x += px * 0.5;
                continue;
            }
            builder.origin = (pen_x, baseline_y);
            let _ = face.outline_glyph(gid, &mut builder);
            pen_x += glyph_advance(&face, gid, px);
        }
        builder.finish()
    }

    /// Characters of `text` the font has no glyph for.
    pub fn missing_chars(&self, text: &str) -> Vec<char> {
        let Some(face) = self.face() else {
            return text.chars().collect();
        };
        text.chars()
            .filter(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
            .collect()
    }
}

impl TextMeasure for LabelFont {
    fn advance_width(&self, text: &str, px: f32) -> f32 {
        match self.face() {
            Some(face) => advance_with(&face, text, px),
            None => 0.0,
        }
    }
}

fn advance_with(face: &Face<'_>, text: &str, px: f32) -> f32 {
    text.chars()
        .map(|ch| match face.glyph_index(ch) {
            Some(gid) if gid.0 != 0 => glyph_advance(face, gid, px),
            _ => px * 0.5,
        })
        .sum()
}

fn glyph_advance(face: &Face<'_>, gid: GlyphId, px: f32) -> f32 {
    let units = face.glyph_hor_advance(gid).unwrap_or(0) as f32;
    let adv = units / face.units_per_em().max(1) as f32 * px;
    if adv <= 0.0 {
        px * 0.5
    } else {
        adv
    }
}

fn system_candidates(language: Language) -> Vec<PathBuf> {
    let ordered: Vec<&str> = match language {
        Language::Zh => CJK_CANDIDATES.iter().chain(LATIN_CANDIDATES).copied().collect(),
        Language::En => LATIN_CANDIDATES.iter().chain(CJK_CANDIDATES).copied().collect(),
    };
    ordered.into_iter().map(PathBuf::from).collect()
}

fn resolve_from(
    explicit: Option<&Path>,
    from_env: Option<&Path>,
    candidates: &[PathBuf],
) -> Result<LabelFont, DocstampError> {
    // A font the caller named must work; no silent fallback.
    if let Some(path) = explicit.or(from_env) {
        return LabelFont::load(path);
    }

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match LabelFont::load(path) {
            Ok(font) => {
                debug!("Using label font {}", path.display());
                return Ok(font);
            }
            Err(e) => warn!("Skipping font {}: {}", path.display(), e),
        }
    }

    Err(DocstampError::FontUnavailable {
        tried: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Collects glyph contours into one path, flipping font units (y up) into
/// raster space (y down).
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin: (f32, f32),
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin: (0.0, 0.0),
            scale,
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin.0 + x * self.scale, self.origin.1 - y * self.scale)
    }

    fn finish(self) -> Option<SkPath> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
