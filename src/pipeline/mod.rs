//! Pipeline stages of the watermark flow.
//!
//! Each submodule implements one step; [`crate::watermark`] strings them
//! together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ stamp ──▶ encode ──▶ assemble
//! (URL/path)  (pdfium)  (tile)   (XObject)   (lopdf)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`]   — rasterise selected pages at 2×; blocking, one page at a time
//! 3. [`stamp`]    — paint the label on the [`tile`] grid
//! 4. [`encode`]   — compress the stamped raster into an image stream
//! 5. [`assemble`] — add one full-bleed page per image and serialise
//!
//! [`pdfium`] locates and binds the native library used by `render`.

pub mod assemble;
pub mod encode;
pub mod input;
pub mod pdfium;
pub mod render;
pub mod stamp;
pub mod tile;
