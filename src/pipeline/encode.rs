//! Image encoding: stamped raster → PDF image XObject stream.
//!
//! The output page is a picture, so this is where file size is decided.
//! Lossless mode stores Flate-compressed RGB samples, pixel-identical to the
//! stamped raster. JPEG mode stores a baseline JPEG as-is (`DCTDecode`),
//! which PDF viewers decode natively.

use crate::config::ImageEncoding;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, RgbImage, RgbaImage};
use lopdf::{dictionary, Stream};
use std::io::Write;
use tracing::debug;

/// Encode a stamped page raster as an image XObject.
pub fn encode_page(img: &RgbaImage, encoding: ImageEncoding) -> Result<Stream, ImageError> {
    let rgb = flatten_on_white(img);
    let (width, height) = rgb.dimensions();

    let (filter, data) = match encoding {
        ImageEncoding::Lossless => {
            let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
            z.write_all(rgb.as_raw())?;
            ("FlateDecode", z.finish()?)
        }
        ImageEncoding::Jpeg { quality } => {
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
            ("DCTDecode", buf)
        }
    };
    debug!(
        "Encoded {}x{} raster → {} bytes ({})",
        width,
        height,
        data.len(),
        filter
    );

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => filter,
    };
    // Already compressed; keep lopdf from deflating it a second time.
    Ok(Stream::new(dict, data).with_compression(false))
}

/// Drop alpha by compositing over white, like a canvas export would.
fn flatten_on_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = a as u16;
        let over = |c: u8| ((c as u16 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}
