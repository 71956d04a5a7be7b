//! Image encoding: `DynamicImage` → base64 PNG data URI.
//!
//! The Responses API takes images as `image_url` strings, and a
//! `data:image/png;base64,…` URI lets the pixels travel inside the JSON body
//! with no upload step. PNG is lossless, so rendered text stays crisp.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a raster as a base64 PNG data URI.
pub fn encode_data_uri(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(format!("data:image/png;base64,{b64}"))
}

/// Decode an uploaded file's bytes into pixels.
///
/// The format is sniffed from the content, not trusted from the file name.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let uri = encode_data_uri(&img).expect("encode should succeed");
        let b64 = uri
            .strip_prefix("data:image/png;base64,")
            .expect("png data uri prefix");
        let decoded = STANDARD.decode(b64).expect("valid base64");
        // PNG signature
        assert_eq!(&decoded[..4], b"\x89PNG");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
