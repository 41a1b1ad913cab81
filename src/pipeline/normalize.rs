//! Image normalisation: arbitrary colour mode → JPEG file.
//!
//! JPEG has no alpha channel, so transparent and partially transparent
//! pixels must be composited onto an opaque background before encoding —
//! handing an RGBA buffer straight to the encoder would either fail or
//! produce black fringes where the alpha used to be. White is the
//! background of choice because handwriting scans are dark strokes on
//! paper; anything else would invert the document's look inside Paperless.

use crate::error::ItemError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Encode `image` as a JPEG at `path`.
///
/// Alpha-carrying modes are composited over opaque white first; every other
/// mode is converted to RGB and encoded directly. `quality` is the JPEG
/// quality factor, 1–100.
pub fn normalize_to_jpeg(
    image: &DynamicImage,
    path: &Path,
    quality: u8,
) -> Result<(), ItemError> {
    let rgb = if image.color().has_alpha() {
        composite_over_white(image)
    } else {
        image.to_rgb8()
    };

    let file = File::create(path).map_err(|e| ItemError::EncodeFailed {
        detail: format!("{}: {e}", path.display()),
    })?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&rgb)
        .map_err(|e| ItemError::EncodeFailed {
            detail: e.to_string(),
        })?;

    debug!(
        "Normalised {}x{} image → {}",
        rgb.width(),
        rgb.height(),
        path.display()
    );
    Ok(())
}

/// Alpha-blend every pixel onto an opaque white background.
fn composite_over_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u16;
        // out = src·α + white·(1−α), in integer arithmetic.
        let blend = |c: u8| -> u8 { ((c as u16 * a + 255 * (255 - a)) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn encode_and_reload(image: &DynamicImage) -> DynamicImage {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        normalize_to_jpeg(image, &path, 95).unwrap();
        image::open(&path).unwrap()
    }

    #[test]
    fn fully_transparent_pixel_becomes_white() {
        // Transparent red: the colour must not survive, only white.
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 0])));
        let reloaded = encode_and_reload(&img).to_rgb8();
        let px = reloaded.get_pixel(4, 4).0;
        // JPEG is lossy; allow a few counts of slack around pure white.
        for c in px {
            assert!(c >= 245, "expected near-white, got {px:?}");
        }
    }

    #[test]
    fn semi_transparent_black_blends_toward_gray() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 128])));
        let reloaded = encode_and_reload(&img).to_rgb8();
        let px = reloaded.get_pixel(4, 4).0;
        for c in px {
            assert!((100..=160).contains(&c), "expected mid-gray, got {px:?}");
        }
    }

    #[test]
    fn output_carries_no_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 200])));
        let reloaded = encode_and_reload(&img);
        assert!(!reloaded.color().has_alpha());
    }

    #[test]
    fn grayscale_input_encodes_directly() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([90])));
        let reloaded = encode_and_reload(&img).to_rgb8();
        let px = reloaded.get_pixel(4, 4).0;
        for c in px {
            assert!((80..=100).contains(&c), "expected ~90, got {px:?}");
        }
    }

    #[test]
    fn opaque_rgb_survives_roughly_intact() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 50, 120])));
        let reloaded = encode_and_reload(&img).to_rgb8();
        let px = reloaded.get_pixel(4, 4).0;
        assert!(px[0] > 180 && px[1] < 80 && (90..=150).contains(&px[2]), "got {px:?}");
    }

    #[test]
    fn unwritable_path_is_an_item_error() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let err = normalize_to_jpeg(&img, Path::new("/nonexistent-dir/out.jpg"), 95).unwrap_err();
        assert!(matches!(err, ItemError::EncodeFailed { .. }));
    }
}
