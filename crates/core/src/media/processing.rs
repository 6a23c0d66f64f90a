//! Image normalisation and thumbnail generation.
//!
//! Raster uploads (JPEG, PNG, WebP) are flattened onto a white background,
//! shrunk to fit the configured bounds and re-encoded in their original
//! format. GIF and SVG are stored untouched.
//!
//! Decoding and encoding are CPU-bound, so async callers go through
//! [`ImageProcessor::process_async`], which runs on the blocking pool.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    pub max_width: u32,
    pub max_height: u32,
    pub thumbnail_size: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            thumbnail_size: 300,
            quality: 85,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub resized: bool,
    pub thumbnail: Bytes,
}

impl ProcessedImage {
    pub fn format_name(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            _ => "unknown",
        }
    }
}

fn image_error(err: image::ImageError) -> CoreError {
    CoreError::Image(err.to_string())
}

/// Composite transparent pixels over white.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

impl ImageProcessor {
    /// Formats this processor re-encodes.
    pub fn handles(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)
    }

    /// Normalise `data`. Returns `Ok(None)` for content that is not a
    /// re-encodable raster image.
    pub fn process(&self, data: &[u8]) -> CoreResult<Option<ProcessedImage>> {
        let format = match image::guess_format(data) {
            Ok(f) if Self::handles(f) => f,
            _ => return Ok(None),
        };

        let decoded = image::load_from_memory_with_format(data, format).map_err(image_error)?;
        let (orig_w, orig_h) = decoded.dimensions();

        let rgb = if decoded.color().has_alpha() {
            DynamicImage::ImageRgb8(flatten_onto_white(&decoded))
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };

        let resized = orig_w > self.max_width || orig_h > self.max_height;
        let normalised = if resized {
            rgb.resize(self.max_width, self.max_height, FilterType::Lanczos3)
        } else {
            rgb
        };
        let (width, height) = normalised.dimensions();

        // Never enlarge: small images are their own thumbnail.
        let thumb = if width > self.thumbnail_size || height > self.thumbnail_size {
            normalised.thumbnail(self.thumbnail_size, self.thumbnail_size)
        } else {
            normalised.clone()
        };

        debug!(
            original_width = orig_w,
            original_height = orig_h,
            width,
            height,
            "processed image"
        );

        Ok(Some(ProcessedImage {
            data: Bytes::from(self.encode(&normalised, format)?),
            width,
            height,
            format,
            resized,
            thumbnail: Bytes::from(self.encode(&thumb, format)?),
        }))
    }

    pub async fn process_async(&self, data: Bytes) -> CoreResult<Option<ProcessedImage>> {
        let processor = *self;
        tokio::task::spawn_blocking(move || processor.process(&data))
            .await
            .map_err(|e| CoreError::Image(format!("image task failed: {e}")))?
    }

    fn encode(&self, img: &DynamicImage, format: ImageFormat) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
                img.write_with_encoder(encoder).map_err(image_error)?;
            }
            other => img
                .write_to(&mut Cursor::new(&mut buf), other)
                .map_err(image_error)?,
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn shrinks_oversized_images_keeping_aspect_ratio() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2560, 640, Rgba([10, 20, 30, 255]))),
            ImageFormat::Png,
        );
        let out = ImageProcessor::default().process(&png).unwrap().unwrap();
        assert!(out.resized);
        assert_eq!((out.width, out.height), (2048, 512));
        assert_eq!(out.format, ImageFormat::Png);

        let thumb = image::load_from_memory(&out.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (300, 75));
    }

    #[test]
    fn small_images_keep_their_size() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([200, 100, 50]))),
            ImageFormat::Jpeg,
        );
        let out = ImageProcessor::default().process(&jpeg).unwrap().unwrap();
        assert!(!out.resized);
        assert_eq!((out.width, out.height), (120, 80));
        assert_eq!(out.format_name(), "jpeg");
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::Jpeg);

        let thumb = image::load_from_memory(&out.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (120, 80));
    }

    #[test]
    fn thumbnail_bounds_only_the_long_side() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 200, Rgb([9, 9, 9]))),
            ImageFormat::Png,
        );
        let out = ImageProcessor::default().process(&png).unwrap().unwrap();
        assert!(!out.resized);
        let thumb = image::load_from_memory(&out.thumbnail).unwrap();
        assert_eq!(thumb.dimensions(), (300, 100));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]))),
            ImageFormat::Png,
        );
        let out = ImageProcessor::default().process(&png).unwrap().unwrap();
        let decoded = image::load_from_memory(&out.data).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn non_images_and_gifs_are_skipped() {
        assert!(ImageProcessor::default()
            .process(b"plain text, not an image")
            .unwrap()
            .is_none());

        let gif = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))),
            ImageFormat::Gif,
        );
        assert!(ImageProcessor::default().process(&gif).unwrap().is_none());
    }

    #[test]
    fn truncated_image_is_an_error() {
        let mut png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3]))),
            ImageFormat::Png,
        );
        png.truncate(40);
        assert!(matches!(
            ImageProcessor::default().process(&png),
            Err(CoreError::Image(_))
        ));
    }

    #[tokio::test]
    async fn async_processing_runs_on_blocking_pool() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([1, 2, 3]))),
            ImageFormat::Png,
        );
        let out = ImageProcessor::default()
            .process_async(Bytes::from(png))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((out.width, out.height), (10, 10));
    }
}
