//! Raster image validation, re-encoding and thumbnail generation.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use imghost_common::{Error, Result};

use crate::config::ImageConfig;

/// Largest accepted width or height in pixels.
pub const MAX_DIMENSION: u32 = 20_000;

/// What validation learned about an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Per-upload processing choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Re-encode as WebP (GIF sources keep their format).
    pub compress_to_webp: bool,
    /// Encoder quality, 10-100. Applies to lossy outputs.
    pub quality: u8,
    /// Stamp a watermark banner in the bottom-right corner.
    pub watermark: Option<String>,
}

/// Result of [`ImageProcessor::process`].
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub mime: String,
    /// File extension without the dot.
    pub extension: String,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Image pipeline used by uploads. Implementations are pure functions of
/// their input and may be slow; call them off the async executor.
pub trait ImageProcessor: Send + Sync {
    /// Check size, format and dimensions without fully decoding.
    fn validate(&self, data: &[u8]) -> Result<ImageMetadata>;

    /// Produce the stored version of an upload.
    fn process(&self, data: &[u8], options: &ProcessOptions) -> Result<ProcessedImage>;

    /// Produce a WebP thumbnail.
    fn thumbnail(&self, data: &[u8]) -> Result<Bytes>;
}

/// [`ImageProcessor`] built on the `image` crate.
pub struct RasterProcessor {
    max_file_size: u64,
    thumbnail_size: u32,
}

impl RasterProcessor {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            thumbnail_size: config.thumbnail_size,
        }
    }
}

impl ImageProcessor for RasterProcessor {
    fn validate(&self, data: &[u8]) -> Result<ImageMetadata> {
        if data.len() as u64 > self.max_file_size {
            return Err(Error::invalid_input(format!(
                "file exceeds the {} MB limit",
                self.max_file_size / 1024 / 1024
            )));
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| Error::invalid_input(format!("unreadable image: {e}")))?;
        let format = reader
            .format()
            .ok_or_else(|| Error::invalid_input("unrecognized image format"))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| Error::invalid_input(format!("corrupt or unsupported image: {e}")))?;

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::invalid_input(format!(
                "image dimensions exceed {MAX_DIMENSION}x{MAX_DIMENSION}"
            )));
        }

        Ok(ImageMetadata {
            format,
            width,
            height,
        })
    }

    fn process(&self, data: &[u8], options: &ProcessOptions) -> Result<ProcessedImage> {
        let source = image::guess_format(data)
            .map_err(|e| Error::invalid_input(format!("unrecognized image format: {e}")))?;
        let target = if options.compress_to_webp && source != ImageFormat::Gif {
            ImageFormat::WebP
        } else {
            source
        };

        let watermark = options.watermark.as_deref().filter(|t| !t.trim().is_empty());

        // nothing to change: keep the upload byte for byte (keeps GIF animation)
        if target == source && watermark.is_none() {
            let (width, height) = ImageReader::new(Cursor::new(data))
                .with_guessed_format()
                .map_err(|e| Error::invalid_input(e.to_string()))?
                .into_dimensions()
                .map_err(|e| Error::invalid_input(e.to_string()))?;
            return Ok(ProcessedImage {
                data: Bytes::copy_from_slice(data),
                mime: source.to_mime_type().to_string(),
                extension: extension_for(source).to_string(),
                width,
                height,
            });
        }

        let mut img = image::load_from_memory(data)
            .map_err(|e| Error::invalid_input(format!("failed to decode image: {e}")))?;

        if let Some(text) = watermark {
            img = stamp_watermark(img, text);
        }

        let encoded = encode(&img, target, options.quality)?;
        tracing::debug!(
            source = ?source,
            target = ?target,
            input_bytes = data.len(),
            output_bytes = encoded.len(),
            "Processed image"
        );

        Ok(ProcessedImage {
            data: Bytes::from(encoded),
            mime: target.to_mime_type().to_string(),
            extension: extension_for(target).to_string(),
            width: img.width(),
            height: img.height(),
        })
    }

    fn thumbnail(&self, data: &[u8]) -> Result<Bytes> {
        let img = image::load_from_memory(data)
            .map_err(|e| Error::invalid_input(format!("failed to decode image: {e}")))?;

        let size = self.thumbnail_size;
        // never enlarge
        let thumb = if img.width() > size || img.height() > size {
            img.thumbnail(size, size)
        } else {
            img
        };

        Ok(Bytes::from(encode(&thumb, ImageFormat::WebP, 100)?))
    }
}

fn extension_for(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(10, 100));
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| Error::internal(format!("failed to encode JPEG: {e}")))?;
        }
        ImageFormat::WebP => {
            // the WebP encoder only accepts 8-bit RGB(A)
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut buf, ImageFormat::WebP)
                .map_err(|e| Error::internal(format!("failed to encode WebP: {e}")))?;
        }
        other => {
            img.write_to(&mut buf, other)
                .map_err(|e| Error::internal(format!("failed to encode {other:?}: {e}")))?;
        }
    }
    Ok(buf.into_inner())
}

/// Blend a translucent banner into the bottom-right corner, sized from the
/// watermark text length the way a rendered caption would be.
fn stamp_watermark(img: DynamicImage, text: &str) -> DynamicImage {
    let mut canvas: RgbaImage = img.to_rgba8();
    let (width, height) = canvas.dimensions();

    let font_size = (width / 25).max(16);
    let padding = font_size * 6 / 10;
    let text_width = font_size * 6 / 10 * text.chars().count() as u32;
    let banner_w = (text_width + 2 * padding).min(width);
    let banner_h = (font_size + 2 * padding).min(height);

    let shade = Rgba([0u8, 0, 0, 90]);
    for y in height - banner_h..height {
        for x in width - banner_w..width {
            let px = canvas.get_pixel_mut(x, y);
            blend(px, shade);
        }
    }

    DynamicImage::ImageRgba8(canvas)
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = u16::from(src[3]);
    for c in 0..3 {
        let mixed = (u16::from(src[c]) * alpha + u16::from(dst[c]) * (255 - alpha)) / 255;
        dst[c] = mixed as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgba([255, 255, 255, 255]);
        }
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn processor() -> RasterProcessor {
        RasterProcessor::new(&ImageConfig::default())
    }

    fn options(compress: bool, watermark: Option<&str>) -> ProcessOptions {
        ProcessOptions {
            compress_to_webp: compress,
            quality: 90,
            watermark: watermark.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_png() {
        let meta = processor().validate(&png(40, 30)).unwrap();
        assert_eq!(meta.format, ImageFormat::Png);
        assert_eq!((meta.width, meta.height), (40, 30));
    }

    #[test]
    fn test_validate_rejects_garbage_and_oversize() {
        assert_matches!(
            processor().validate(b"definitely not an image"),
            Err(Error::InvalidInput(_))
        );

        let small = RasterProcessor {
            max_file_size: 10,
            thumbnail_size: 400,
        };
        assert_matches!(small.validate(&png(4, 4)), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_process_to_webp() {
        let out = processor().process(&png(20, 10), &options(true, None)).unwrap();
        assert_eq!(out.mime, "image/webp");
        assert_eq!(out.extension, "webp");
        assert_eq!((out.width, out.height), (20, 10));
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn test_process_without_changes_passes_through() {
        let input = png(8, 8);
        let out = processor().process(&input, &options(false, None)).unwrap();
        assert_eq!(out.mime, "image/png");
        assert_eq!(out.extension, "png");
        assert_eq!(&out.data[..], &input[..]);
    }

    #[test]
    fn test_watermark_darkens_corner_only() {
        let out = processor()
            .process(&png(200, 100), &options(false, Some("hello")))
            .unwrap();
        let img = image::load_from_memory(&out.data).unwrap().to_rgba8();
        assert!(img.get_pixel(199, 99)[0] < 255);
        assert_eq!(img.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_thumbnail_fits_without_enlarging() {
        let proc = processor();

        let thumb = proc.thumbnail(&png(1600, 800)).unwrap();
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (400, 200));

        let thumb = proc.thumbnail(&png(50, 20)).unwrap();
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (50, 20));
    }
}
