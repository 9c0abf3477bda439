//! Photo compression pipeline
//!
//! Photos are bounded in both pixel dimensions and encoded size before they
//! are embedded. The pipeline probes the header first, shrinks by a cheap
//! power-of-two sampling step, finishes with a precise resize only when the
//! sampled image is still too large, and then walks JPEG quality down until
//! the size budget is met or the quality floor is reached.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use tracing::debug;

use crate::error::ImageError;
use crate::options::ImageSettings;

/// First JPEG quality tried
pub const START_QUALITY: u8 = 90;
/// Quality decrement between attempts
pub const QUALITY_STEP: u8 = 10;
/// Lowest quality tried; its result is accepted whatever its size
pub const MIN_QUALITY: u8 = 10;

/// A photo ready to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality of the accepted encode
    pub quality: u8,
    /// Number of encodes performed
    pub attempts: u32,
}

/// Turns raw photo bytes into a bounded JPEG
pub trait ImageCompressor {
    fn compress(&self, raw: &[u8]) -> Result<CompressedImage, ImageError>;
}

/// Default compressor: bounded dimensions, JPEG quality ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCompressor {
    pub max_dimension_px: u32,
    pub max_bytes: usize,
}

impl Default for JpegCompressor {
    fn default() -> Self {
        Self::new(ImageSettings::default())
    }
}

impl JpegCompressor {
    pub fn new(settings: ImageSettings) -> Self {
        Self {
            max_dimension_px: settings.max_dimension_px,
            max_bytes: settings.max_bytes,
        }
    }

    fn sample(&self, raw: &[u8], width: u32, height: u32) -> Result<DynamicImage, ImageError> {
        let factor = sample_factor(width, height, self.max_dimension_px);
        let decoded = reader(raw)?.decode().map_err(ImageError::Decode)?;
        if factor == 1 {
            return Ok(decoded);
        }

        let sampled = decoded.thumbnail((width / factor).max(1), (height / factor).max(1));
        drop(decoded);
        Ok(sampled)
    }

    fn fit(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let max = self.max_dimension_px.max(1);
        if width <= max && height <= max {
            return image;
        }
        image.resize(max, max, FilterType::Triangle)
    }

    fn encode(&self, rgb: &RgbImage) -> Result<(Vec<u8>, u8, u32), ImageError> {
        let mut quality = START_QUALITY;
        let mut attempts = 0;

        loop {
            let bytes = encode_jpeg(rgb, quality)?;
            attempts += 1;

            if bytes.len() <= self.max_bytes || quality <= MIN_QUALITY {
                return Ok((bytes, quality, attempts));
            }
            quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
        }
    }
}

impl ImageCompressor for JpegCompressor {
    fn compress(&self, raw: &[u8]) -> Result<CompressedImage, ImageError> {
        let (source_width, source_height) =
            reader(raw)?.into_dimensions().map_err(ImageError::Decode)?;

        let sampled = self.sample(raw, source_width, source_height)?;
        let fitted = self.fit(sampled);
        let rgb = fitted.into_rgb8();
        let (width, height) = rgb.dimensions();

        let (bytes, quality, attempts) = self.encode(&rgb)?;
        drop(rgb);

        debug!(
            source_width,
            source_height,
            width,
            height,
            quality,
            attempts,
            size = bytes.len(),
            "compressed photo"
        );

        Ok(CompressedImage {
            bytes,
            width,
            height,
            quality,
            attempts,
        })
    }
}

/// Largest power of two that keeps the longest side at or above
/// `max_dimension` after dividing by it
pub fn sample_factor(width: u32, height: u32, max_dimension: u32) -> u32 {
    let longest = width.max(height);
    let mut factor = 1u32;
    if max_dimension == 0 {
        return factor;
    }
    while factor < (1 << 16) && longest / (factor * 2) >= max_dimension {
        factor *= 2;
    }
    factor
}

fn reader(raw: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ImageError> {
    ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(image::ImageError::IoError(e)))
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    rgb.write_with_encoder(encoder).map_err(ImageError::Encode)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use proptest::prelude::*;

    fn png(width: u32, height: u32, pixel: impl Fn(u32, u32) -> Rgb<u8>) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, pixel);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn gradient(x: u32, y: u32) -> Rgb<u8> {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }

    fn noise(x: u32, y: u32) -> Rgb<u8> {
        let mut v = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
        v ^= v >> 15;
        v = v.wrapping_mul(0xC2B2_AE35);
        Rgb([v as u8, (v >> 8) as u8, (v >> 16) as u8])
    }

    #[test]
    fn test_sample_factor() {
        assert_eq!(sample_factor(3000, 4000, 800), 4);
        assert_eq!(sample_factor(1600, 1200, 800), 2);
        assert_eq!(sample_factor(1599, 1200, 800), 1);
        assert_eq!(sample_factor(640, 480, 800), 1);
        assert_eq!(sample_factor(640, 480, 0), 1);
    }

    #[test]
    fn test_small_image_keeps_size() {
        let raw = png(320, 200, gradient);
        let out = JpegCompressor::default().compress(&raw).unwrap();

        assert_eq!((out.width, out.height), (320, 200));
        assert_eq!(out.quality, START_QUALITY);
        assert_eq!(out.attempts, 1);
        assert_eq!(&out.bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_large_image_bounded_with_aspect_ratio() {
        let raw = png(1700, 1000, gradient);
        let out = JpegCompressor::default().compress(&raw).unwrap();

        assert_eq!(out.width, 800);
        assert!((out.height as i64 - 471).abs() <= 1, "height {}", out.height);
        assert!(out.bytes.len() <= 500 * 1024);
    }

    #[test]
    fn test_quality_floor_accepted() {
        let raw = png(400, 400, noise);
        let compressor = JpegCompressor {
            max_dimension_px: 800,
            max_bytes: 1,
        };
        let out = compressor.compress(&raw).unwrap();

        assert_eq!(out.quality, MIN_QUALITY);
        assert_eq!(out.attempts, 9);
    }

    #[test]
    fn test_budget_stops_ladder_early() {
        let raw = png(400, 400, noise);
        let at_90 = encode_jpeg(&image::load_from_memory(&raw).unwrap().into_rgb8(), 90)
            .unwrap()
            .len();
        let compressor = JpegCompressor {
            max_dimension_px: 800,
            max_bytes: at_90 - 1,
        };
        let out = compressor.compress(&raw).unwrap();

        assert!(out.attempts >= 2);
        assert!(out.bytes.len() <= at_90 - 1 || out.quality == MIN_QUALITY);
    }

    #[test]
    fn test_corrupt_bytes_fail_decode() {
        let compressor = JpegCompressor::default();
        assert!(matches!(
            compressor.compress(b"definitely not a photo"),
            Err(ImageError::Decode(_))
        ));
        assert!(matches!(compressor.compress(&[]), Err(ImageError::Decode(_))));

        let mut truncated = png(64, 64, gradient);
        truncated.truncate(40);
        assert!(matches!(compressor.compress(&truncated), Err(ImageError::Decode(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn output_respects_dimension_bound(
            width in 1u32..1200,
            height in 1u32..1200,
            max in 50u32..600,
        ) {
            let raw = png(width, height, gradient);
            let compressor = JpegCompressor { max_dimension_px: max, max_bytes: 500 * 1024 };
            let out = compressor.compress(&raw).unwrap();

            prop_assert!(out.width.max(out.height) <= max);
            prop_assert!(out.attempts <= 9);
            prop_assert!(out.bytes.len() <= 500 * 1024 || out.quality == MIN_QUALITY);
        }

        #[test]
        fn sample_factor_never_overshrinks(
            width in 1u32..20_000,
            height in 1u32..20_000,
            max in 1u32..4_000,
        ) {
            let factor = sample_factor(width, height, max);
            prop_assert!(factor.is_power_of_two());
            let longest = width.max(height);
            if factor > 1 {
                prop_assert!(longest / factor >= max);
            }
        }
    }
}
