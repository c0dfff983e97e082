//! Image OCR extraction: clean up the scan, then run tesseract once

use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage, ImageFormat, Luma};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions};
use serde_json::json;

use super::ocr::{group_tables, OcrEngine};
use super::text::{clean_text, detect_language};
use crate::config::{ClassifierConfig, ExtractionConfig};
use crate::error::ExtractionError;
use crate::types::{ExtractedContent, Metadata};

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const HOUGH_VOTES: u32 = 100;
const HOUGH_SUPPRESSION: u32 = 8;

/// Extractor for raster images
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    settings: ExtractionConfig,
    ocr: OcrEngine,
}

impl ImageExtractor {
    pub const MIME_TYPES: &'static [&'static str] = &[
        super::mime::JPEG,
        super::mime::PNG,
        super::mime::TIFF,
        super::mime::BMP,
    ];

    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            settings: config.extraction.clone(),
            ocr: OcrEngine::new(config.ocr.clone()),
        }
    }

    pub fn extract_content(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractionError::read(path, e))?;
        let format = image::guess_format(&bytes)
            .map_err(|e| ExtractionError::parse("image", e.to_string()))?;
        let img = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| ExtractionError::parse("image", e.to_string()))?;

        let prepared = self.preprocess(&img);

        let work_dir = tempfile::tempdir()
            .map_err(|e| ExtractionError::ocr(format!("failed to create temp dir: {}", e)))?;
        let prepared_path = work_dir.path().join("prepared.png");
        prepared
            .save(&prepared_path)
            .map_err(|e| ExtractionError::ocr(format!("failed to write preprocessed image: {}", e)))?;

        let output = self.ocr.recognize(&prepared_path, work_dir.path())?;
        let tables = group_tables(&output.tokens);
        let ocr_confidence = output.average_confidence();

        let mut metadata = Metadata::new();
        metadata.insert("width".to_string(), json!(img.width()));
        metadata.insert("height".to_string(), json!(img.height()));
        metadata.insert("format".to_string(), json!(format_name(format)));
        metadata.insert("mode".to_string(), json!(color_mode(img.color())));
        metadata.insert("has_tables".to_string(), json!(!tables.is_empty()));
        metadata.insert("ocr_confidence".to_string(), json!(ocr_confidence));

        let text = clean_text(&output.text);
        tracing::debug!(
            width = img.width(),
            height = img.height(),
            tokens = output.tokens.len(),
            ocr_confidence,
            "Image OCR complete"
        );

        Ok(ExtractedContent::new(text.clone())
            .with_metadata(metadata)
            .with_tables(tables)
            .with_images(vec![bytes])
            .with_language(detect_language(&text))
            .with_confidence(ocr_confidence / 100.0))
    }

    pub fn validate_file(&self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(bytes) => image::load_from_memory(&bytes).is_ok(),
            Err(_) => false,
        }
    }

    /// Grayscale, Otsu binarization, median denoise, then deskew
    pub fn preprocess(&self, img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        let binary = binarize(&gray);
        let radius = self.settings.median_radius;
        let denoised = median_filter(&binary, radius, radius);

        let skew = estimate_skew(&denoised);
        if skew.abs() > self.settings.deskew_threshold_degrees {
            tracing::debug!("Deskewing image by {:.2} degrees", skew);
            rotate_about_center(
                &denoised,
                (-skew).to_radians(),
                Interpolation::Bicubic,
                Luma([255u8]),
            )
        } else {
            denoised
        }
    }
}

fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }
    out
}

/// Median skew of near-horizontal lines, in degrees within (-45, 45].
///
/// Hough lines are reported by the angle of their normal, so a perfectly
/// horizontal text line sits at 90 degrees.
pub fn estimate_skew(img: &GrayImage) -> f32 {
    let edges = canny(img, CANNY_LOW, CANNY_HIGH);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: HOUGH_VOTES,
            suppression_radius: HOUGH_SUPPRESSION,
        },
    );

    let mut angles: Vec<f32> = lines
        .iter()
        .map(|line| line.angle_in_degrees as f32 - 90.0)
        .filter(|angle| *angle > -45.0 && *angle <= 45.0)
        .collect();

    median(&mut angles).unwrap_or(0.0)
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page_with_rules() -> DynamicImage {
        let mut img = RgbImage::from_pixel(240, 120, Rgb([255, 255, 255]));
        for y in [40u32, 80] {
            for dy in 0..3 {
                for x in 10..230 {
                    img.put_pixel(x, y + dy, Rgb([0, 0, 0]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_blank_image_has_no_skew() {
        let blank = GrayImage::from_pixel(100, 50, Luma([255]));
        assert_eq!(estimate_skew(&blank), 0.0);
    }

    #[test]
    fn test_preprocess_is_binary_and_keeps_size() {
        let extractor = ImageExtractor::new(&ClassifierConfig::default());
        let prepared = extractor.preprocess(&page_with_rules());
        assert_eq!(prepared.dimensions(), (240, 120));
        assert!(prepared.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, -1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_metadata_names() {
        assert_eq!(format_name(ImageFormat::Jpeg), "JPEG");
        assert_eq!(color_mode(ColorType::Rgb8), "RGB");
        assert_eq!(color_mode(ColorType::L8), "L");
    }

    #[test]
    fn test_validate_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"not an image").unwrap();
        let extractor = ImageExtractor::new(&ClassifierConfig::default());
        assert!(!extractor.validate_file(&path));
    }
}
