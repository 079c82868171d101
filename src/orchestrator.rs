//! Recognition orchestration
//!
//! Turns a native-space region into a cropped preview artifact and a
//! region-of-interest hint, runs the engine once off the async runtime, and
//! writes the recognized text. Every failure past this point degrades to an
//! empty or partial result; `run` always returns a report.

use crate::engine::{OcrEngine, RecognitionRequest};
use crate::error::{CropError, OcrError};
use crate::geometry::{from_flipped, to_flipped, to_normalized, FlippedRect, NativeRect, Size};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// One recognition run
#[derive(Clone)]
pub struct RecognitionJob {
    pub image: Arc<DynamicImage>,
    /// Region to analyse, `None` for the whole image
    pub region: Option<NativeRect>,
    pub output_path: PathBuf,
    pub crop_path: PathBuf,
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionReport {
    /// Recognized lines joined with `\n`, empty when nothing was found
    pub text: String,
    pub output_written: bool,
    pub crop_written: bool,
}

pub struct Orchestrator {
    engine: Arc<dyn OcrEngine>,
    minimum_text_height: f32,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn OcrEngine>, minimum_text_height: f32) -> Self {
        Self {
            engine,
            minimum_text_height,
        }
    }

    pub async fn run(&self, job: RecognitionJob) -> RecognitionReport {
        let mut report = RecognitionReport::default();
        let (width, height) = job.image.dimensions();

        if let Some(region) = job.region {
            if region.is_degenerate() {
                tracing::warn!("Selected region {} has no area, skipping recognition", region);
                return report;
            }

            let flipped = to_flipped(region, height as f64);
            tracing::debug!("Crop rectangle (flipped space): {}", flipped);
            match crop_flipped(&job.image, &flipped).and_then(|crop| {
                crop.to_rgb8()
                    .save_with_format(&job.crop_path, ImageFormat::Jpeg)
                    .map_err(CropError::from)
            }) {
                Ok(()) => {
                    tracing::info!("Saved cropped region to {}", job.crop_path.display());
                    report.crop_written = true;
                }
                Err(e) => tracing::warn!("Cropped preview not written: {}", e),
            }
        }

        let request = RecognitionRequest {
            region_of_interest: job
                .region
                .map(|r| to_normalized(r, Size::new(width as f64, height as f64))),
            minimum_text_height: self.minimum_text_height,
        };
        match &request.region_of_interest {
            Some(roi) => tracing::info!("Recognizing text in region of interest {}", roi),
            None => tracing::info!("Recognizing text in the full image"),
        }

        let start = Instant::now();
        let engine = Arc::clone(&self.engine);
        let image = Arc::clone(&job.image);
        let result = tokio::task::spawn_blocking(move || engine.recognize(&image, &request))
            .await
            .unwrap_or_else(|e| {
                Err(OcrError::ProcessingError(format!(
                    "Recognition task failed: {}",
                    e
                )))
            });

        match result {
            Ok(segments) => {
                tracing::info!(
                    "OCR completed in {}ms with {} line(s) using {}",
                    start.elapsed().as_millis(),
                    segments.len(),
                    self.engine.name()
                );
                report.text = segments.join("\n");
            }
            Err(e) => tracing::error!("OCR error: {}", e),
        }

        if report.text.is_empty() {
            tracing::warn!("No text recognized, {} not written", job.output_path.display());
            return report;
        }

        match std::fs::write(&job.output_path, &report.text) {
            Ok(()) => {
                tracing::info!("Saved OCR result to {}", job.output_path.display());
                report.output_written = true;
            }
            Err(e) => tracing::error!(
                "Failed to save output to {}: {}",
                job.output_path.display(),
                e
            ),
        }

        report
    }
}

/// Crop `image` at a rectangle given with a bottom-left origin
pub fn crop_flipped(image: &DynamicImage, rect: &FlippedRect) -> Result<DynamicImage, CropError> {
    let (width, height) = image.dimensions();
    let inside = rect.x >= 0.0
        && rect.y >= 0.0
        && rect.x + rect.width <= width as f64
        && rect.y + rect.height <= height as f64;

    if !inside || rect.is_degenerate() {
        return Err(CropError::OutOfBounds {
            rect: rect.to_string(),
            width,
            height,
        });
    }

    // Rows in the decoded buffer run top to bottom
    let top_left = from_flipped(*rect, height as f64);
    let x = (top_left.x.round() as u32).min(width - 1);
    let y = (top_left.y.round() as u32).min(height - 1);
    let w = (top_left.width.round() as u32).clamp(1, width - x);
    let h = (top_left.height.round() as u32).clamp(1, height - y);

    Ok(image.crop_imm(x, y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use image::{Rgb, RgbImage};

    /// 80x60 black image with a red block at native (10, 20, 40, 30)
    fn marked_image() -> Arc<DynamicImage> {
        let mut img = RgbImage::new(80, 60);
        for y in 20..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        Arc::new(DynamicImage::ImageRgb8(img))
    }

    fn job(dir: &tempfile::TempDir, region: Option<NativeRect>) -> RecognitionJob {
        RecognitionJob {
            image: marked_image(),
            region,
            output_path: dir.path().join("shot.txt"),
            crop_path: dir.path().join("shot.cropped.jpg"),
        }
    }

    #[tokio::test]
    async fn test_full_image_writes_joined_text() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::returning(&["first line", "second line"]);
        let orchestrator = Orchestrator::new(engine.clone(), 0.01);

        let report = orchestrator.run(job(&dir, None)).await;

        assert_eq!(report.text, "first line\nsecond line");
        assert!(report.output_written);
        assert!(!report.crop_written);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("shot.txt")).unwrap(),
            "first line\nsecond line"
        );
        assert!(!dir.path().join("shot.cropped.jpg").exists());

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].region_of_interest.is_none());
        assert_eq!(calls[0].minimum_text_height, 0.01);
    }

    #[tokio::test]
    async fn test_region_crops_and_passes_normalized_roi() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::returning(&["total 42"]);
        let orchestrator = Orchestrator::new(engine.clone(), 0.01);

        let region = NativeRect::new(10.0, 20.0, 40.0, 30.0);
        let report = orchestrator.run(job(&dir, Some(region))).await;

        assert!(report.crop_written);
        let crop = image::open(dir.path().join("shot.cropped.jpg")).unwrap().to_rgb8();
        assert_eq!(crop.dimensions(), (40, 30));
        let center = crop.get_pixel(20, 15);
        assert!(center[0] > 200 && center[1] < 60, "got {:?}", center);

        let roi = engine.calls()[0].region_of_interest.unwrap();
        assert!((roi.x - 0.125).abs() < 1e-9);
        assert!((roi.y - 20.0 / 60.0).abs() < 1e-9);
        assert!((roi.width - 0.5).abs() < 1e-9);
        assert!((roi.height - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_result_skips_output() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(FakeEngine::returning(&[]), 0.01);

        let report = orchestrator.run(job(&dir, None)).await;

        assert_eq!(report.text, "");
        assert!(!report.output_written);
        assert!(!dir.path().join("shot.txt").exists());
    }

    #[tokio::test]
    async fn test_engine_error_completes_empty() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(FakeEngine::failing("model exploded"), 0.01);

        let report = orchestrator
            .run(job(&dir, Some(NativeRect::new(0.0, 0.0, 10.0, 10.0))))
            .await;

        assert_eq!(report.text, "");
        assert!(report.crop_written);
        assert!(!report.output_written);
        assert!(!dir.path().join("shot.txt").exists());
    }

    #[tokio::test]
    async fn test_out_of_bounds_crop_still_recognizes() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::returning(&["edge"]);
        let orchestrator = Orchestrator::new(engine.clone(), 0.01);

        let region = NativeRect::new(60.0, 40.0, 100.0, 100.0);
        let report = orchestrator.run(job(&dir, Some(region))).await;

        assert!(!report.crop_written);
        assert!(!dir.path().join("shot.cropped.jpg").exists());
        assert_eq!(report.text, "edge");

        let roi = engine.calls()[0].region_of_interest.unwrap();
        assert!(roi.x + roi.width > 1.0);
    }

    #[tokio::test]
    async fn test_degenerate_region_never_reaches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::returning(&["unused"]);
        let orchestrator = Orchestrator::new(engine.clone(), 0.01);

        let report = orchestrator
            .run(job(&dir, Some(NativeRect::new(5.0, 5.0, 0.0, 20.0))))
            .await;

        assert_eq!(report, RecognitionReport::default());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_crop_flipped_uses_bottom_left_origin() {
        let image = marked_image();
        // Native (10, 20, 40, 30) in a 60px tall image
        let crop = crop_flipped(&image, &FlippedRect::new(10.0, 10.0, 40.0, 30.0)).unwrap();
        let crop = crop.to_rgb8();

        assert_eq!(crop.dimensions(), (40, 30));
        assert!(crop.pixels().all(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn test_crop_flipped_rejects_outside() {
        let image = marked_image();
        let result = crop_flipped(&image, &FlippedRect::new(70.0, 0.0, 20.0, 10.0));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));
    }
}
