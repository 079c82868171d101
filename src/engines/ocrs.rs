//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use super::download;
use crate::config::Config;
use crate::engine::{apply_region_of_interest, OcrEngine, RecognitionRequest};
use crate::error::OcrError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use rten_imageproc::BoundingRect;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create a new OCR processor, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        let models_dir = download::cache_dir("models")?;
        let detection_model_path =
            download::ensure_downloaded(DETECTION_MODEL_URL, &models_dir, "text-detection.rten")?;
        let recognition_model_path = download::ensure_downloaded(
            RECOGNITION_MODEL_URL,
            &models_dir,
            "text-recognition.rten",
        )?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest,
    ) -> Result<Vec<String>, OcrError> {
        let image = apply_region_of_interest(image, request.region_of_interest.as_ref())?;

        // ImageSource::from_bytes expects RGB8 in HWC layout
        let rgb_img = image.into_rgb8();
        let dimensions = rgb_img.dimensions();
        let min_height = request.minimum_text_height * dimensions.1 as f32;

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let mut segments = Vec::new();
        for (words, line) in line_rects.iter().zip(&line_texts) {
            let Some(line) = line else { continue };

            let top = words
                .iter()
                .map(|w| w.bounding_rect().top())
                .fold(f32::INFINITY, f32::min);
            let bottom = words
                .iter()
                .map(|w| w.bounding_rect().bottom())
                .fold(f32::NEG_INFINITY, f32::max);
            if bottom - top < min_height {
                tracing::debug!("Dropping line shorter than {:.1}px", min_height);
                continue;
            }

            let text = line
                .words()
                .map(|word| word.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                segments.push(text);
            }
        }

        Ok(segments)
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }
}
