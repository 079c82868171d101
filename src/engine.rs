use crate::error::OcrError;
use crate::geometry::NormalizedRect;
use image::{DynamicImage, GenericImageView};

/// Parameters for a single recognition call. The language is fixed when
/// the engine is built from `Config`.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    /// Where to look, as fractions of the image size. `None` analyses the
    /// whole image.
    pub region_of_interest: Option<NormalizedRect>,
    /// Lines shorter than this fraction of the analysed height are dropped
    pub minimum_text_height: f32,
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text and return one segment per line, in reading order
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &RecognitionRequest,
    ) -> Result<Vec<String>, OcrError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}

/// Restrict `image` to the region of interest.
///
/// The region is clamped to the unit square first; one that covers no pixels
/// afterwards is rejected.
pub fn apply_region_of_interest(
    image: &DynamicImage,
    roi: Option<&NormalizedRect>,
) -> Result<DynamicImage, OcrError> {
    let Some(roi) = roi else {
        return Ok(image.clone());
    };

    let (width, height) = image.dimensions();
    let left = roi.x.clamp(0.0, 1.0);
    let top = roi.y.clamp(0.0, 1.0);
    let right = (roi.x + roi.width).clamp(0.0, 1.0);
    let bottom = (roi.y + roi.height).clamp(0.0, 1.0);

    let x0 = (left * width as f64).floor() as u32;
    let y0 = (top * height as f64).floor() as u32;
    let x1 = (right * width as f64).ceil() as u32;
    let y1 = (bottom * height as f64).ceil() as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(OcrError::InvalidRegion(format!(
            "{} covers no pixels of the {}x{} image",
            roi, width, height
        )));
    }

    tracing::debug!(
        "Region of interest {} -> pixels ({}, {}) .. ({}, {})",
        roi,
        x0,
        y0,
        x1,
        y1
    );

    Ok(image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}


/// Engine double shared by the orchestration and session tests
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every request and answers with a canned result
    pub struct FakeEngine {
        result: Result<Vec<String>, String>,
        requests: Mutex<Vec<RecognitionRequest>>,
    }

    impl FakeEngine {
        pub fn returning(lines: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(lines.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<RecognitionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl OcrEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn description(&self) -> &'static str {
            "Test engine"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            request: &RecognitionRequest,
        ) -> Result<Vec<String>, OcrError> {
            self.requests.lock().unwrap().push(request.clone());
            self.result.clone().map_err(OcrError::ProcessingError)
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["eng".to_string()]
        }
    }
}
