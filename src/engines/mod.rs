//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod download;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use std::sync::Arc;

/// Registry of available OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with all available engines initialized
    #[allow(unused_variables, unused_mut)]
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();
        let mut default_engine = String::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            let ocrs_engine = ocrs::OcrsEngine::new(config)?;
            if default_engine.is_empty() {
                default_engine = ocrs_engine.name().to_string();
            }
            engines.push(Arc::new(ocrs_engine));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            let leptess_engine = leptess::LeptessEngine::new(config)?;
            if default_engine.is_empty() {
                default_engine = leptess_engine.name().to_string();
            }
            engines.push(Arc::new(leptess_engine));
        }

        if engines.is_empty() {
            return Err(OcrError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }

        Ok(Self {
            engines,
            default_engine,
        })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Pick the requested engine, or the default when none was requested
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let name = name.unwrap_or(&self.default_engine);
        self.get(name).ok_or_else(|| {
            OcrError::InitializationError(format!(
                "Unknown engine '{}', available: {}",
                name,
                self.list().join(", ")
            ))
        })
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

/// Stands in for an engine that failed to initialize. Every call reports the
/// initialization failure, so the run degrades to an empty result.
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    pub fn new(error: &OcrError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }
}

impl OcrEngine for UnavailableEngine {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn description(&self) -> &'static str {
        "No engine could be initialized"
    }

    fn recognize(
        &self,
        _image: &image::DynamicImage,
        _request: &crate::engine::RecognitionRequest,
    ) -> Result<Vec<String>, OcrError> {
        Err(OcrError::InitializationError(self.reason.clone()))
    }

    fn supported_languages(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognitionRequest;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_unavailable_engine_reports_reason() {
        let engine = UnavailableEngine::new(&OcrError::InitializationError(
            "download failed".to_string(),
        ));
        let request = RecognitionRequest {
            region_of_interest: None,
            minimum_text_height: 0.01,
        };

        let err = engine
            .recognize(&DynamicImage::ImageRgb8(RgbImage::new(4, 4)), &request)
            .unwrap_err();
        assert!(err.to_string().contains("download failed"));
    }
}
