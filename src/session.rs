//! Session control
//!
//! Loads the image, obtains a region (interactively or from the saved record),
//! and hands it to the orchestrator. Artifacts are named after the input
//! image; the record read by reuse mode is the fixed `region.txt` in the
//! working directory (`Config::saved_region_path`), not the
//! `<name>.region.txt` written after a selection.

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::engines::{EngineRegistry, UnavailableEngine};
use crate::error::{OcrError, SessionError};
use crate::geometry::NativeRect;
use crate::orchestrator::{Orchestrator, RecognitionJob, RecognitionReport};
use crate::preview;
use crate::region;
use crate::selection::SelectionOutcome;
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How the region is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Interactive,
    ReuseSavedRegion,
}

/// Files derived from the input image path
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    /// Recognized text
    pub text: PathBuf,
    /// Record of the interactively selected region
    pub region: PathBuf,
    /// Cropped preview of the region
    pub cropped: PathBuf,
}

impl ArtifactPaths {
    pub fn for_image(image_path: &Path) -> Self {
        Self {
            text: image_path.with_extension("txt"),
            region: image_path.with_extension("region.txt"),
            cropped: image_path.with_extension("cropped.jpg"),
        }
    }
}

/// Image and region, ready for recognition
struct Prepared {
    image: Arc<DynamicImage>,
    region: NativeRect,
    artifacts: ArtifactPaths,
}

pub async fn run(config: Config) -> Result<RecognitionReport, SessionError> {
    let prepared = prepare(&config, |image| select_region(&config, image))?;
    let engine = build_engine(&config).await;
    Ok(recognize(&config, prepared, engine).await)
}

/// Load the image and obtain the region. `select` runs only in interactive
/// mode; its result is persisted before anything is recognized.
fn prepare<F>(config: &Config, select: F) -> Result<Prepared, SessionError>
where
    F: FnOnce(Arc<DynamicImage>) -> Result<NativeRect, SessionError>,
{
    let image_path = config
        .image_path
        .clone()
        .ok_or_else(|| SessionError::Argument("missing <IMAGE> argument".to_string()))?;

    let image = Arc::new(load_image(&image_path)?);
    let artifacts = ArtifactPaths::for_image(&image_path);
    let (width, height) = image.dimensions();
    tracing::info!("Loaded {} ({}x{})", image_path.display(), width, height);

    let region = match config.mode {
        SessionMode::ReuseSavedRegion => {
            let region = region::load(&config.saved_region_path)?;
            tracing::info!("Reusing saved region {}", region);
            region
        }
        SessionMode::Interactive => {
            let region = select(Arc::clone(&image))?;
            match region::save(&artifacts.region, &region) {
                Ok(()) => tracing::info!("Saved region to {}", artifacts.region.display()),
                Err(e) => tracing::warn!(
                    "Failed to save region to {}: {}",
                    artifacts.region.display(),
                    e
                ),
            }
            region
        }
    };

    Ok(Prepared {
        image,
        region,
        artifacts,
    })
}

async fn recognize(
    config: &Config,
    prepared: Prepared,
    engine: Arc<dyn OcrEngine>,
) -> RecognitionReport {
    let orchestrator = Orchestrator::new(engine, config.minimum_text_height);
    orchestrator
        .run(RecognitionJob {
            image: prepared.image,
            region: Some(prepared.region),
            output_path: prepared.artifacts.text,
            crop_path: prepared.artifacts.cropped,
        })
        .await
}

fn load_image(path: &Path) -> Result<DynamicImage, SessionError> {
    let image = image::open(path).map_err(|e| SessionError::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(SessionError::ImageLoad {
            path: path.to_path_buf(),
            reason: "image has no pixels".to_string(),
        });
    }

    Ok(image)
}

fn select_region(config: &Config, image: Arc<DynamicImage>) -> Result<NativeRect, SessionError> {
    let outcome = preview::select_region(image, config.allow_scaling, config.fallback_viewport)
        .map_err(SessionError::Window)?;

    match outcome {
        SelectionOutcome::Finalized(region) => {
            tracing::info!("Selected region {}", region);
            Ok(region)
        }
        SelectionOutcome::Cancelled => Err(SessionError::Cancelled),
    }
}

/// Initialize the configured engine off the async runtime. A failure is
/// carried into the run as an engine that always errors.
async fn build_engine(config: &Config) -> Arc<dyn OcrEngine> {
    let init_config = config.clone();
    let result = tokio::task::spawn_blocking(move || {
        EngineRegistry::new(&init_config)?.select(init_config.engine.as_deref())
    })
    .await
    .unwrap_or_else(|e| {
        Err(OcrError::InitializationError(format!(
            "Engine initialization task failed: {}",
            e
        )))
    });

    match result {
        Ok(engine) => {
            tracing::info!("Using {} engine: {}", engine.name(), engine.description());
            if !engine.supported_languages().contains(&config.language) {
                tracing::warn!(
                    "Language '{}' is not supported by {}, results may be poor",
                    config.language,
                    engine.name()
                );
            }
            engine
        }
        Err(e) => {
            tracing::error!("{}", e);
            Arc::new(UnavailableEngine::new(&e))
        }
    }
}
