//! Model and training-data cache shared by the engines

use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-user cache directory for downloaded engine data
pub fn cache_dir(subdir: &str) -> Result<PathBuf, OcrError> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("region-ocr")
        .join(subdir);

    std::fs::create_dir_all(&dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create cache directory: {}", e))
    })?;

    Ok(dir)
}

/// Return the cached copy of `filename`, downloading it from `url` first if
/// it is missing
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, OcrError> {
    let path = dir.join(filename);

    if path.exists() {
        tracing::info!("Using cached {} from {:?}", filename, path);
    } else {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    }

    Ok(path)
}

fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download {}: {}", url, e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    // Partial downloads never appear under the final name
    let partial = path.with_extension("part");
    let mut file = File::create(&partial)
        .map_err(|e| OcrError::InitializationError(format!("Failed to create {:?}: {}", partial, e)))?;
    file.write_all(&buffer)
        .map_err(|e| OcrError::InitializationError(format!("Failed to write {:?}: {}", partial, e)))?;

    std::fs::rename(&partial, path)
        .map_err(|e| OcrError::InitializationError(format!("Failed to move {:?}: {}", partial, e)))
}
