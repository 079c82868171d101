use crate::geometry::Size;
use crate::region::SAVED_REGION_FILE;
use crate::session::SessionMode;
use crate::Args;
use std::path::PathBuf;

/// Viewport assumed when the windowing system reports no monitor size
pub const FALLBACK_VIEWPORT: Size = Size {
    width: 1440.0,
    height: 900.0,
};

/// Session configuration, fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct Config {
    pub image_path: Option<PathBuf>,
    pub mode: SessionMode,
    /// Record read in reuse mode
    pub saved_region_path: PathBuf,
    pub allow_scaling: bool,
    pub engine: Option<String>,
    pub language: String,
    pub minimum_text_height: f32,
    pub fallback_viewport: Size,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            image_path: args.image,
            mode: if args.reuse {
                SessionMode::ReuseSavedRegion
            } else {
                SessionMode::Interactive
            },
            saved_region_path: PathBuf::from(SAVED_REGION_FILE),
            allow_scaling: !args.noscale,
            engine: args.engine,
            language: args.language,
            minimum_text_height: args.min_text_height,
            fallback_viewport: FALLBACK_VIEWPORT,
        }
    }
}
