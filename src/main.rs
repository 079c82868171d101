use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
mod geometry;
mod orchestrator;
mod preview;
mod region;
mod selection;
mod session;

#[derive(Parser, Debug)]
#[command(name = "region-ocr")]
#[command(about = "Select a region of an image and extract its text")]
#[command(version)]
pub struct Args {
    /// Image to read text from
    pub image: Option<PathBuf>,

    /// Show the selection preview at native size instead of fitting it to the screen
    #[arg(long)]
    pub noscale: bool,

    /// Skip selection and reuse the region saved in ./region.txt
    #[arg(long)]
    pub reuse: bool,

    /// OCR engine to use (e.g., "ocrs", "leptess"); defaults to the first available
    #[arg(long, env = "REGION_OCR_ENGINE")]
    pub engine: Option<String>,

    /// Recognition language (e.g., "eng", "deu", "fra")
    #[arg(long, env = "REGION_OCR_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Ignore text lines shorter than this fraction of the image height
    #[arg(long, env = "REGION_OCR_MIN_TEXT_HEIGHT", default_value = "0.01")]
    pub min_text_height: f32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            // Nowhere left to report a failed write to stderr
            e.print().ok();
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting region-ocr v{}", env!("CARGO_PKG_VERSION"));

    match session::run(config).await {
        Ok(report) => {
            println!("\nOCR Result:\n{}", report.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_cancellation() {
                tracing::warn!("Selection cancelled, nothing recognized");
            } else {
                tracing::error!("{}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
