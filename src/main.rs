use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wardrobe_engine::analysis::AnalysisRequest;
use wardrobe_engine::{AppError, Engine, Settings};

#[derive(Parser, Debug)]
#[command(name = "wardrobe-engine", version, about = "Extract garment features from images and print them as JSON")]
struct Args {
    /// Settings file layered over the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Garment images to analyze
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    init_logging(&settings.logging.level);

    let engine = Engine::from_settings(&settings)?;
    let mut requests = Vec::with_capacity(args.images.len());
    for path in &args.images {
        requests.push(AnalysisRequest::new(tokio::fs::read(path).await?));
    }

    for (path, analysis) in args.images.iter().zip(engine.analyze_batch(requests).await) {
        if let Some(error) = &analysis.error {
            tracing::warn!("{}: {}", path.display(), error);
        }
        println!("{}", serde_json::to_string(&analysis.feature_set)?);
    }

    Ok(())
}
