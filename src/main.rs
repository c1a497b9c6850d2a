use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use emotion_classifier::config::Config;
use emotion_classifier::pipeline::Pipeline;
use emotion_classifier::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load_or_default();
    let model_path = config.resolve_model_path()?;

    // Model load is fatal: never start serving without a working classifier
    let pipeline = Pipeline::new(&model_path, config.n_threads)
        .with_context(|| format!("failed to initialize classifier from {:?}", model_path))?;

    info!("Classifier ready");

    server::serve(config, Arc::new(Mutex::new(pipeline))).await
}
