//! Laundering Detection Service - Main Entry Point
//!
//! Loads the classifier artifact once at startup and serves the
//! prediction endpoint. A failed model load is logged and the service
//! still starts; prediction requests then answer 500.

use anyhow::Result;
use laundering_detection::{
    api, config::AppConfig, features::Preprocessor, models::inference::OnnxClassifier,
    models::loader, models::Classifier, state::AppState,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("laundering_detection=info".parse()?),
        )
        .init();

    info!("Starting Laundering Detection Service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Scratch space for uploads, durable output for prediction CSVs
    std::fs::create_dir_all(&config.storage.uploads_dir)?;
    std::fs::create_dir_all(&config.storage.predictions_dir)?;

    // Load the classifier; the service serves error responses without it
    let classifier: Option<Arc<dyn Classifier>> = match OnnxClassifier::from_config(&config.model)
    {
        Ok(model) => {
            info!(
                features = model.feature_names().len(),
                "Classifier initialized, expected features: {:?}",
                model.feature_names()
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            error!(error = %e, "Error loading model; predictions will be unavailable");
            None
        }
    };

    // Persisted categorical encodings are optional; without them codes
    // are re-derived per batch and will not match training time
    let preprocessor = match &config.model.encodings_path {
        Some(path) => match loader::load_encodings(path) {
            Ok(encodings) => Preprocessor::with_encodings(encodings),
            Err(e) => {
                warn!(error = %e, "Failed to load categorical encodings, falling back to per-batch codes");
                Preprocessor::new()
            }
        },
        None => {
            warn!("No persisted categorical encodings configured; using per-batch codes");
            Preprocessor::new()
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, classifier, preprocessor);

    let app = api::routes(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
