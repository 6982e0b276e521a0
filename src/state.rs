//! Shared application state

use crate::config::AppConfig;
use crate::features::Preprocessor;
use crate::models::Classifier;
use std::sync::Arc;

/// Immutable state built once at startup and cloned into handlers.
///
/// `classifier` is `None` when the model artifact failed to load; the
/// service still starts but every prediction request answers 500.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: Option<Arc<dyn Classifier>>,
    pub preprocessor: Arc<Preprocessor>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        classifier: Option<Arc<dyn Classifier>>,
        preprocessor: Preprocessor,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
            preprocessor: Arc::new(preprocessor),
        }
    }
}
