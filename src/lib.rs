//! Laundering Detection Service
//!
//! Exposes a pre-trained binary classifier over HTTP: clients upload a
//! CSV of financial transactions, the service validates and transforms
//! the rows into the model's feature schema, runs inference, and returns
//! per-row predictions plus a batch summary.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod normalizer;
pub mod report;
pub mod state;
pub mod table;
pub mod validator;

pub use config::AppConfig;
pub use error::ServiceError;
pub use features::Preprocessor;
pub use models::{Classifier, OnnxClassifier, Prediction};
pub use report::{PredictionRecord, PredictionResponse, PredictionSummary};
pub use state::AppState;
pub use table::CsvTable;
