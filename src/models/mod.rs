//! Classifier loading and inference components

pub mod inference;
pub mod loader;

pub use inference::{Classifier, OnnxClassifier, Prediction};
pub use loader::ModelLoader;
