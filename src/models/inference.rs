//! Classifier inference over the loaded ONNX session

use crate::config::ModelConfig;
use crate::models::loader::{self, LoadedModel, ModelLoader};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Per-row inference output
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    /// Binary label: true when the row is predicted laundering
    pub is_laundering: bool,
    /// Probability of the laundering class (0.0 - 1.0)
    pub probability: f64,
}

/// The inference seam of the service.
///
/// The HTTP layer only sees this trait; the ort-backed implementation is
/// injected at startup, and tests substitute a stub.
pub trait Classifier: Send + Sync {
    /// Ordered feature list the model expects, fixed at training time
    fn feature_names(&self) -> &[String];

    /// One label and one positive-class probability per input row.
    /// No retries; any failure from the underlying model propagates.
    fn predict(&self, batch: &[Vec<f32>]) -> Result<Vec<Prediction>>;
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    /// Session requires mutable access to run, hence the lock
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    feature_names: Vec<String>,
}

impl OnnxClassifier {
    /// Load the classifier and its feature list per configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let model = loader.load_model(&config.model_path)?;
        let feature_names = loader::load_feature_names(&config.features_path)?;
        Ok(Self::new(model, feature_names))
    }

    pub fn new(model: LoadedModel, feature_names: Vec<String>) -> Self {
        Self {
            session: RwLock::new(model.session),
            input_name: model.input_name,
            output_name: model.output_name,
            feature_names,
        }
    }

    /// Run the session on a single row, shape [1, num_features]
    fn run_row(&self, features: &[f32]) -> Result<Prediction> {
        use ort::value::Tensor;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let probability = self.extract_probability(&outputs)?;
        let is_laundering = extract_label(&outputs).unwrap_or(probability >= 0.5);

        Ok(Prediction {
            is_laundering,
            probability,
        })
    }

    /// Extract the laundering-class probability from model output.
    /// Handles both tensor outputs (XGBoost, RandomForest) and
    /// seq(map(int64,float)) outputs (CatBoost, LightGBM).
    fn extract_probability(&self, outputs: &ort::session::SessionOutputs) -> Result<f64> {
        if let Some(output) = outputs.get(&self.output_name) {
            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                return Ok(positive_prob_from_tensor(shape, data));
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = extract_from_sequence_map(output) {
                    return Ok(prob);
                }
            }
        }

        // Fallback: iterate all outputs and try extraction
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                debug!(output = %name, "Extracted probability from fallback output");
                return Ok(positive_prob_from_tensor(shape, data));
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = extract_from_sequence_map(&output) {
                    return Ok(prob);
                }
            }
        }

        warn!("Could not extract probability from model output, using 0.5");
        Ok(0.5)
    }
}

impl Classifier for OnnxClassifier {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, batch: &[Vec<f32>]) -> Result<Vec<Prediction>> {
        batch.iter().map(|row| self.run_row(row)).collect()
    }
}

/// Binary label from the model's own label output, if it has one
fn extract_label(outputs: &ort::session::SessionOutputs) -> Option<bool> {
    for (name, output) in outputs.iter() {
        if !name.contains("label") {
            continue;
        }
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return data.first().map(|&v| v == 1);
        }
    }
    None
}

/// Probability from seq(map(int64, float)) output, as exported by
/// CatBoost and LightGBM
fn extract_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    if maps.is_empty() {
        return Err(anyhow::anyhow!("Empty sequence"));
    }

    // Batch size is 1, so only the first map matters
    let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;

    for (class_id, prob) in &kv_pairs {
        if *class_id == 1 {
            return Ok(*prob as f64);
        }
    }

    for (class_id, prob) in &kv_pairs {
        if *class_id == 0 {
            return Ok(1.0 - *prob as f64);
        }
    }

    Err(anyhow::anyhow!("No probability found in map"))
}

/// Positive-class probability from a tensor output
fn positive_prob_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    if dims.len() == 2 {
        let num_classes = dims[1] as usize;
        if num_classes >= 2 {
            // [batch, num_classes] - positive class is index 1
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    } else if dims.len() == 1 {
        let num_classes = dims[0] as usize;
        if num_classes >= 2 {
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    }

    data.last().map(|&v| v as f64).unwrap_or(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_holds_label_and_probability() {
        let p = Prediction {
            is_laundering: true,
            probability: 0.97,
        };
        assert!(p.is_laundering);
        assert_eq!(p.probability, 0.97);
    }
}
