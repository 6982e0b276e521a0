//! ONNX model artifact loader

use crate::features::EncodingMap;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX session with resolved I/O names
pub struct LoadedModel {
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the feature tensor
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
}

/// Loader for the classifier artifact and its sidecar files
pub struct ModelLoader {
    /// Number of intra-op threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the ONNX classifier from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            session,
            input_name,
            output_name,
        })
    }
}

/// Load the ordered feature list the model was trained with.
///
/// The sidecar is a JSON array of column names; its order is the
/// contract the preprocessor must honor exactly.
pub fn load_feature_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .context(format!("Failed to read feature list from {:?}", path))?;
    let names: Vec<String> = serde_json::from_str(&raw)
        .context(format!("Failed to parse feature list from {:?}", path))?;

    anyhow::ensure!(!names.is_empty(), "Feature list in {:?} is empty", path);

    info!(count = names.len(), path = %path.display(), "Feature list loaded");
    Ok(names)
}

/// Load persisted categorical encodings (column -> value -> code)
pub fn load_encodings<P: AsRef<Path>>(path: P) -> Result<EncodingMap> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .context(format!("Failed to read encodings from {:?}", path))?;
    let encodings: EncodingMap = serde_json::from_str(&raw)
        .context(format!("Failed to parse encodings from {:?}", path))?;

    info!(columns = encodings.len(), path = %path.display(), "Categorical encodings loaded");
    Ok(encodings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_feature_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Time","Amount","Payment_type"]"#).unwrap();

        let names = load_feature_names(file.path()).unwrap();
        assert_eq!(names, vec!["Time", "Amount", "Payment_type"]);
    }

    #[test]
    fn test_empty_feature_list_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        assert!(load_feature_names(file.path()).is_err());
    }

    #[test]
    fn test_load_encodings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Payment_currency":{{"USD":2,"EUR":0,"GBP":1}}}}"#).unwrap();

        let encodings = load_encodings(file.path()).unwrap();
        assert_eq!(encodings["Payment_currency"]["USD"], 2);
    }
}
