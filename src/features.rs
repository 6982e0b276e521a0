//! Feature preprocessing for classifier inference.
//!
//! Transforms a validated transaction table into the numeric matrix the
//! model was trained on, projected onto the model's ordered feature list.

use crate::error::ServiceError;
use crate::table::CsvTable;
use chrono::{NaiveTime, Timelike};
use std::collections::HashMap;
use tracing::warn;

/// Columns re-encoded as integer category codes.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "Payment_currency",
    "Received_currency",
    "Sender_bank_location",
    "Receiver_bank_location",
    "Payment_type",
];

/// Training-time category codes: column name -> value -> code.
pub type EncodingMap = HashMap<String, HashMap<String, u32>>;

/// Preprocessor that turns raw string columns into model features.
///
/// Without a persisted encoding map, categorical codes are assigned per
/// batch by first-appearance order. With one, codes are stable across
/// requests and unseen values fall back to fresh codes past the
/// persisted range.
#[derive(Debug, Default)]
pub struct Preprocessor {
    persisted: Option<EncodingMap>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self { persisted: None }
    }

    /// Use persisted training-time encodings instead of per-batch codes.
    pub fn with_encodings(encodings: EncodingMap) -> Self {
        Self {
            persisted: Some(encodings),
        }
    }

    /// Transform a validated table into row-major feature vectors matching
    /// `feature_names` exactly, in order.
    pub fn transform(
        &self,
        table: &CsvTable,
        feature_names: &[String],
    ) -> Result<Vec<Vec<f32>>, ServiceError> {
        let mut columns: HashMap<String, Vec<f32>> = HashMap::new();

        if let Some(times) = table.column("Time") {
            columns.insert(
                "Time".to_string(),
                times.iter().map(|v| time_to_seconds(v)).collect(),
            );
        }

        for col in ["Sender_account", "Receiver_account"] {
            if let Some(values) = table.column(col) {
                columns.insert(col.to_string(), parse_integer_column(col, &values)?);
            }
        }

        if let Some(amounts) = table.column("Amount") {
            columns.insert(
                "Amount".to_string(),
                parse_numeric_column("Amount", &amounts)?,
            );
        }

        for col in CATEGORICAL_COLUMNS {
            if let Some(values) = table.column(col) {
                columns.insert(col.to_string(), self.encode_column(col, &values));
            }
        }

        // Extra columns the model may also expect pass through as numbers,
        // with NaN marking unparseable cells.
        for name in feature_names {
            if !columns.contains_key(name) {
                if let Some(values) = table.column(name) {
                    columns.insert(
                        name.clone(),
                        values
                            .iter()
                            .map(|v| v.parse::<f32>().unwrap_or(f32::NAN))
                            .collect(),
                    );
                }
            }
        }

        let missing: Vec<&str> = feature_names
            .iter()
            .filter(|name| !columns.contains_key(name.as_str()))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Error in preprocessing: Missing features: {}",
                missing.join(", ")
            )));
        }

        let mut matrix = Vec::with_capacity(table.len());
        for row_idx in 0..table.len() {
            let row = feature_names
                .iter()
                .map(|name| columns[name.as_str()][row_idx])
                .collect();
            matrix.push(row);
        }

        Ok(matrix)
    }

    /// Assign integer codes to a categorical column.
    fn encode_column(&self, col: &str, values: &[&str]) -> Vec<f32> {
        let persisted = self.persisted.as_ref().and_then(|m| m.get(col));

        let mut local: HashMap<String, u32> = HashMap::new();
        let mut next_code = persisted
            .map(|m| m.values().max().map(|c| c + 1).unwrap_or(0))
            .unwrap_or(0);

        values
            .iter()
            .map(|value| {
                if let Some(code) = persisted.and_then(|m| m.get(*value)) {
                    return *code as f32;
                }
                let code = *local.entry(value.to_string()).or_insert_with(|| {
                    if persisted.is_some() {
                        warn!(column = col, value = *value, "Value absent from persisted encodings, assigning fresh code");
                    }
                    let code = next_code;
                    next_code += 1;
                    code
                });
                code as f32
            })
            .collect()
    }
}

/// Seconds since midnight for a `%H:%M:%S` string; NaN marks an
/// unparseable value rather than failing the batch.
fn time_to_seconds(value: &str) -> f32 {
    match NaiveTime::parse_from_str(value, "%H:%M:%S") {
        Ok(t) => (t.hour() * 3600 + t.minute() * 60 + t.second()) as f32,
        Err(_) => f32::NAN,
    }
}

fn parse_integer_column(col: &str, values: &[&str]) -> Result<Vec<f32>, ServiceError> {
    values
        .iter()
        .map(|v| {
            v.parse::<i64>().map(|n| n as f32).map_err(|_| {
                ServiceError::Validation(format!(
                    "Error in preprocessing: invalid integer '{v}' in column {col}"
                ))
            })
        })
        .collect()
}

fn parse_numeric_column(col: &str, values: &[&str]) -> Result<Vec<f32>, ServiceError> {
    values
        .iter()
        .map(|v| {
            v.parse::<f32>().map_err(|_| {
                ServiceError::Validation(format!(
                    "Error in preprocessing: invalid number '{v}' in column {col}"
                ))
            })
        })
        .collect()
}
