//! Prediction result assembly and persistence

use crate::models::Prediction;
use crate::table::CsvTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-row prediction as returned to the caller and written to disk.
/// Field names follow the column names of the source data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "Sender_account")]
    pub sender_account: String,
    #[serde(rename = "Receiver_account")]
    pub receiver_account: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Payment_currency")]
    pub payment_currency: String,
    #[serde(rename = "Payment_type")]
    pub payment_type: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Is_laundering")]
    pub is_laundering: String,
    #[serde(rename = "Laundering_probability")]
    pub laundering_probability: f64,
}

/// Batch-level summary of a prediction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total_transactions: usize,
    pub flagged_transactions: usize,
    pub average_probability: f64,
}

/// Full response payload for a successful prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<PredictionRecord>,
    pub summary: PredictionSummary,
}

/// Round to two decimals after scaling a probability to 0-100.
fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Pair each original row's display fields with its prediction.
pub fn assemble(table: &CsvTable, predictions: &[Prediction]) -> PredictionResponse {
    let display = |name: &str, row: usize| -> String {
        table
            .column_index(name)
            .map(|idx| table.rows[row][idx].clone())
            .unwrap_or_default()
    };

    let records: Vec<PredictionRecord> = predictions
        .iter()
        .enumerate()
        .map(|(i, p)| PredictionRecord {
            sender_account: display("Sender_account", i),
            receiver_account: display("Receiver_account", i),
            amount: display("Amount", i).parse().unwrap_or(f64::NAN),
            payment_currency: display("Payment_currency", i),
            payment_type: display("Payment_type", i),
            time: display("Time", i),
            is_laundering: if p.is_laundering { "YES" } else { "NO" }.to_string(),
            laundering_probability: to_percent(p.probability),
        })
        .collect();

    let flagged = records.iter().filter(|r| r.is_laundering == "YES").count();
    let mean = if predictions.is_empty() {
        0.0
    } else {
        predictions.iter().map(|p| p.probability).sum::<f64>() / predictions.len() as f64
    };

    PredictionResponse {
        summary: PredictionSummary {
            total_transactions: records.len(),
            flagged_transactions: flagged,
            average_probability: to_percent(mean),
        },
        predictions: records,
    }
}

/// Persist the result list as `prediction_<YYYYMMDD_HHMMSS>.csv`.
///
/// Best-effort: a failed write is logged and the request still returns
/// its JSON result. Output files accumulate without eviction.
pub fn persist(response: &PredictionResponse, predictions_dir: &Path) -> Option<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = predictions_dir.join(format!("prediction_{timestamp}.csv"));

    match write_csv(response, &path) {
        Ok(()) => {
            info!(path = %path.display(), rows = response.predictions.len(), "Prediction CSV written");
            Some(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to write prediction CSV");
            None
        }
    }
}

fn write_csv(response: &PredictionResponse, path: &Path) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in &response.predictions {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CsvTable;

    const CSV: &str = "Time,Payment_currency,Payment_type,Amount,Sender_account,\
Receiver_account,Received_currency,Sender_bank_location,Receiver_bank_location\n\
10:35:19,USD,WIRE,100.0,1001,2002,USD,UK,Germany\n\
13:45:30,EUR,SEPA,9999.0,1002,2003,GBP,Germany,UK\n";

    fn sample() -> (CsvTable, Vec<Prediction>) {
        let table = CsvTable::from_reader(CSV.as_bytes()).unwrap();
        let predictions = vec![
            Prediction {
                is_laundering: false,
                probability: 0.0,
            },
            Prediction {
                is_laundering: true,
                probability: 0.97,
            },
        ];
        (table, predictions)
    }

    #[test]
    fn test_assemble_records_and_summary() {
        let (table, predictions) = sample();
        let response = assemble(&table, &predictions);

        assert_eq!(response.summary.total_transactions, 2);
        assert_eq!(response.summary.flagged_transactions, 1);
        assert_eq!(response.summary.average_probability, 48.5);

        let flagged = &response.predictions[1];
        assert_eq!(flagged.is_laundering, "YES");
        assert_eq!(flagged.laundering_probability, 97.0);
        assert_eq!(flagged.sender_account, "1002");
        assert_eq!(flagged.amount, 9999.0);
        assert_eq!(flagged.time, "13:45:30");
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
    }

    #[test]
    fn test_empty_batch_summary() {
        let table = CsvTable::from_reader(
            CSV.lines().next().map(|h| format!("{h}\n")).unwrap().as_bytes(),
        )
        .unwrap();
        let response = assemble(&table, &[]);
        assert_eq!(response.summary.total_transactions, 0);
        assert_eq!(response.summary.average_probability, 0.0);
    }

    #[test]
    fn test_persist_writes_timestamped_csv() {
        let (table, predictions) = sample();
        let response = assemble(&table, &predictions);

        let dir = tempfile::tempdir().unwrap();
        let path = persist(&response, dir.path()).expect("write should succeed");

        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("prediction_"));
        assert!(name.ends_with(".csv"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Sender_account,Receiver_account,Amount"));
        assert!(written.contains("YES"));
    }

    #[test]
    fn test_persist_failure_is_soft() {
        let (table, predictions) = sample();
        let response = assemble(&table, &predictions);
        assert!(persist(&response, Path::new("/nonexistent/dir")).is_none());
    }
}
