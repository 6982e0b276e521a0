//! Offline CSV normalizer.
//!
//! Maps an arbitrary transaction CSV onto the schema the prediction
//! endpoint validates against. Not wired into the HTTP path; this is a
//! preparation step run through the `convert_csv` binary.

use crate::error::ServiceError;
use crate::table::CsvTable;
use crate::validator::REQUIRED_COLUMNS;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::warn;

/// Currency vocabulary accepted by the validator. Terms outside the map
/// become the empty null marker.
const CURRENCY_MAP: [(&str, &str); 3] = [("USD", "USD"), ("EUR", "EUR"), ("GBP", "GBP")];

/// Payment-type vocabulary remap onto the accepted enums.
const PAYMENT_TYPE_MAP: [(&str, &str); 4] = [
    ("Bank Transfer", "Bank Transfer"),
    ("Wire Transfer", "WIRE"),
    ("SWIFT", "SWIFT"),
    ("SEPA", "SEPA"),
];

/// Normalize an arbitrary transaction table into the required schema.
///
/// Missing columns are synthesized (`Received_currency` copied from
/// `Payment_currency`, sequential `ACC000...` account ids, `"Unknown"`
/// locations, empty markers elsewhere), `Time` is reformatted from a
/// datetime when a `Date` column is present, currency and payment-type
/// vocabulary is remapped, and the output is reordered to the nine
/// required columns.
pub fn normalize(table: &CsvTable) -> CsvTable {
    let mut working = table.clone();

    for col in REQUIRED_COLUMNS {
        if working.column_index(col).is_some() {
            continue;
        }

        let values: Vec<String> = if col == "Received_currency" {
            working
                .column("Payment_currency")
                .map(|vs| vs.iter().map(|v| v.to_string()).collect())
                .unwrap_or_else(|| vec![String::new(); working.len()])
        } else if col.ends_with("_account") {
            (0..working.len()).map(|i| format!("ACC{i:03}")).collect()
        } else if col.ends_with("_location") {
            vec!["Unknown".to_string(); working.len()]
        } else {
            vec![String::new(); working.len()]
        };

        working.headers.push(col.to_string());
        for (row, value) in working.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    // A Date column means Time holds a full datetime; keep only H:M:S
    if working.column_index("Date").is_some() {
        let idx = working.column_index("Time").unwrap();
        for row in &mut working.rows {
            row[idx] = reformat_time(&row[idx]);
        }
    }

    remap_column(&mut working, "Payment_currency", &CURRENCY_MAP);
    remap_column(&mut working, "Payment_type", &PAYMENT_TYPE_MAP);
    remap_column(&mut working, "Received_currency", &CURRENCY_MAP);

    // Reorder to the required column sequence, dropping everything else
    let indices: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .map(|col| working.column_index(col).unwrap())
        .collect();

    CsvTable {
        headers: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: working
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect(),
    }
}

/// Extract `%H:%M:%S` from a datetime string; values already in that
/// form pass through unchanged.
fn reformat_time(value: &str) -> String {
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return dt.format("%H:%M:%S").to_string();
        }
    }
    value.to_string()
}

/// Apply a fixed vocabulary map to a column. Unmapped terms become the
/// empty null marker; each dropped term is counted and logged.
fn remap_column(table: &mut CsvTable, col: &str, map: &[(&str, &str)]) {
    let Some(idx) = table.column_index(col) else {
        return;
    };

    let mut dropped = 0usize;
    for row in &mut table.rows {
        let value = row[idx].as_str();
        match map.iter().find(|(from, _)| *from == value) {
            Some((_, to)) => row[idx] = to.to_string(),
            None => {
                if !value.is_empty() {
                    dropped += 1;
                }
                row[idx] = String::new();
            }
        }
    }

    if dropped > 0 {
        warn!(column = col, dropped = dropped, "Unmapped values replaced with null marker");
    }
}

/// Normalize `input` and write the conforming CSV to `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<CsvTable, ServiceError> {
    let table = CsvTable::from_path(input)?;
    let converted = normalize(&table);

    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record(&converted.headers)?;
    for row in &converted.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CsvTable;
    use crate::validator::validate;

    #[test]
    fn test_missing_columns_are_synthesized() {
        let csv = "Time,Payment_currency,Payment_type,Amount\n\
10:35:19,USD,SWIFT,100.0\n\
11:00:00,EUR,SEPA,50.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());

        assert_eq!(out.headers, REQUIRED_COLUMNS.to_vec());
        assert_eq!(out.column("Sender_account").unwrap(), vec!["ACC000", "ACC001"]);
        assert_eq!(out.column("Receiver_account").unwrap(), vec!["ACC000", "ACC001"]);
        assert_eq!(out.column("Sender_bank_location").unwrap(), vec!["Unknown", "Unknown"]);
        // Received_currency copied from Payment_currency
        assert_eq!(out.column("Received_currency").unwrap(), vec!["USD", "EUR"]);
    }

    #[test]
    fn test_payment_type_vocabulary_remap() {
        let csv = "Time,Payment_currency,Payment_type,Amount\n\
10:35:19,USD,Wire Transfer,100.0\n\
11:00:00,EUR,Bank Transfer,50.0\n\
12:00:00,GBP,Cheque,25.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());

        assert_eq!(
            out.column("Payment_type").unwrap(),
            vec!["WIRE", "Bank Transfer", ""]
        );
    }

    #[test]
    fn test_unmapped_currency_becomes_null_marker() {
        let csv = "Time,Payment_currency,Payment_type,Amount\n10:35:19,JPY,SWIFT,100.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());
        assert_eq!(out.column("Payment_currency").unwrap(), vec![""]);
    }

    #[test]
    fn test_time_reformatted_when_date_column_present() {
        let csv = "Date,Time,Payment_currency,Payment_type,Amount\n\
2024-05-01,2024-05-01 13:45:30,USD,SWIFT,100.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());
        assert_eq!(out.column("Time").unwrap(), vec!["13:45:30"]);
    }

    #[test]
    fn test_time_untouched_without_date_column() {
        let csv = "Time,Payment_currency,Payment_type,Amount\n13:45:30,USD,SWIFT,100.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());
        assert_eq!(out.column("Time").unwrap(), vec!["13:45:30"]);
    }

    #[test]
    fn test_normalized_output_passes_validation() {
        let csv = "Time,Payment_currency,Payment_type,Amount\n\
10:35:19,USD,Wire Transfer,100.0\n";
        let out = normalize(&CsvTable::from_reader(csv.as_bytes()).unwrap());
        assert!(validate(&out).is_ok());
    }

    #[test]
    fn test_convert_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("transaction.csv");
        let output = dir.path().join("converted_transaction.csv");
        std::fs::write(
            &input,
            "Time,Payment_currency,Payment_type,Amount\n10:35:19,USD,SWIFT,100.0\n",
        )
        .unwrap();

        let converted = convert_file(&input, &output).unwrap();
        assert_eq!(converted.len(), 1);

        let written = CsvTable::from_path(&output).unwrap();
        assert_eq!(written.headers, REQUIRED_COLUMNS.to_vec());
        assert_eq!(written.column("Amount").unwrap(), vec!["100.0"]);
    }
}
