//! Schema and value validation for uploaded transaction tables

use crate::error::ServiceError;
use crate::table::CsvTable;

/// The nine columns every upload must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Time",
    "Payment_currency",
    "Payment_type",
    "Amount",
    "Sender_account",
    "Receiver_account",
    "Received_currency",
    "Sender_bank_location",
    "Receiver_bank_location",
];

/// Allowed values for `Payment_currency` and `Received_currency`.
pub const ALLOWED_CURRENCIES: [&str; 3] = ["USD", "EUR", "GBP"];

/// Allowed values for `Payment_type`.
pub const ALLOWED_PAYMENT_TYPES: [&str; 4] = ["WIRE", "SWIFT", "SEPA", "Bank Transfer"];

/// Pure check of an uploaded table against the required schema.
///
/// All nine columns are checked before any value is inspected, so the
/// error names every missing column at once. Value checks cover the two
/// enum-valued columns.
pub fn validate(table: &CsvTable) -> Result<(), ServiceError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| table.column_index(col).is_none())
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ServiceError::Schema(missing));
    }

    let currencies = table.column("Payment_currency").unwrap_or_default();
    if currencies.iter().any(|v| !ALLOWED_CURRENCIES.contains(v)) {
        return Err(ServiceError::Validation(format!(
            "Payment_currency must be one of: {}",
            ALLOWED_CURRENCIES.join(", ")
        )));
    }

    let payment_types = table.column("Payment_type").unwrap_or_default();
    if payment_types
        .iter()
        .any(|v| !ALLOWED_PAYMENT_TYPES.contains(v))
    {
        return Err(ServiceError::Validation(format!(
            "Payment_type must be one of: {}",
            ALLOWED_PAYMENT_TYPES.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> CsvTable {
        CsvTable::from_reader(csv.as_bytes()).unwrap()
    }

    const VALID: &str = "Time,Payment_currency,Payment_type,Amount,Sender_account,\
Receiver_account,Received_currency,Sender_bank_location,Receiver_bank_location\n\
10:35:19,USD,WIRE,100.0,1001,2002,USD,UK,Germany\n";

    #[test]
    fn test_valid_table_passes() {
        assert!(validate(&table(VALID)).is_ok());
    }

    #[test]
    fn test_missing_columns_all_named() {
        let t = table("Time,Amount\n10:35:19,100.0\n");
        match validate(&t) {
            Err(ServiceError::Schema(missing)) => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"Payment_currency".to_string()));
                assert!(missing.contains(&"Receiver_bank_location".to_string()));
                assert!(!missing.contains(&"Time".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_disallowed_currency_rejected() {
        let t = table(&VALID.replace("USD,WIRE", "JPY,WIRE"));
        match validate(&t) {
            Err(ServiceError::Validation(msg)) => {
                assert!(msg.contains("Payment_currency"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_disallowed_payment_type_rejected() {
        let t = table(&VALID.replace("WIRE", "CASH"));
        match validate(&t) {
            Err(ServiceError::Validation(msg)) => {
                assert!(msg.contains("Payment_type"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bank_transfer_is_allowed() {
        let t = table(&VALID.replace("WIRE", "Bank Transfer"));
        assert!(validate(&t).is_ok());
    }
}
