//! CSV Normalizer CLI
//!
//! Rewrites `transaction.csv` into `converted_transaction.csv` so it
//! conforms to the schema the prediction endpoint expects, and prints a
//! preview of the result. No flags.

use anyhow::Result;
use laundering_detection::normalizer;
use std::path::Path;
use tracing::error;

const INPUT_FILE: &str = "transaction.csv";
const OUTPUT_FILE: &str = "converted_transaction.csv";
const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("laundering_detection=info".parse()?),
        )
        .init();

    match normalizer::convert_file(Path::new(INPUT_FILE), Path::new(OUTPUT_FILE)) {
        Ok(converted) => {
            println!("Converted CSV saved to {OUTPUT_FILE}");
            println!("\nFirst few rows of converted data:");
            println!("{}", converted.headers.join(","));
            for row in converted.rows.iter().take(PREVIEW_ROWS) {
                println!("{}", row.join(","));
            }
        }
        Err(e) => {
            error!(error = %e, "Error converting CSV");
            eprintln!("Error converting CSV: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
