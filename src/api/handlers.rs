//! HTTP request handlers

use crate::error::ServiceError;
use crate::report::{self, PredictionResponse};
use crate::state::AppState;
use crate::table::CsvTable;
use crate::validator;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, Json};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Laundering Detection</title></head>
<body>
<h1>Laundering Detection Service</h1>
<p>POST a transaction CSV to <code>/api/predict</code> (multipart field <code>file</code>, max 10MB).</p>
</body>
</html>
"#;

/// Static landing page
pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Scratch copy of an uploaded file, deleted on every exit path.
///
/// The on-disk name is unique per request; concurrent uploads sharing a
/// client-supplied filename must not share a path.
struct ScratchFile {
    file: tempfile::NamedTempFile,
}

impl ScratchFile {
    fn create(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        // The client-supplied stem survives only as a prefix for operators
        // reading the uploads dir; uniqueness comes from the tempfile
        let stem = Path::new(filename)
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(".csv")
            .tempfile_in(dir)?;
        file.write_all(data)?;
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Rejection text for uploads over the configured cap
fn oversized_message(max_bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if max_bytes >= MB && max_bytes % MB == 0 {
        format!(
            "File size exceeds the maximum limit of {}MB",
            max_bytes / MB
        )
    } else {
        format!("File size exceeds the maximum limit of {max_bytes} bytes")
    }
}

/// Upload a transaction CSV and predict per-row laundering labels.
///
/// One linear pass: receive -> validate -> preprocess -> predict ->
/// assemble. Any failure short-circuits into an `{"error": msg}` response.
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let classifier = state.classifier.clone().ok_or(ServiceError::Config)?;
    let max_bytes = state.config.limits.max_upload_bytes;

    // Declared length is checked before any of the body is read
    if let Some(declared) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        if declared > max_bytes {
            return Err(ServiceError::Request(oversized_message(max_bytes)));
        }
    }

    // Receiving: pull the `file` field out of the multipart form
    let mut upload: Option<(String, axum::body::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ServiceError::Request("No file selected".to_string()));
        }
        if !allowed_file(&filename) {
            return Err(ServiceError::Request(
                "Invalid file type. Please upload a CSV file".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| {
        ServiceError::Request("No file uploaded".to_string())
    })?;

    if data.len() as u64 > max_bytes {
        return Err(ServiceError::Request(oversized_message(max_bytes)));
    }

    info!(filename = %filename, bytes = data.len(), "Received upload");

    // Scratch file is removed on drop, success or failure
    let scratch = ScratchFile::create(
        Path::new(&state.config.storage.uploads_dir),
        &filename,
        &data,
    )?;

    let table = CsvTable::from_path(scratch.path())?;

    // Validating
    validator::validate(&table)?;

    // Preprocessing
    let matrix = state
        .preprocessor
        .transform(&table, classifier.feature_names())?;
    debug!(
        rows = matrix.len(),
        features = classifier.feature_names().len(),
        "Preprocessing complete"
    );

    // Predicting
    let predictions = classifier
        .predict(&matrix)
        .map_err(|e| ServiceError::Inference(e.to_string()))?;

    // Assembling
    let response = report::assemble(&table, &predictions);
    report::persist(&response, Path::new(&state.config.storage.predictions_dir));

    info!(
        total = response.summary.total_transactions,
        flagged = response.summary.flagged_transactions,
        "Prediction complete"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("data.csv"));
        assert!(allowed_file("DATA.CSV"));
        assert!(allowed_file("report.final.Csv"));
        assert!(!allowed_file("data.txt"));
        assert!(!allowed_file("data"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn test_oversized_message_reflects_configured_limit() {
        assert_eq!(
            oversized_message(10 * 1024 * 1024),
            "File size exceeds the maximum limit of 10MB"
        );
        assert_eq!(
            oversized_message(2 * 1024 * 1024),
            "File size exceeds the maximum limit of 2MB"
        );
        assert_eq!(
            oversized_message(256),
            "File size exceeds the maximum limit of 256 bytes"
        );
    }

    #[test]
    fn test_scratch_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchFile::create(dir.path(), "upload.csv", b"a,b\n1,2\n").unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_file_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::create(dir.path(), "../../etc/evil.csv", b"x").unwrap();
        assert_eq!(scratch.path().parent().unwrap(), dir.path());
    }

    #[test]
    fn test_concurrent_uploads_with_same_filename_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();

        let first =
            ScratchFile::create(dir.path(), "transactions.csv", b"request-a-data").unwrap();
        let second =
            ScratchFile::create(dir.path(), "transactions.csv", b"request-b-data").unwrap();

        assert_ne!(first.path(), second.path());
        // Each request still reads its own bytes
        assert_eq!(std::fs::read(first.path()).unwrap(), b"request-a-data");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"request-b-data");

        // Dropping one guard leaves the other request's file intact
        let second_path = second.path().to_path_buf();
        drop(first);
        assert!(second_path.exists());
        assert_eq!(std::fs::read(&second_path).unwrap(), b"request-b-data");
    }
}
