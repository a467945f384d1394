use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} does not hold a valid collection", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read CSV import")]
    Csv(#[from] csv::Error),
    #[error("no {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Please generate a report first")]
    Empty,
    #[error("failed to write CSV")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}
