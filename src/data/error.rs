use thiserror::Error;

// ---------------------------------------------------------------------------
// DataError – everything the data layer can fail with
// ---------------------------------------------------------------------------

/// Errors of the load / reshape / aggregate pipeline.
///
/// `MissingColumn` and `Parse` are fatal for a load: no partial dataset is
/// produced. `EmptySelection` is recoverable; the caller keeps the loaded
/// table and asks for a non-empty selection.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    #[error("no conditions selected")]
    EmptySelection,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl DataError {
    pub fn parse(row: usize, column: &str, message: impl Into<String>) -> Self {
        DataError::Parse {
            row,
            column: column.to_string(),
            message: message.into(),
        }
    }
}
