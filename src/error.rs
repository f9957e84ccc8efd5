use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input workbook not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid workbook: {0}")]
    InvalidWorkbook(String),

    #[error("No sheet name starts with '{prefix}'")]
    NoMatchingSheets { prefix: String },

    #[error("Invalid sheet name '{sheet}': {reason}")]
    InvalidSheetName { sheet: String, reason: String },

    #[error("Sheet '{sheet}' has no row labeled '{label}'")]
    MissingTotal { sheet: String, label: String },

    #[error("Sheet '{sheet}' has {candidates} conflicting '{label}' rows")]
    AmbiguousTotal {
        sheet: String,
        label: String,
        candidates: usize,
    },

    #[error("Font file not found: {}", .0.display())]
    FontNotFound(PathBuf),

    #[error("Font file is not a usable font: {}", .0.display())]
    InvalidFont(PathBuf),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to write chart: {0}")]
    OutputWrite(String),

    #[error("DataFrame error: {0}")]
    DataFrame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<polars::prelude::PolarsError> for AppError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AppError::DataFrame(err.to_string())
    }
}
