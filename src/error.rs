use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    /// `line` counts from 1 and includes the discarded header row
    #[error("invalid data on line {line}: {reason}")]
    DataFormat { line: u64, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not draw the chart: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
