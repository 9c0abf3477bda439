//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The workbook cannot be expressed as a valid package
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] fieldreport_core::Error),
}
